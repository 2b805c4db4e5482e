use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::info;

use super::OptionalExt;
use crate::models::{NewUser, UserRow};
use crate::{Database, is_unique_violation};

const USER_COLUMNS: &str = "id, email, password_hash, name, provider, created_at";

impl Database {
    /// Insert a user. A duplicate email surfaces as a unique violation, see
    /// [`crate::is_unique_violation`].
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<UserRow> {
        self.with_conn(|conn| {
            insert_user(conn, user)?;
            query_user(conn, "id", user.id)?
                .ok_or_else(|| anyhow::anyhow!("User vanished after insert: {}", user.id))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn user_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| user_exists(conn, id))
    }

    /// Return the account registered under `user.email`, creating it if
    /// there is none. Used by the OAuth callback; an existing account keeps
    /// its original provider.
    pub fn find_or_create_user(&self, user: &NewUser<'_>) -> Result<UserRow> {
        self.with_conn(|conn| {
            if let Some(existing) = query_user(conn, "email", user.email)? {
                return Ok(existing);
            }

            match insert_user(conn, user) {
                Ok(()) => info!("Created {} account for {}", user.provider, user.email),
                // Lost a race with a concurrent sign-in for the same email.
                Err(e) if is_unique_violation(&e) => {}
                Err(e) => return Err(e),
            }

            query_user(conn, "email", user.email)?
                .ok_or_else(|| anyhow::anyhow!("User vanished after insert: {}", user.email))
        })
    }
}

fn insert_user(conn: &Connection, user: &NewUser<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, password_hash, name, provider, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id,
            user.email,
            user.password_hash,
            user.name,
            user.provider,
            user.created_at
        ],
    )?;
    Ok(())
}

/// `column` is always a literal from this module.
fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password_hash: row.get(2)?,
                name: row.get(3)?,
                provider: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

pub(super) fn user_exists(conn: &Connection, id: &str) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{now, user};

    fn new_user<'a>(id: &'a str, email: &'a str, provider: &'a str, at: &'a str) -> NewUser<'a> {
        NewUser {
            id,
            email,
            password_hash: "",
            name: "Someone",
            provider,
            created_at: at,
        }
    }

    #[test]
    fn duplicate_email_is_a_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        let at = now();
        db.create_user(&new_user("u1", "a@x.com", "local", &at)).unwrap();

        let err = db
            .create_user(&new_user("u2", "a@x.com", "local", &at))
            .err()
            .unwrap();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn lookup_by_email_and_id() {
        let db = Database::open_in_memory().unwrap();
        let id = user(&db, "alice");

        let by_id = db.get_user_by_id(&id).unwrap().unwrap();
        let by_email = db.get_user_by_email(&by_id.email).unwrap().unwrap();
        assert_eq!(by_email.id, id);
        assert_eq!(by_email.name, "alice");
        assert!(db.user_exists(&id).unwrap());
        assert!(!db.user_exists("missing").unwrap());
        assert!(db.get_user_by_email("nobody@x.com").unwrap().is_none());
    }

    #[test]
    fn find_or_create_reuses_existing_account() {
        let db = Database::open_in_memory().unwrap();
        let at = now();
        db.create_user(&new_user("u1", "g@x.com", "local", &at)).unwrap();

        let found = db
            .find_or_create_user(&new_user("u2", "g@x.com", "google", &at))
            .unwrap();
        assert_eq!(found.id, "u1");
        assert_eq!(found.provider, "local");

        let created = db
            .find_or_create_user(&new_user("u3", "new@x.com", "google", &at))
            .unwrap();
        assert_eq!(created.id, "u3");
        assert_eq!(created.provider, "google");
        assert_eq!(created.password_hash, "");
    }
}
