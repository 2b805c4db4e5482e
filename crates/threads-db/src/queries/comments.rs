use anyhow::Result;
use rusqlite::{Connection, params};

use super::OptionalExt;
use super::posts::post_exists;
use crate::Database;
use crate::models::CommentRow;

const COMMENT_SELECT: &str = "
    SELECT c.id, c.content, c.post_id, c.user_id, u.name, c.created_at
    FROM comments c
    JOIN users u ON u.id = c.user_id";

impl Database {
    /// Add a comment. `None` means the post does not exist.
    pub fn add_comment(
        &self,
        id: &str,
        post_id: &str,
        user_id: &str,
        content: &str,
        created_at: &str,
    ) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            if !post_exists(conn, post_id)? {
                return Ok(None);
            }
            conn.execute(
                "INSERT INTO comments (id, content, post_id, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, content, post_id, user_id, created_at],
            )?;
            query_comment(conn, id)
        })
    }

    /// Comments on a post, oldest first. `None` means the post does not exist.
    pub fn comments_for_post(&self, post_id: &str) -> Result<Option<Vec<CommentRow>>> {
        self.with_conn(|conn| {
            if !post_exists(conn, post_id)? {
                return Ok(None);
            }
            let sql = format!(
                "{} WHERE c.post_id = ?1 ORDER BY c.created_at ASC, c.id ASC",
                COMMENT_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([post_id], map_comment_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Some(rows))
        })
    }

    /// Author id of a comment, or `None` if it does not exist.
    pub fn get_comment_author(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT user_id FROM comments WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    pub fn delete_comment(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM comments WHERE id = ?1", [id])? > 0))
    }
}

fn query_comment(conn: &Connection, id: &str) -> Result<Option<CommentRow>> {
    let sql = format!("{} WHERE c.id = ?1", COMMENT_SELECT);
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([id], map_comment_row).optional()
}

fn map_comment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        content: row.get(1)?,
        post_id: row.get(2)?,
        user_id: row.get(3)?,
        user_name: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::queries::test_support::{now, post, user};
    use crate::timestamp;

    #[test]
    fn comments_listed_oldest_first() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let id = post(&db, &alice, "discuss", 10);

        let earlier = timestamp(Utc::now() - Duration::minutes(5));
        db.add_comment("second", &id, &alice, "reply", &now()).unwrap();
        db.add_comment("first", &id, &bob, "first!", &earlier).unwrap();

        let comments = db.comments_for_post(&id).unwrap().unwrap();
        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert_eq!(comments[0].user_name, "bob");
        assert_eq!(db.get_post(&id).unwrap().unwrap().comment_count, 2);
    }

    #[test]
    fn missing_post_has_no_comment_list() {
        let db = Database::open_in_memory().unwrap();
        let bob = user(&db, "bob");
        assert!(db.comments_for_post("nope").unwrap().is_none());
        assert!(db.add_comment("c", "nope", &bob, "hi", &now()).unwrap().is_none());
    }

    #[test]
    fn delete_comment_by_id() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let id = post(&db, &alice, "p", 0);
        let comment = db.add_comment("c1", &id, &alice, "hi", &now()).unwrap().unwrap();
        assert_eq!(comment.post_id, id);

        assert_eq!(db.get_comment_author("c1").unwrap().as_deref(), Some(alice.as_str()));
        assert!(db.delete_comment("c1").unwrap());
        assert!(!db.delete_comment("c1").unwrap());
        assert!(db.get_comment_author("c1").unwrap().is_none());
    }
}
