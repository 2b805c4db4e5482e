use anyhow::Result;
use rusqlite::params;
use threads_types::models::UserSummary;

use super::{POST_SELECT, map_post_row};
use crate::Database;
use crate::models::PostRow;

impl Database {
    /// Posts whose content contains `term`, case-insensitively, newest first.
    pub fn search_posts(&self, term: &str, limit: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE unicode_contains(p.content, ?1) ORDER BY p.created_at DESC, p.id DESC LIMIT ?2",
                POST_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![term, limit], map_post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Users whose display name contains `term`, case-insensitively.
    pub fn search_users(&self, term: &str, limit: u32) -> Result<Vec<UserSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name FROM users
                 WHERE unicode_contains(name, ?1)
                 ORDER BY name COLLATE NOCASE ASC, id ASC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![term, limit], |row| {
                    Ok(UserSummary {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{post, user};

    #[test]
    fn post_search_is_case_insensitive_and_capped() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        for i in 0..12 {
            post(&db, &alice, &format!("Rust tip #{}", i), i);
        }
        post(&db, &alice, "something else", 0);

        let hits = db.search_posts("rUST", 10).unwrap();
        assert_eq!(hits.len(), 10);
        assert_eq!(hits[0].content, "Rust tip #0");
        assert!(hits.iter().all(|p| p.content.starts_with("Rust tip")));
    }

    #[test]
    fn percent_matches_literally() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        post(&db, &alice, "100% sure", 0);
        post(&db, &alice, "1000 sure", 0);

        let hits = db.search_posts("0%", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "100% sure");
    }

    #[test]
    fn user_search_matches_names() {
        let db = Database::open_in_memory().unwrap();
        user(&db, "Maria");
        user(&db, "mario");
        user(&db, "Bob");

        let names: Vec<String> = db
            .search_users("MAR", 10)
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["Maria", "mario"]);
    }

    #[test]
    fn user_search_is_capped() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..12 {
            user(&db, &format!("member{:02}", i));
        }

        let hits = db.search_users("member", 10).unwrap();
        assert_eq!(hits.len(), 10);
        assert_eq!(hits[0].name, "member00");
        assert_eq!(hits[9].name, "member09");
    }

    #[test]
    fn case_folding_covers_non_ascii() {
        let db = Database::open_in_memory().unwrap();
        let emile = user(&db, "Émile");
        post(&db, &emile, "ÉCOLE today", 0);
        post(&db, &emile, "ecole without accent", 0);

        let hits = db.search_posts("école", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "ÉCOLE today");

        let users = db.search_users("émile", 10).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, emile);
    }

    #[test]
    fn wildcard_characters_match_literally() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        post(&db, &alice, "snake_case", 0);
        post(&db, &alice, "snakeXcase", 0);

        let hits = db.search_posts("e_c", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "snake_case");
    }
}
