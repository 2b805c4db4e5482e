use anyhow::Result;

use super::posts::post_exists;
use super::toggle_pair;
use crate::Database;
use crate::models::Toggled;

impl Database {
    /// Like or unlike a post. `None` means the post does not exist.
    pub fn toggle_like(&self, user_id: &str, post_id: &str, now: &str) -> Result<Option<Toggled>> {
        self.with_conn(|conn| {
            if !post_exists(conn, post_id)? {
                return Ok(None);
            }
            let toggled = toggle_pair(
                conn,
                "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
                "INSERT INTO likes (user_id, post_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, post_id) DO NOTHING",
                user_id,
                post_id,
                now,
            )?;
            Ok(Some(toggled))
        })
    }

    pub fn has_liked(&self, user_id: &str, post_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND post_id = ?2)",
                [user_id, post_id],
                |row| row.get(0),
            )?)
        })
    }
}
