use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::debug;

use super::{OptionalExt, POST_SELECT, map_post_row, placeholders};
use crate::Database;
use crate::models::{LikeRow, PostRow};

impl Database {
    pub fn create_post(
        &self,
        id: &str,
        author_id: &str,
        content: &str,
        created_at: &str,
    ) -> Result<PostRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, content, author_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, content, author_id, created_at],
            )?;
            query_post(conn, id)?.ok_or_else(|| anyhow::anyhow!("Post vanished after insert: {}", id))
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    /// Author id of a post, or `None` if the post does not exist.
    pub fn get_post_author(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT author_id FROM posts WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    /// Replace a post's content. `None` means the post does not exist.
    pub fn update_post_content(
        &self,
        id: &str,
        content: &str,
        updated_at: &str,
    ) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET content = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, content, updated_at],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_post(conn, id)
        })
    }

    /// Delete a post together with its comments and likes. Returns false if
    /// there was no such post.
    pub fn delete_post(&self, id: &str) -> Result<bool> {
        self.with_tx(|conn| {
            let comments = conn.execute("DELETE FROM comments WHERE post_id = ?1", [id])?;
            let likes = conn.execute("DELETE FROM likes WHERE post_id = ?1", [id])?;
            let deleted = conn.execute("DELETE FROM posts WHERE id = ?1", [id])? > 0;
            debug!("Deleted post {} ({} comments, {} likes)", id, comments, likes);
            Ok(deleted)
        })
    }

    /// All posts by one author, newest first.
    pub fn posts_by_author(&self, author_id: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE p.author_id = ?1 ORDER BY p.created_at DESC, p.id DESC",
                POST_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([author_id], map_post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch the likes for a set of post IDs.
    pub fn likes_for_posts(&self, post_ids: &[String]) -> Result<Vec<LikeRow>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT post_id, user_id FROM likes WHERE post_id IN ({}) ORDER BY created_at",
                placeholders(1, post_ids.len())
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(post_ids.iter()), |row| {
                    Ok(LikeRow {
                        post_id: row.get(0)?,
                        user_id: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

pub(super) fn query_post(conn: &Connection, id: &str) -> Result<Option<PostRow>> {
    let sql = format!("{} WHERE p.id = ?1", POST_SELECT);
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([id], map_post_row).optional()
}

pub(super) fn post_exists(conn: &Connection, id: &str) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{now, post, user};

    #[test]
    fn create_and_fetch_post() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let id = post(&db, &alice, "hello world", 0);

        let row = db.get_post(&id).unwrap().unwrap();
        assert_eq!(row.content, "hello world");
        assert_eq!(row.author_id, alice);
        assert_eq!(row.author_name, "alice");
        assert_eq!(row.like_count, 0);
        assert_eq!(row.comment_count, 0);
        assert!(row.updated_at.is_none());
        assert_eq!(db.get_post_author(&id).unwrap().as_deref(), Some(alice.as_str()));
        assert!(db.get_post_author("missing").unwrap().is_none());
    }

    #[test]
    fn update_sets_content_and_updated_at() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let id = post(&db, &alice, "draft", 0);

        let updated = db.update_post_content(&id, "final", &now()).unwrap().unwrap();
        assert_eq!(updated.content, "final");
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn update_of_deleted_post_is_none() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let id = post(&db, &alice, "short-lived", 0);
        assert!(db.delete_post(&id).unwrap());

        assert!(db.update_post_content(&id, "too late", &now()).unwrap().is_none());
    }

    #[test]
    fn delete_removes_comments_and_likes() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let id = post(&db, &alice, "doomed", 0);

        db.toggle_like(&bob, &id, &now()).unwrap();
        db.add_comment("c1", &id, &bob, "nice", &now()).unwrap();
        db.add_comment("c2", &id, &alice, "thanks", &now()).unwrap();

        assert!(db.delete_post(&id).unwrap());
        assert!(db.get_post(&id).unwrap().is_none());
        assert!(db.likes_for_posts(&[id.clone()]).unwrap().is_empty());
        assert!(db.get_comment_author("c1").unwrap().is_none());
        assert!(db.get_comment_author("c2").unwrap().is_none());

        let orphans: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT (SELECT COUNT(*) FROM likes) + (SELECT COUNT(*) FROM comments)",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(orphans, 0);

        assert!(!db.delete_post(&id).unwrap());
    }

    #[test]
    fn posts_by_author_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let old = post(&db, &alice, "old", 30);
        let new = post(&db, &alice, "new", 1);
        post(&db, &bob, "not alice", 5);

        let ids: Vec<String> = db
            .posts_by_author(&alice)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![new, old]);
    }

    #[test]
    fn likes_for_posts_batches() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let p1 = post(&db, &alice, "one", 2);
        let p2 = post(&db, &alice, "two", 1);

        db.toggle_like(&alice, &p1, &now()).unwrap();
        db.toggle_like(&bob, &p1, &now()).unwrap();
        db.toggle_like(&bob, &p2, &now()).unwrap();

        let likes = db.likes_for_posts(&[p1.clone(), p2.clone()]).unwrap();
        assert_eq!(likes.len(), 3);
        assert_eq!(likes.iter().filter(|l| l.post_id == p1).count(), 2);
        assert!(db.likes_for_posts(&[]).unwrap().is_empty());
    }
}
