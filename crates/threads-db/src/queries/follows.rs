use anyhow::Result;
use rusqlite::params;
use threads_types::models::UserSummary;
use threads_types::pagination::{PAGE_SIZE, offset};

use super::users::user_exists;
use super::{count, sql_offset, toggle_pair};
use crate::Database;
use crate::models::Toggled;

/// Which side of the follow relation to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowDirection {
    /// Users who follow the subject.
    Followers,
    /// Users the subject follows.
    Following,
}

impl Database {
    /// Follow or unfollow `following_id`. `None` means the target user does
    /// not exist. Callers reject self-follows before getting here; the schema
    /// CHECK constraint backs that up.
    pub fn toggle_follow(
        &self,
        follower_id: &str,
        following_id: &str,
        now: &str,
    ) -> Result<Option<Toggled>> {
        self.with_conn(|conn| {
            if !user_exists(conn, following_id)? {
                return Ok(None);
            }
            let toggled = toggle_pair(
                conn,
                "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
                "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (follower_id, following_id) DO NOTHING",
                follower_id,
                following_id,
                now,
            )?;
            Ok(Some(toggled))
        })
    }

    pub fn is_following(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2)",
                [follower_id, following_id],
                |row| row.get(0),
            )?)
        })
    }

    /// (followers, following) counts.
    pub fn follow_counts(&self, user_id: &str) -> Result<(u64, u64)> {
        self.with_conn(|conn| {
            let (followers, following): (i64, i64) = conn.query_row(
                "SELECT (SELECT COUNT(*) FROM follows WHERE following_id = ?1),
                        (SELECT COUNT(*) FROM follows WHERE follower_id = ?1)",
                [user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok((count(followers), count(following)))
        })
    }

    /// One page of followers or followed users, most recent relation first.
    /// Returns the page and the total number of relations.
    pub fn follow_list(
        &self,
        user_id: &str,
        direction: FollowDirection,
        page: u32,
    ) -> Result<(Vec<UserSummary>, u64)> {
        // (column matching the subject, column naming the listed user)
        let (subject, listed) = match direction {
            FollowDirection::Followers => ("following_id", "follower_id"),
            FollowDirection::Following => ("follower_id", "following_id"),
        };

        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM follows WHERE {} = ?1", subject),
                [user_id],
                |row| row.get(0),
            )?;

            let sql = format!(
                "SELECT u.id, u.name
                 FROM follows f
                 JOIN users u ON u.id = f.{listed}
                 WHERE f.{subject} = ?1
                 ORDER BY f.created_at DESC, u.id ASC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let users = stmt
                .query_map(params![user_id, PAGE_SIZE, sql_offset(offset(page))], |row| {
                    Ok(UserSummary {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((users, count(total)))
        })
    }
}
