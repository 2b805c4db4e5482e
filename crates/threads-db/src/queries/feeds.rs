//! Paginated post listings: latest, following and trending.

use anyhow::Result;
use rusqlite::{Connection, ToSql};
use threads_types::pagination::{PAGE_SIZE, offset};
use tracing::debug;

use super::{POST_SELECT, count, map_post_row, sql_offset};
use crate::Database;
use crate::models::PostPage;

impl Database {
    /// Every post, newest first.
    pub fn latest_posts(&self, page: u32) -> Result<PostPage> {
        self.with_conn(|conn| {
            page_of_posts(
                conn,
                "",
                "p.created_at DESC, p.id DESC",
                &[],
                page,
            )
        })
    }

    /// Posts by users that `user_id` follows, newest first.
    ///
    /// A user who follows nobody gets an empty page without touching the
    /// posts table. Otherwise the follow set stays in SQL as a subquery, so
    /// its size never counts against the bound-parameter limit.
    pub fn following_feed(&self, user_id: &str, page: u32) -> Result<PostPage> {
        let (_, following) = self.follow_counts(user_id)?;
        if following == 0 {
            debug!("{} follows nobody, following feed is empty", user_id);
            return Ok(PostPage::empty());
        }

        self.with_conn(|conn| {
            page_of_posts(
                conn,
                "p.author_id IN (SELECT following_id FROM follows WHERE follower_id = ?1)",
                "p.created_at DESC, p.id DESC",
                &[&user_id as &dyn ToSql],
                page,
            )
        })
    }

    /// Posts created at or after `cutoff`, most liked first, newer first
    /// among equally liked posts.
    ///
    /// `cutoff` is a stored-form timestamp (see [`crate::timestamp`]);
    /// callers compute it from the current time on every request.
    pub fn trending_posts(&self, cutoff: &str, page: u32) -> Result<PostPage> {
        self.with_conn(|conn| {
            page_of_posts(
                conn,
                "p.created_at >= ?1",
                "like_count DESC, p.created_at DESC, p.id DESC",
                &[&cutoff as &dyn ToSql],
                page,
            )
        })
    }
}

/// Run a filtered, ordered listing and its total count. `filter` uses
/// positional parameters `?1..?n` bound from `params`; LIMIT and OFFSET are
/// appended after them.
fn page_of_posts(
    conn: &Connection,
    filter: &str,
    order_by: &str,
    params: &[&dyn ToSql],
    page: u32,
) -> Result<PostPage> {
    let where_clause = if filter.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", filter)
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM posts p{}", where_clause),
        params,
        |row| row.get(0),
    )?;

    let limit_idx = params.len() + 1;
    let sql = format!(
        "{}{} ORDER BY {} LIMIT ?{} OFFSET ?{}",
        POST_SELECT,
        where_clause,
        order_by,
        limit_idx,
        limit_idx + 1
    );

    let skip = sql_offset(offset(page));
    let mut bound: Vec<&dyn ToSql> = params.to_vec();
    bound.push(&PAGE_SIZE);
    bound.push(&skip);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(bound.as_slice(), map_post_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(PostPage {
        rows,
        total: count(total),
    })
}
