mod comments;
mod feeds;
mod follows;
mod likes;
mod posts;
mod search;
mod users;

pub use follows::FollowDirection;

use anyhow::Result;
use rusqlite::{Connection, Row, params};

use crate::models::{PostRow, Toggled};

/// Columns shared by every post listing. Counts are computed from the
/// relation tables at read time; there is no denormalised counter.
const POST_SELECT: &str = "
    SELECT p.id, p.content, p.author_id, u.name, p.created_at, p.updated_at,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id";

fn map_post_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        content: row.get(1)?,
        author_id: row.get(2)?,
        author_name: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        like_count: count(row.get(6)?),
        comment_count: count(row.get(7)?),
    })
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

fn sql_offset(offset: u64) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}

fn placeholders(from: usize, n: usize) -> String {
    (from..from + n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Delete the pair if present, otherwise insert it.
///
/// The insert uses `ON CONFLICT DO NOTHING`: if a concurrent toggle inserted
/// the same pair after our delete found nothing, the composite key absorbs the
/// duplicate and the caller still sees `Added`.
fn toggle_pair(
    conn: &Connection,
    delete_sql: &str,
    insert_sql: &str,
    a: &str,
    b: &str,
    now: &str,
) -> Result<Toggled> {
    if conn.execute(delete_sql, params![a, b])? > 0 {
        return Ok(Toggled::Removed);
    }
    conn.execute(insert_sql, params![a, b, now])?;
    Ok(Toggled::Added)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
