//! Row → wire conversions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use threads_db::Database;
use threads_db::models::{CommentRow, LikeRow, PostPage, PostRow, UserRow};
use threads_types::models::{CommentView, LikeRef, PostView, UserProfile, UserSummary};
use threads_types::pagination::Paginated;
use tracing::warn;

pub fn parse_time(raw: &str, what: &str) -> DateTime<Utc> {
    threads_db::parse_timestamp(raw).unwrap_or_else(|e| {
        warn!("Corrupt timestamp '{}' on {}: {}", raw, what, e);
        DateTime::default()
    })
}

/// Attach likes to a batch of post rows. Two queries total, whatever the
/// batch size.
pub fn post_views(db: &Database, rows: Vec<PostRow>) -> anyhow::Result<Vec<PostView>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let like_rows = db.likes_for_posts(&ids)?;

    let mut likes: HashMap<String, Vec<LikeRef>> = HashMap::new();
    for LikeRow { post_id, user_id } in like_rows {
        likes.entry(post_id).or_default().push(LikeRef { user_id });
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let post_likes = likes.remove(&row.id).unwrap_or_default();
            post_view(row, post_likes)
        })
        .collect())
}

pub fn post_view(row: PostRow, likes: Vec<LikeRef>) -> PostView {
    let created_at = parse_time(&row.created_at, &row.id);
    let updated_at = row.updated_at.as_deref().map(|t| parse_time(t, &row.id));
    PostView {
        author: UserSummary {
            id: row.author_id.clone(),
            name: row.author_name,
        },
        id: row.id,
        content: row.content,
        author_id: row.author_id,
        created_at,
        updated_at,
        likes,
        like_count: row.like_count,
        comment_count: row.comment_count,
    }
}

pub fn page_views(db: &Database, page: PostPage, number: u32) -> anyhow::Result<Paginated<PostView>> {
    let items = post_views(db, page.rows)?;
    Ok(Paginated::new(items, page.total, number))
}

pub fn comment_view(row: CommentRow) -> CommentView {
    CommentView {
        created_at: parse_time(&row.created_at, &row.id),
        id: row.id,
        content: row.content,
        post_id: row.post_id,
        user: UserSummary {
            id: row.user_id,
            name: row.user_name,
        },
    }
}

pub fn user_profile(row: UserRow) -> UserProfile {
    UserProfile {
        created_at: parse_time(&row.created_at, &row.id),
        id: row.id,
        name: row.name,
        email: row.email,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_timestamp_falls_back_to_epoch() {
        assert_eq!(parse_time("yesterday", "post x"), DateTime::<Utc>::default());
    }

    #[test]
    fn post_view_carries_author_summary() {
        let row = PostRow {
            id: "p1".into(),
            content: "hi".into(),
            author_id: "u1".into(),
            author_name: "Ann".into(),
            created_at: "2026-01-02T03:04:05.000000Z".into(),
            updated_at: None,
            like_count: 1,
            comment_count: 4,
        };
        let view = post_view(row, vec![LikeRef { user_id: "u2".into() }]);
        assert_eq!(view.author, UserSummary { id: "u1".into(), name: "Ann".into() });
        assert_eq!(view.like_count, 1);
        assert_eq!(view.comment_count, 4);
        assert_eq!(view.created_at.to_rfc3339(), "2026-01-02T03:04:05+00:00");
    }
}
