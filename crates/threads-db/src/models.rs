//! Database row types. These map directly to SQLite rows and keep
//! timestamps as their stored strings; the API layer turns them into
//! `threads-types` views.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub provider: String,
    pub created_at: String,
}

pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub provider: &'a str,
    pub created_at: &'a str,
}

/// A post joined with its author's name and its relation counts.
#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub like_count: u64,
    pub comment_count: u64,
}

/// One page of posts plus the size of the whole result set.
pub struct PostPage {
    pub rows: Vec<PostRow>,
    pub total: u64,
}

impl PostPage {
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            total: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LikeRow {
    pub post_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub content: String,
    pub post_id: String,
    pub user_id: String,
    pub user_name: String,
    pub created_at: String,
}

/// Outcome of flipping a relation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}
