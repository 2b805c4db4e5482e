use axum::{
    Json,
    extract::{Query, State},
};

use threads_types::api::{SearchQuery, SearchResponse};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_db};
use crate::views::post_views;

pub const MIN_QUERY_CHARS: usize = 2;
pub const SEARCH_LIMIT: u32 = 10;

/// GET /search?q=: posts by content and users by name. Both lists are
/// capped independently.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let term = query.q.as_deref().unwrap_or_default().trim().to_string();
    if term.chars().count() < MIN_QUERY_CHARS {
        return Err(ApiError::validation(format!(
            "Search query must be at least {} characters",
            MIN_QUERY_CHARS
        )));
    }

    let post_term = term.clone();
    let (posts, users) = tokio::try_join!(
        with_db(&state, move |db| {
            let rows = db.search_posts(&post_term, SEARCH_LIMIT)?;
            post_views(db, rows)
        }),
        with_db(&state, move |db| db.search_users(&term, SEARCH_LIMIT)),
    )?;

    Ok(Json(SearchResponse { posts, users }))
}
