use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use threads_types::api::{MessageResponse, PostContentRequest};
use threads_types::pagination::PageQuery;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::{AppState, with_db};
use crate::views::{page_views, post_view, post_views};

pub const MAX_POST_CHARS: usize = 280;

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    WithRejection(Json(req), _): WithRejection<Json<PostContentRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let content = validate_content(&req.content)?;
    let post_id = Uuid::new_v4().to_string();

    let row = with_db(&state, move |db| {
        db.create_post(&post_id, &user.id, &content, &threads_db::timestamp(Utc::now()))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(post_view(row, Vec::new()))))
}

/// GET /posts: everything, newest first.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.page();
    let feed = with_db(&state, move |db| {
        let rows = db.latest_posts(page)?;
        page_views(db, rows, page)
    })
    .await?;
    Ok(Json(feed))
}

/// GET /posts/following: posts by users the caller follows.
pub async fn following_feed(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.page();
    let feed = with_db(&state, move |db| {
        let rows = db.following_feed(&user.id, page)?;
        page_views(db, rows, page)
    })
    .await?;
    Ok(Json(feed))
}

/// GET /posts/trending: most liked posts inside the trending window.
///
/// The window is measured back from the moment of the request, so the same
/// request repeated later can drop posts that have aged out.
pub async fn trending_feed(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.page();
    let cutoff = threads_db::timestamp(trending_cutoff(Utc::now(), state.config.trending_window));
    let feed = with_db(&state, move |db| {
        let rows = db.trending_posts(&cutoff, page)?;
        page_views(db, rows, page)
    })
    .await?;
    Ok(Json(feed))
}

/// Start of the trending window. A window too large to subtract falls back
/// to the Unix epoch, which covers every post.
pub fn trending_cutoff(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(window).unwrap_or_default()
}

/// GET /posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let view = with_db(&state, move |db| {
        db.get_post(&post_id)?
            .map(|row| post_views(db, vec![row]))
            .transpose()
    })
    .await?
    .and_then(|views| views.into_iter().next())
    .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(view))
}

/// PUT /posts/{id}: author only.
pub async fn update_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<PostContentRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let content = validate_content(&req.content)?;
    ensure_post_author(&state, &post_id, &user).await?;

    // The post can disappear between the ownership check and the update.
    let view = with_db(&state, move |db| {
        db.update_post_content(&post_id, &content, &threads_db::timestamp(Utc::now()))?
            .map(|row| post_views(db, vec![row]))
            .transpose()
    })
    .await?
    .and_then(|views| views.into_iter().next())
    .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(view))
}

/// DELETE /posts/{id}: author only. Comments and likes go with it.
pub async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    ensure_post_author(&state, &post_id, &user).await?;

    let id = post_id.clone();
    if !with_db(&state, move |db| db.delete_post(&id)).await? {
        return Err(ApiError::not_found("Post not found"));
    }

    debug!("{} deleted post {}", user.id, post_id);
    Ok(Json(MessageResponse::new("Post deleted")))
}

/// 404 if the post is missing, 403 if someone else wrote it.
async fn ensure_post_author(state: &AppState, post_id: &str, user: &CurrentUser) -> ApiResult<()> {
    let id = post_id.to_string();
    let author = with_db(state, move |db| db.get_post_author(&id))
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    if author != user.id {
        return Err(ApiError::forbidden("Not authorized"));
    }
    Ok(())
}

/// Trimmed content, 1 to 280 characters.
pub fn validate_content(raw: &str) -> ApiResult<String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(ApiError::validation("Content is required"));
    }
    if content.chars().count() > MAX_POST_CHARS {
        return Err(ApiError::validation(format!(
            "Max {} characters",
            MAX_POST_CHARS
        )));
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_limits() {
        assert!(validate_content("").is_err());
        assert!(validate_content("   \n").is_err());
        assert_eq!(validate_content("  hi  ").unwrap(), "hi");
        assert!(validate_content(&"a".repeat(280)).is_ok());
        assert!(validate_content(&"a".repeat(281)).is_err());
        // counted in characters, not bytes
        assert!(validate_content(&"é".repeat(280)).is_ok());
    }

    #[test]
    fn trending_cutoff_never_overflows() {
        let now = Utc::now();
        assert_eq!(trending_cutoff(now, Duration::days(10)), now - Duration::days(10));
        assert_eq!(trending_cutoff(now, Duration::MAX), DateTime::<Utc>::default());
    }
}
