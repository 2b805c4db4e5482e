use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use uuid::Uuid;

use threads_types::api::{CommentRequest, MessageResponse};
use threads_types::models::CommentView;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::{AppState, with_db};
use crate::views::comment_view;

/// POST /comments/{post_id}
pub async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<CommentRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::validation("Content is required"));
    }

    let comment_id = Uuid::new_v4().to_string();
    let row = with_db(&state, move |db| {
        db.add_comment(
            &comment_id,
            &post_id,
            &user.id,
            &content,
            &threads_db::timestamp(Utc::now()),
        )
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok((StatusCode::CREATED, Json(comment_view(row))))
}

/// GET /comments/{post_id}: oldest first.
pub async fn get_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Vec<CommentView>>> {
    let rows = with_db(&state, move |db| db.comments_for_post(&post_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(rows.into_iter().map(comment_view).collect()))
}

/// DELETE /comments/{id}: comment author only.
pub async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(comment_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = comment_id.clone();
    let author = with_db(&state, move |db| db.get_comment_author(&id))
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    if author != user.id {
        return Err(ApiError::forbidden("Not authorized"));
    }

    with_db(&state, move |db| db.delete_comment(&comment_id)).await?;
    Ok(Json(MessageResponse::new("Comment deleted")))
}
