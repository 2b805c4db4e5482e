use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::debug;

use threads_db::Toggled;
use threads_types::api::{ToggleResponse, ToggleState};

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::{AppState, with_db};

/// POST /likes/{post_id}: like, or unlike if already liked.
pub async fn toggle_like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (uid, pid) = (user.id.clone(), post_id.clone());
    let toggled = with_db(&state, move |db| {
        db.toggle_like(&uid, &pid, &threads_db::timestamp(Utc::now()))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Post not found"))?;

    debug!("{} {:?} like on {}", user.id, toggled, post_id);
    Ok(toggle_response(toggled, "Liked", "Unliked"))
}

/// 201 when the relation was created, 200 when it was removed.
pub fn toggle_response(
    toggled: Toggled,
    added: &str,
    removed: &str,
) -> (StatusCode, Json<ToggleResponse>) {
    match toggled {
        Toggled::Added => (
            StatusCode::CREATED,
            Json(ToggleResponse {
                state: ToggleState::Added,
                message: added.to_string(),
            }),
        ),
        Toggled::Removed => (
            StatusCode::OK,
            Json(ToggleResponse {
                state: ToggleState::Removed,
                message: removed.to_string(),
            }),
        ),
    }
}
