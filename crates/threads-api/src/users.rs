use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use tracing::debug;

use threads_db::FollowDirection;
use threads_types::api::{FollowCounts, UserPage};
use threads_types::models::{PostView, UserProfile};
use threads_types::pagination::{PageQuery, total_pages};

use crate::error::{ApiError, ApiResult};
use crate::likes::toggle_response;
use crate::middleware::CurrentUser;
use crate::state::{AppState, with_db};
use crate::views::{post_views, user_profile};

/// GET /users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let row = with_db(&state, move |db| db.get_user_by_id(&user_id))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user_profile(row)))
}

/// GET /users/{id}/posts: newest first, unpaginated.
pub async fn user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<PostView>>> {
    let posts = with_db(&state, move |db| {
        if !db.user_exists(&user_id)? {
            return Ok(None);
        }
        let rows = db.posts_by_author(&user_id)?;
        post_views(db, rows).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(posts))
}

/// GET /users/{id}/follow-counts
pub async fn follow_counts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<FollowCounts>> {
    let (followers, following) = with_db(&state, move |db| {
        if !db.user_exists(&user_id)? {
            return Ok(None);
        }
        db.follow_counts(&user_id).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(FollowCounts {
        followers,
        following,
    }))
}

/// GET /users/{id}/followers
pub async fn followers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<UserPage>> {
    follow_page(&state, user_id, FollowDirection::Followers, query.page()).await
}

/// GET /users/{id}/following
pub async fn following(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<UserPage>> {
    follow_page(&state, user_id, FollowDirection::Following, query.page()).await
}

async fn follow_page(
    state: &AppState,
    user_id: String,
    direction: FollowDirection,
    page: u32,
) -> ApiResult<Json<UserPage>> {
    let (users, total) = with_db(state, move |db| {
        if !db.user_exists(&user_id)? {
            return Ok(None);
        }
        db.follow_list(&user_id, direction, page).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserPage {
        users,
        total,
        page,
        total_pages: total_pages(total),
    }))
}

/// POST /users/follow/{user_id}: follow, or unfollow if already following.
pub async fn toggle_follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(target_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if target_id == user.id {
        return Err(ApiError::InvalidOperation("Cannot follow yourself".into()));
    }

    let (uid, tid) = (user.id.clone(), target_id.clone());
    let toggled = with_db(&state, move |db| {
        db.toggle_follow(&uid, &tid, &threads_db::timestamp(Utc::now()))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    debug!("{} {:?} follow of {}", user.id, toggled, target_id);
    Ok(toggle_response(toggled, "Followed", "Unfollowed"))
}
