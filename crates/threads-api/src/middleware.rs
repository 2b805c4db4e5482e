use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::error::ApiError;
use crate::session::{SESSION_COOKIE, verify_token};
use crate::state::{AppState, with_db};

/// The signed-in user, freshly loaded from the database for this request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Resolve the session cookie into a [`CurrentUser`] request extension.
///
/// A missing, invalid or expired cookie, or one naming a user that no
/// longer exists, leaves the request anonymous. Routes that need a user
/// take [`CurrentUser`] as an extractor, which rejects anonymous requests
/// with 401.
pub async fn load_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let user_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| verify_token(&state.config, cookie.value()));

    if let Some(user_id) = user_id {
        match with_db(&state, move |db| db.get_user_by_id(&user_id)).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(CurrentUser {
                    id: user.id,
                    email: user.email,
                    name: user.name,
                });
            }
            Ok(None) => debug!("Session names a deleted user, treating as anonymous"),
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}
