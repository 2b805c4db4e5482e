//! HTTP surface of the threads service: handlers, session middleware and
//! the route table.

pub mod auth;
pub mod comments;
pub mod config;
pub mod error;
pub mod likes;
pub mod middleware;
pub mod oauth;
pub mod posts;
pub mod search;
pub mod session;
pub mod state;
pub mod users;
pub mod views;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde_json::{Value, json};

pub use config::ApiConfig;
pub use state::{AppState, AppStateInner};

/// Every API route with the session loader applied. Handlers that need a
/// signed-in user take [`middleware::CurrentUser`]; the rest serve
/// anonymous callers too.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", get(auth::logout).post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/google", get(oauth::google_login))
        .route("/auth/google/callback", get(oauth::google_callback))
        // Posts
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/trending", get(posts::trending_feed))
        .route("/posts/following", get(posts::following_feed))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        // Likes
        .route("/likes/{post_id}", post(likes::toggle_like))
        // POST and GET take a post id, DELETE takes a comment id.
        .route(
            "/comments/{id}",
            get(comments::get_comments)
                .post(comments::add_comment)
                .delete(comments::delete_comment),
        )
        // Users
        .route("/users/follow/{user_id}", post(users::toggle_follow))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/posts", get(users::user_posts))
        .route("/users/{id}/follow-counts", get(users::follow_counts))
        .route("/users/{id}/followers", get(users::followers))
        .route("/users/{id}/following", get(users::following))
        // Search
        .route("/search", get(search::search))
        .layer(from_fn_with_state(state.clone(), middleware::load_session))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
