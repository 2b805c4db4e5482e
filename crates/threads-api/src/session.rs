//! Cookie-carried sessions.
//!
//! The cookie holds an HS256 JWT whose subject is the user id. Nothing else
//! about the user is trusted from the token: the session middleware loads
//! the user row again on every request. Expiry lives in the token's `exp`
//! claim; the cookie itself is a browser-session cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;

pub const SESSION_COOKIE: &str = "threads_session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub fn create_token(config: &ApiConfig, user_id: &str) -> anyhow::Result<String> {
    let expires = Utc::now()
        .checked_add_signed(config.session_ttl)
        .ok_or_else(|| anyhow::anyhow!("session expiry out of range"))?;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: usize::try_from(expires.timestamp())?,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate signature and expiry, returning the user id.
pub fn verify_token(config: &ApiConfig, token: &str) -> Option<String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.session_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims.sub)
}

pub fn session_cookie(config: &ApiConfig, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .build()
}

/// Cookie used to remove the session; path must match [`session_cookie`].
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
