//! Google sign-in (OAuth 2.0 authorization-code flow).

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use rand::RngCore;
use reqwest::Url;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use threads_db::models::NewUser;
use threads_types::models::Provider;

use crate::config::GoogleConfig;
use crate::error::{ApiError, ApiResult};
use crate::session::{create_token, session_cookie};
use crate::state::{AppState, with_db};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

pub const STATE_COOKIE: &str = "threads_oauth_state";
const STATE_COOKIE_PATH: &str = "/auth/google";

/// What we keep from Google's userinfo response.
#[derive(Debug, Deserialize)]
pub struct GoogleProfile {
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct GoogleClient {
    config: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleClient {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn authorize_url(&self, csrf_state: &str) -> anyhow::Result<Url> {
        Ok(Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", csrf_state),
            ],
        )?)
    }

    /// Trade an authorization code for the signed-in user's profile.
    pub async fn fetch_profile(&self, code: &str) -> anyhow::Result<GoogleProfile> {
        let token: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let profile = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(profile)
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/google: redirect to Google's consent screen.
pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| ApiError::not_found("Google sign-in is not configured"))?;

    let csrf_state = random_state();
    let url = google.authorize_url(&csrf_state)?;

    let cookie = Cookie::build((STATE_COOKIE, csrf_state))
        .path(STATE_COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies)
        .build();

    Ok((jar.add(cookie), Redirect::to(url.as_str())))
}

/// GET /auth/google/callback: finish sign-in and send the browser back to
/// the web client. Any failure lands on the client's login page.
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path(STATE_COOKIE_PATH));
    let failure = format!("{}/login", state.config.client_url);

    match complete_sign_in(&state, expected, query).await {
        Ok(user_id) => match create_token(&state.config, &user_id) {
            Ok(token) => (
                jar.add(session_cookie(&state.config, token)),
                Redirect::to(&format!("{}/", state.config.client_url)),
            ),
            Err(e) => {
                warn!("Google sign-in failed: {:#}", e);
                (jar, Redirect::to(&failure))
            }
        },
        Err(e) => {
            warn!("Google sign-in failed: {}", e);
            (jar, Redirect::to(&failure))
        }
    }
}

/// Verify the CSRF state, fetch the profile, and find or create the account.
async fn complete_sign_in(
    state: &AppState,
    expected_state: Option<String>,
    query: CallbackQuery,
) -> ApiResult<String> {
    if let Some(err) = query.error {
        return Err(ApiError::validation(format!("provider returned error: {}", err)));
    }

    match (expected_state, query.state) {
        (Some(expected), Some(got)) if expected == got => {}
        _ => return Err(ApiError::validation("OAuth state mismatch")),
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::validation("missing authorization code"))?;

    let google = state
        .google
        .as_ref()
        .ok_or_else(|| ApiError::not_found("Google sign-in is not configured"))?;

    let profile = google.fetch_profile(&code).await?;
    let email = profile
        .email
        .filter(|e| !e.is_empty())
        .map(|e| e.trim().to_lowercase())
        .ok_or_else(|| ApiError::validation("Google profile has no email"))?;
    if !profile.email_verified {
        return Err(ApiError::validation("Google email is not verified"));
    }
    let name = profile
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let user = with_db(state, move |db| {
        db.find_or_create_user(&NewUser {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            password_hash: "",
            name: &name,
            provider: Provider::Google.as_str(),
            created_at: &threads_db::timestamp(Utc::now()),
        })
    })
    .await?;

    info!("{} signed in with Google", user.id);
    Ok(user.id)
}

fn random_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleClient {
        GoogleClient::new(GoogleConfig {
            client_id: "client-123".into(),
            client_secret: "shh".into(),
            callback_url: "http://localhost:3000/auth/google/callback".into(),
        })
    }

    #[test]
    fn authorize_url_carries_params() {
        let url = client().authorize_url("xyz").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "client-123".into())));
        assert!(pairs.contains(&("state".into(), "xyz".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://localhost:3000/auth/google/callback".into()
        )));
        assert!(!url.as_str().contains("shh"));
    }

    #[test]
    fn states_are_random() {
        let a = random_state();
        assert_eq!(a.len(), 43);
        assert_ne!(a, random_state());
    }
}
