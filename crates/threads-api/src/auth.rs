use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::{CookieJar, WithRejection};
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use threads_db::models::NewUser;
use threads_types::api::{LoginRequest, MeResponse, MessageResponse, RegisterRequest, SessionUser};
use threads_types::models::Provider;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::session::{create_token, removal_cookie, session_cookie};
use crate::state::{AppState, with_db};

pub const MIN_PASSWORD_LEN: usize = 6;

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let email = normalize_email(&req.email);
    validate_credentials(&email, &req.password)?;

    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_name(&email));

    let lookup = email.clone();
    if with_db(&state, move |db| db.get_user_by_email(&lookup)).await?.is_some() {
        return Err(ApiError::Conflict("Email already in use".into()));
    }

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("password hashing task failed"))
        })??;

    let user_id = Uuid::new_v4().to_string();
    let created = {
        let (id, email) = (user_id.clone(), email.clone());
        with_db(&state, move |db| {
            db.create_user(&NewUser {
                id: &id,
                email: &email,
                password_hash: &password_hash,
                name: &name,
                provider: Provider::Local.as_str(),
                created_at: &threads_db::timestamp(Utc::now()),
            })
        })
        .await
    };

    let user = match created {
        Ok(user) => user,
        // Lost a race with a concurrent registration of the same email.
        Err(ApiError::Internal(e)) if threads_db::is_unique_violation(&e) => {
            return Err(ApiError::Conflict("Email already in use".into()));
        }
        Err(e) => return Err(e),
    };

    info!("Registered {} ({})", user.email, user.id);

    let token = create_token(&state.config, &user.id)?;
    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(&state.config, token)),
        Json(SessionUser {
            id: user.id,
            email: user.email,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let email = normalize_email(&req.email);
    validate_credentials(&email, &req.password)?;

    let user = with_db(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // OAuth accounts have no password to check against.
    if user.provider != Provider::Local.as_str() || user.password_hash.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    let password = req.password;
    let stored = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("password verification task failed"))
        })?;
    if !valid {
        return Err(ApiError::Unauthorized);
    }

    info!("{} logged in", user.id);

    let token = create_token(&state.config, &user.id)?;
    Ok((
        jar.add(session_cookie(&state.config, token)),
        Json(SessionUser {
            id: user.id,
            email: user.email,
        }),
    ))
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(removal_cookie()),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

pub async fn me(user: CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: user.id,
        email: user.email,
        name: user.name,
    })
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn validate_credentials(email: &str, password: &str) -> ApiResult<()> {
    if !is_valid_email(email) {
        return Err(ApiError::validation("Invalid email format"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// `local@domain.tld`, no whitespace, exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

fn default_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
