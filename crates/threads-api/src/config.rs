use std::str::FromStr;

use chrono::Duration;

/// Upper bound for day-count settings. Anything outside 1..=MAX_DAYS falls
/// back to the default.
pub const MAX_DAYS: i64 = 36_500;

/// Placeholder session secrets that must never reach production.
pub const PLACEHOLDER_SECRETS: &[&str] = &["supersecret", "change-me", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

/// Settings the HTTP layer needs at request time.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub session_secret: String,
    pub session_ttl: Duration,
    pub secure_cookies: bool,
    /// Trailing window for the trending feed.
    pub trending_window: Duration,
    /// Web client origin: CORS allow-origin and OAuth redirect target.
    pub client_url: String,
    /// `None` disables the Google sign-in routes.
    pub google: Option<GoogleConfig>,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparsable values fall back to
    /// their defaults.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_secret = get("THREADS_SESSION_SECRET").unwrap_or_default();
        let session_ttl = days_or(&get, "THREADS_SESSION_TTL_DAYS", 7);
        let trending_window = days_or(&get, "THREADS_TRENDING_WINDOW_DAYS", 10);
        let secure_cookies: bool = parse_or(&get, "THREADS_SECURE_COOKIES", false);
        let client_url = get("THREADS_CLIENT_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "http://localhost:3001".into());

        let google = match (get("GOOGLE_CLIENT_ID"), get("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(GoogleConfig {
                    client_id,
                    client_secret,
                    callback_url: get("GOOGLE_CALLBACK_URL")
                        .unwrap_or_else(|| "http://localhost:3000/auth/google/callback".into()),
                })
            }
            _ => None,
        };

        Self {
            session_secret,
            session_ttl,
            secure_cookies,
            trending_window,
            client_url: client_url.trim_end_matches('/').to_string(),
            google,
        }
    }

    pub fn has_placeholder_secret(&self) -> bool {
        self.session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&self.session_secret.as_str())
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    get(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn days_or<F>(get: &F, key: &str, default: i64) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    let days: i64 = parse_or(get, key, default);
    Some(days)
        .filter(|d| (1..=MAX_DAYS).contains(d))
        .and_then(Duration::try_days)
        .unwrap_or_else(|| Duration::days(default))
}
