use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::{HeaderValue, Method, header::CONTENT_TYPE};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use threads_api::{ApiConfig, AppStateInner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "threads=debug,threads_api=debug,threads_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = ApiConfig::from_env();
    if config.has_placeholder_secret() {
        anyhow::bail!(
            "THREADS_SESSION_SECRET is missing or a known placeholder. \
             Set it to a long random value."
        );
    }
    if config.google.is_none() {
        warn!("GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET not set, Google sign-in disabled");
    }

    let db_path = std::env::var("THREADS_DB_PATH").unwrap_or_else(|_| "threads.db".into());
    let host = std::env::var("THREADS_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("THREADS_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    let db = threads_db::Database::open(&PathBuf::from(&db_path))?;
    info!("Database ready at {}", db_path);

    // Cookies cross origins, so the client origin has to be named exactly.
    let cors = CorsLayer::new()
        .allow_origin(config.client_url.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    let state = AppStateInner::new(db, config);
    let app = threads_api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Threads server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Could not install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
