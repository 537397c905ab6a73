//! BoroHub Media server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Router, extract::DefaultBodyLimit, middleware, routing::get};
use borohub_api::{
    AppState, RateLimiterState, middleware::auth_middleware, rate_limit::rate_limit_middleware,
    router as api_router,
};
use borohub_common::{Config, LocalStorage};
use borohub_core::MAX_POST_MEDIA;
use tokio::signal;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired rate-limit windows are dropped.
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Serve stored files when the public base URL is a local path.
fn with_file_server(app: Router<AppState>, config: &Config) -> Router<AppState> {
    let base_url = config.storage.base_url.trim_end_matches('/');
    if base_url.starts_with('/') && base_url.len() > 1 {
        info!(path = %base_url, dir = %config.storage.base_path.display(), "Serving stored files");
        app.nest_service(base_url, ServeDir::new(&config.storage.base_path))
    } else {
        app
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "borohub=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting BoroHub Media server...");

    let config = Config::load().context("failed to load configuration")?;

    let db = borohub_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    borohub_db::migrate(&db).await?;
    info!("Migrations completed");

    let storage = Arc::new(LocalStorage::new(
        config.storage.base_path.clone(),
        config.storage.base_url.clone(),
    ));
    let state = AppState::new(Arc::new(db), storage, &config);

    let rate_limiter = RateLimiterState::new();
    {
        let rate_limiter = rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                rate_limiter.cleanup().await;
            }
        });
    }

    // Room for a full post upload plus form overhead.
    let body_limit = config.storage.max_file_size * (MAX_POST_MEDIA + 1);

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api", api_router(rate_limiter.clone()));
    let app = with_file_server(app, &config)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server host/port")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");
    Ok(())
}
