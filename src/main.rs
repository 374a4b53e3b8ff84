//! Wallet Auth Server
//!
//! HTTP server issuing wallet login challenges, verifying signed challenges
//! and serving the profile of authenticated wallets.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use wallet_auth_server::auth::{
    spawn_nonce_sweeper, AuthService, Clock, InMemoryNonceStore, NonceStore, SystemClock,
    TokenIssuer,
};
use wallet_auth_server::config::Config;
use wallet_auth_server::db;
use wallet_auth_server::routes::app_router;
use wallet_auth_server::state::AppState;
use wallet_auth_server::user::{
    InMemoryUserRepository, PgUserRepository, UserRepository, UserService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting wallet auth server");

    if config.uses_default_jwt_secret() {
        tracing::warn!("JWT_SECRET not set, using the development secret");
    }

    let users: Arc<dyn UserRepository> = match &config.database_url {
        Some(_) => {
            let pool = db::create_pool(&config).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgUserRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, users are kept in memory");
            Arc::new(InMemoryUserRepository::new())
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let nonces: Arc<dyn NonceStore> = Arc::new(InMemoryNonceStore::new(
        clock.clone(),
        config.auth_nonce_ttl_seconds,
    ));
    let tokens = Arc::new(TokenIssuer::with_clock(
        &config.jwt_secret,
        config.jwt_ttl_seconds,
        clock.clone(),
    ));

    let auth_service = Arc::new(AuthService::new(
        nonces.clone(),
        users.clone(),
        tokens,
        clock.clone(),
    ));
    let user_service = Arc::new(UserService::new(users));

    // Bound the nonce map; expiry itself is checked on every verify
    spawn_nonce_sweeper(
        nonces,
        clock,
        Duration::from_secs(config.nonce_sweep_interval_seconds),
    );

    let app = app_router(AppState::new(auth_service, user_service))
        .layer(configure_cors(config.cors_allowed_origins.as_deref()));

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
