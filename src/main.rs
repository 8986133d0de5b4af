// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, process::ExitCode, sync::Arc};

use social_rust_server::{
    api::router,
    auth::TokenCodec,
    cache::{KeyValueCache, MemoryCache, UserSessionCache},
    config::{Config, LogFormat},
    state::AppState,
    storage::{Database, MediaStore},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[tokio::main]
async fn main() -> ExitCode {
    // Logging depends on LOG_FORMAT, so configuration errors go to stderr.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

async fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let db = Database::open(&config.database_path())?;
    info!(path = %config.database_path().display(), "Database opened");

    let media = MediaStore::new(config.upload_dir.clone());
    media.initialize().await?;
    info!(path = %media.root().display(), "Upload directory ready");

    let backend = cache_backend(&config);
    let sessions = UserSessionCache::new(backend, config.session_cache_ttl, config.cache_timeout);
    let tokens = TokenCodec::new(&config.jwt_secret, config.token_ttl);

    info!(
        cache = sessions.backend_name(),
        session_ttl_secs = sessions.ttl().as_secs(),
        token_ttl_secs = tokens.ttl().as_secs(),
        "Session settings"
    );

    let state = AppState::new(Arc::new(db), Arc::new(tokens), sessions, media);
    let app = router(state, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Social server listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Pick the session cache backend. Redis when configured and compiled in,
/// otherwise the in-process LRU.
fn cache_backend(config: &Config) -> Arc<dyn KeyValueCache> {
    config
        .redis_url
        .as_deref()
        .and_then(redis_backend)
        .unwrap_or_else(|| Arc::new(MemoryCache::new(config.cache_capacity)))
}

#[cfg(feature = "redis")]
fn redis_backend(url: &str) -> Option<Arc<dyn KeyValueCache>> {
    match social_rust_server::cache::RedisCache::open(url) {
        Ok(cache) => Some(Arc::new(cache)),
        Err(e) => {
            warn!(error = %e, "Redis cache unavailable, using in-memory cache");
            None
        }
    }
}

#[cfg(not(feature = "redis"))]
fn redis_backend(_url: &str) -> Option<Arc<dyn KeyValueCache>> {
    warn!("REDIS_URL is set but the redis feature is not compiled in, using in-memory cache");
    None
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
    shutdown.cancel();
}
