//! Clothes catalog - HTTP/JSON backend for the storefront frontend.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out
//! - `PostgreSQL` via a swappable sqlx pool (`DATABASE_URL=memory:` runs
//!   against an in-process store instead)
//! - A background liveness monitor that pings the database and reconnects
//!   when the connection is lost

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clothes_catalog_core::{ConnectionLifecycle, Store};
use clothes_catalog_server::build_router;
use clothes_catalog_server::config::CatalogConfig;
use clothes_catalog_server::db::memory::MEMORY_URL_SCHEME;
use clothes_catalog_server::db::{MemoryStore, PgStore};
use clothes_catalog_server::monitor::{LivenessMonitor, MonitorSettings};
use clothes_catalog_server::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CatalogConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = CatalogConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "clothes_catalog_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let store: Arc<dyn Store> = if config
        .database_url
        .expose_secret()
        .starts_with(MEMORY_URL_SCHEME)
    {
        tracing::warn!("Using in-memory store, data will not persist");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            PgStore::open(&config.database_url, config.pool)
                .await
                .expect("Failed to connect to database"),
        )
    };
    tracing::info!("Database connection established");

    // NOTE: The schema is managed outside this service.

    let monitor = LivenessMonitor::spawn(
        Arc::clone(&store),
        config.database_url.clone(),
        MonitorSettings {
            interval: config.health_check_interval,
            probe_timeout: config.pool.probe_timeout,
        },
    );

    let state = AppState::new(Arc::clone(&store), config.request_timeout);
    let app = build_router(state, &config.cors_allowed_origin);

    // Start server
    let addr = config.socket_addr();
    tracing::info!("catalog listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    monitor.shutdown().await;
    store.close().await;
    tracing::info!("Shutdown complete");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
