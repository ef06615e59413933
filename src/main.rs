//! cqrs_account - event-sourced bank account service
//!
//! Accepts account commands over HTTP, runs them through the command bus and
//! persists the resulting events with optimistic concurrency.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cqrs_account::api::{self, AppState};
use cqrs_account::bus::CommandBus;
use cqrs_account::config::{ConfigError, LogFormat, StoreBackend};
use cqrs_account::db;
use cqrs_account::event_store::{EventStore, InMemoryEventStore, PgEventStore};
use cqrs_account::handlers::AccountCommandHandler;
use cqrs_account::Config;

/// Initialize tracing/logging
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cqrs_account=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Open the configured event store. The pool is returned so it can be
/// closed on shutdown.
async fn connect_store(config: &Config) -> anyhow::Result<(Arc<dyn EventStore>, Option<PgPool>)> {
    match config.event_store {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory event store; events are lost on exit");
            Ok((Arc::new(InMemoryEventStore::new()), None))
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            db::verify_connection(&pool).await?;
            db::ensure_schema(&pool).await?;

            if !db::check_schema(&pool).await? {
                tracing::error!("Database schema is not complete.");
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }

            tracing::info!("Database connected successfully");
            Ok((Arc::new(PgEventStore::new(pool.clone())), Some(pool)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(
        environment = %config.environment,
        store = ?config.event_store,
        "Starting cqrs_account server"
    );

    let (store, pool) = connect_store(&config).await?;

    // Routes stay alive as long as the subscriptions do
    let bus = CommandBus::new();
    let _subscriptions = Arc::new(AccountCommandHandler::new(store.clone())).subscribe(&bus)?;

    let app = api::build_router(AppState { bus, store });

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down...");
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connections closed");
    }

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
