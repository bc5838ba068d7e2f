//! Voltbook HTTP server.
//!
//! EV-charging-station booking backend: slot reservations with per-station
//! capacity consistency over `PostgreSQL`.

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voltbook_core::policy::PermissiveGuard;
use voltbook_core::{SystemClock, TimeSlotCalendar};
use voltbook_postgres::{run_migrations, PgBookingStore, PgStationStore};
use voltbook_web::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voltbook=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Voltbook HTTP Server");

    // Load configuration
    let config = Config::from_env();
    info!(
        database_url = %config.database.url,
        bind = %config.bind_addr(),
        "Configuration loaded"
    );

    // Connect to PostgreSQL
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
        .connect(&config.database.url)
        .await?;

    info!("Running database migrations...");
    run_migrations(&pool).await?;
    info!("Database ready");

    // Wire the engine
    let pool = Arc::new(pool);
    let state = AppState::new(
        Arc::new(PgStationStore::new(Arc::clone(&pool))),
        Arc::new(PgBookingStore::new(pool)),
        Arc::new(PermissiveGuard),
        Arc::new(SystemClock),
        TimeSlotCalendar::reference(),
    );

    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
