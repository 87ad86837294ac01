//! Rollcall server entry point.

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use rollcall_api::{AppState, TokenVerifier, auth_middleware, health, router as api_router};
use rollcall_common::Config;
use rollcall_core::{Engine, SystemClock};
use rollcall_queue::{EngineJobExecutor, SchedulerConfig, run_scheduler};
use tokio::{signal, sync::watch};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting rollcall server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = rollcall_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    rollcall_db::migrate(&db).await?;
    info!("Migrations completed");

    let engine = Engine::new(Arc::new(db), Arc::new(SystemClock));
    let state = AppState::new(engine.clone(), TokenVerifier::new(&config.auth));

    // Build router
    let app = Router::new()
        .route("/", get(health))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start the auto-abstain sweeper
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = run_scheduler(
        SchedulerConfig::from(&config.sweeper),
        Arc::new(EngineJobExecutor::new(engine.sweeper)),
        shutdown_rx,
    );
    if config.sweeper.enabled {
        info!(
            interval_secs = config.sweeper.interval_secs,
            "Auto-abstain sweeper started"
        );
    }

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Err(e) = scheduler.await {
        error!(error = %e, "Scheduler task failed");
    }

    info!("Server shutdown complete");
    Ok(())
}
