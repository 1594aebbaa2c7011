use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealer_api::config::ServerConfig;
use dealer_api::realtime::CarChangeRelay;
use dealer_api::router::build_app_router;
use dealer_api::state::AppState;
use dealer_api::ws;
use dealer_events::{EventBus, PgChangeFeed, RealtimeFanout};
use dealer_inventory::PgInventory;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dealer_api=debug,dealer_events=debug,dealer_inventory=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = dealer_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    dealer_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    dealer_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Realtime fan-out ---
    let event_bus = Arc::new(EventBus::default());
    let mut fanout = RealtimeFanout::new(
        Arc::new(PgChangeFeed::new(pool.clone())),
        Arc::clone(&event_bus) as _,
        config.reconnect(),
    );
    fanout
        .start()
        .expect("Realtime fan-out is started exactly once");

    // --- WebSocket manager, heartbeat and relay ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let background_cancel = CancellationToken::new();
    let heartbeat_handle =
        ws::start_heartbeat(Arc::clone(&ws_manager), background_cancel.clone());
    let relay_handle = tokio::spawn(
        CarChangeRelay::new(Arc::clone(&ws_manager))
            .run(event_bus.subscribe(), background_cancel.clone()),
    );
    tracing::info!("Realtime services started (fan-out, relay, heartbeat)");

    // --- App state ---
    let backend = Arc::new(PgInventory::new(pool));
    let state = AppState::new(
        backend,
        Arc::clone(&event_bus),
        fanout.status(),
        Arc::clone(&ws_manager),
        config.clone(),
    );
    let board = Arc::clone(&state.board);

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let timeout = config.shutdown_timeout();

    // Stop the feed first so no new events enter the bus.
    fanout.stop().await;

    board.shutdown().await;

    background_cancel.cancel();
    join_with_timeout("car change relay", relay_handle, timeout).await;
    join_with_timeout("heartbeat", heartbeat_handle, timeout).await;

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    tracing::info!("Graceful shutdown complete");
}

async fn join_with_timeout(name: &str, handle: tokio::task::JoinHandle<()>, timeout: Duration) {
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(())) => tracing::info!(task = name, "Stopped"),
        Ok(Err(e)) => tracing::error!(task = name, error = %e, "Task failed"),
        Err(_) => tracing::warn!(task = name, "Did not stop in time"),
    }
}

/// Wait for SIGINT or SIGTERM to start graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
