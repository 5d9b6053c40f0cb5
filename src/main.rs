use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardlink::services::analytics::spawn_refresh_worker;
use cardlink::{build_router, initialize_app_state};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardlink=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cardlink");

    let state = match initialize_app_state().await {
        Ok(state) => state,
        Err(e) => {
            error!("Startup failed: {}", e);
            return Err(e);
        },
    };

    // Keep the default-slug analytics snapshot warm
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = spawn_refresh_worker(
        state.analytics.clone(),
        state.redis_pool.clone(),
        shutdown_rx,
    );

    let bind_address = format!("{}:{}", state.config.bind_address, state.config.port);
    let environment = state.config.environment.clone();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on {} ({})", bind_address, environment);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    let _ = shutdown_tx.send(true);
    let _ = worker.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
