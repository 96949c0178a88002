//! Router construction and server lifecycle.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{config::ServerConfig, error::ServerError};

use super::{
    handler::{get_presence, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Build the router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/presence", get(get_presence))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Run the server with the given configuration until Ctrl+C / SIGTERM.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let local_addr = listener.local_addr()?;
    tracing::info!("Kehai server listening on {}", local_addr);
    tracing::info!("WebSocket endpoint: ws://{}/ws", local_addr);

    serve(listener, Arc::new(AppState::new()), shutdown_signal()).await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}
