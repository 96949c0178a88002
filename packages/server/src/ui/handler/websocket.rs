//! WebSocket connection handlers.
//!
//! Connection lifecycle for the WebSocket transport: it assigns each session its
//! id, turns socket open / frames / close into use case calls, and drains the
//! per-connection channel that `WebSocketTransport` writes into.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    common::time::{get_jst_timestamp, timestamp_to_jst_rfc3339},
    domain::{ConnectionId, ConnectionIdFactory, OutboundEvent, Timestamp, Transport},
    infrastructure::dto::websocket::ClientEvent,
    ui::state::AppState,
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, RegisterNameUseCase,
        RequestPresenceUseCase, RouteMessageUseCase,
    },
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = match ConnectionIdFactory::generate() {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to assign connection id: {}", e);
            return;
        }
    };

    // Create a channel for this client to receive messages
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Attach before registering so the new client receives its own presence update
    let connected_at = Timestamp::new(get_jst_timestamp());
    if !state
        .transport
        .attach(connection_id.clone(), tx, connected_at)
        .await
    {
        tracing::error!(
            "Connection id '{}' is already attached. Dropping socket.",
            connection_id
        );
        return;
    }
    state
        .transport
        .send_to_one(&connection_id, OutboundEvent::Connected(connection_id.clone()))
        .await;

    // Use ConnectParticipantUseCase to register and publish presence
    let connect_usecase =
        ConnectParticipantUseCase::new(state.registry.clone(), state.broadcaster.clone());
    match connect_usecase.execute(connection_id.clone()).await {
        Ok(snapshot) => {
            tracing::info!(
                "Client '{}' connected ({} online, {} sockets)",
                connection_id,
                snapshot.len(),
                state.transport.count_connected_clients().await
            );
        }
        Err(e) => {
            // Keep the existing record; this socket never joins
            tracing::error!("Ignoring duplicate open: {}", e);
            state.transport.detach(&connection_id).await;
            return;
        }
    }

    let (mut sender, mut receiver) = socket.split();

    let recv_state = state.clone();
    let recv_id = connection_id.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", recv_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received text from '{}': {}", recv_id, text);
                    handle_client_event(&recv_state, &recv_id, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", recv_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to forward queued events to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Stop delivering to this socket, then remove it from presence
    if let Some(info) = state.transport.detach(&connection_id).await {
        tracing::debug!(
            "Detached '{}' (attached at {})",
            connection_id,
            timestamp_to_jst_rfc3339(info.connected_at.value()).unwrap_or_default()
        );
    }

    let disconnect_usecase =
        DisconnectParticipantUseCase::new(state.registry.clone(), state.broadcaster.clone());
    match disconnect_usecase.execute(&connection_id).await {
        Ok(snapshot) => {
            tracing::info!(
                "Client '{}' disconnected ({} online)",
                connection_id,
                snapshot.len()
            );
        }
        Err(e) => {
            tracing::debug!("Disconnect was a no-op: {}", e);
        }
    }
}

/// Decode one inbound frame and dispatch it to the matching use case.
///
/// Every failure here is logged and swallowed; nothing is reported back to
/// the client.
async fn handle_client_event(state: &AppState, connection_id: &ConnectionId, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                "Dropping unparseable frame from '{}': {}",
                connection_id,
                e
            );
            return;
        }
    };

    match event {
        ClientEvent::Register { name } => {
            let usecase =
                RegisterNameUseCase::new(state.registry.clone(), state.broadcaster.clone());
            match usecase.execute(connection_id, name.as_deref()).await {
                Ok(snapshot) => {
                    let display_name = snapshot
                        .display_name(connection_id)
                        .map(|n| n.as_str().to_string())
                        .unwrap_or_default();
                    tracing::info!("Client '{}' is now '{}'", connection_id, display_name);
                }
                Err(e) => tracing::debug!("Ignoring register: {}", e),
            }
        }
        ClientEvent::RequestPresence => {
            let usecase =
                RequestPresenceUseCase::new(state.registry.clone(), state.broadcaster.clone());
            usecase.execute(connection_id).await;
        }
        ClientEvent::ChatMessage(message) => {
            let usecase = RouteMessageUseCase::new(
                state.registry.clone(),
                state.transport.clone(),
                state.clock.clone(),
            );
            match usecase.execute(connection_id, message.into()).await {
                Ok(outcome) => {
                    tracing::debug!("Routed message from '{}': {:?}", connection_id, outcome)
                }
                Err(e) => tracing::warn!("Rejected message from '{}': {}", connection_id, e),
            }
        }
    }
}
