//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{ParticipantDto, PresenceDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current presence snapshot, sorted by connection id
pub async fn get_presence(State(state): State<Arc<AppState>>) -> Json<PresenceDto> {
    let snapshot = state.registry.snapshot().await;

    let presence = PresenceDto {
        revision: snapshot.revision,
        participants: snapshot
            .participants
            .iter()
            .map(|(id, name)| ParticipantDto {
                connection_id: id.as_str().to_string(),
                display_name: name.as_str().to_string(),
            })
            .collect(),
    };

    Json(presence)
}
