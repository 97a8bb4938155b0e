use super::state::AppState;
use crate::capture::Channel;
use crate::contact::{ContactSignal, HostEvent};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{debug, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct EventAcceptedResponse {
    /// `call_connected`, `call_ended`, or absent for informational events
    pub signal: Option<&'static str>,
    pub contact_id: Option<String>,
}

impl From<Option<ContactSignal>> for EventAcceptedResponse {
    fn from(signal: Option<ContactSignal>) -> Self {
        match signal {
            Some(signal) => Self {
                signal: Some(match &signal {
                    ContactSignal::CallConnected { .. } => "call_connected",
                    ContactSignal::CallEnded { .. } => "call_ended",
                }),
                contact_id: Some(signal.contact_id().to_string()),
            },
            None => Self {
                signal: None,
                contact_id: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn parse_channel(raw: &str) -> Result<Channel, Response> {
    raw.parse::<Channel>()
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /contacts/events
/// Feed one host SDK event through the contact event adapter
pub async fn post_contact_event(
    State(state): State<AppState>,
    Json(event): Json<HostEvent>,
) -> impl IntoResponse {
    let signal = state.adapter.handle(&event);
    (StatusCode::ACCEPTED, Json(EventAcceptedResponse::from(signal)))
}

/// GET /recording/status
/// Current session state, device state and live artifacts
pub async fn get_recording_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.coordinator.status()))
}

/// GET /channels/:channel/artifact
/// Bytes of the channel's live artifact
pub async fn get_channel_artifact(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Response {
    let channel = match parse_channel(&channel) {
        Ok(channel) => channel,
        Err(response) => return response,
    };

    let status = state.coordinator.status();
    let artifact = match channel {
        Channel::Operator => status.operator_artifact,
        Channel::Customer => status.customer_artifact,
    };

    let Some(artifact) = artifact else {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("No recording for {} channel", channel),
        );
    };

    match state.object_urls.resolve(&artifact.url) {
        Some(blob) => {
            debug!("Serving {} artifact {} ({} bytes)", channel, artifact.url, blob.size());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, blob.mime_type().to_string())],
                blob.data().to_vec(),
            )
                .into_response()
        }
        None => {
            warn!("Artifact URL no longer resolves: {}", artifact.url);
            error_response(
                StatusCode::NOT_FOUND,
                format!("Recording for {} channel is no longer available", channel),
            )
        }
    }
}

/// GET /channels/:channel/trace
/// Latest frequency trace drawn for the channel
pub async fn get_channel_trace(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Response {
    let channel = match parse_channel(&channel) {
        Ok(channel) => channel,
        Err(response) => return response,
    };

    match state.traces.get(&channel) {
        Some(surface) => (StatusCode::OK, Json(surface.snapshot())).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("No canvas configured for {} channel", channel),
        ),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
