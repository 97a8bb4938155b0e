//! HTTP API for the host page glue and operators
//!
//! - POST /contacts/events - Deliver a host SDK event
//! - GET /recording/status - Current session and artifacts
//! - GET /channels/:channel/artifact - Download the channel's last recording
//! - GET /channels/:channel/trace - Latest visualizer trace of a channel
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
