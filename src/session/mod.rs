//! Session Coordinator
//!
//! This module provides the state machine that maps call lifecycle signals
//! onto recording actions:
//! - `Idle --connected(a)--> Recording(a)`
//! - `Recording(a) --connected(b)--> Recording(b)` (a is stopped first)
//! - `Recording(a) --ended(a)--> Idle`
//! - stale or foreign signals leave the state untouched

mod config;
mod coordinator;
mod state;

pub use config::SessionConfig;
pub use coordinator::{ChannelPipeline, CoordinatorHandle, SessionCoordinator};
pub use state::{IgnoreReason, SessionEvent, SessionState, SessionStatus};
