use std::time::Duration;

use crate::config::RecordingConfig;

/// Timing knobs of the session coordinator
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Chunk delivery granularity handed to every recorder
    pub timeslice: Duration,

    /// Upper bound on waiting for the customer stream at session start.
    /// Zero means check once and accept the gap.
    pub remote_stream_wait: Duration,

    /// Interval between customer stream checks while waiting
    pub remote_stream_poll: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&RecordingConfig::default())
    }
}

impl From<&RecordingConfig> for SessionConfig {
    fn from(config: &RecordingConfig) -> Self {
        Self {
            timeslice: config.timeslice(),
            remote_stream_wait: config.remote_stream_wait(),
            remote_stream_poll: config.remote_stream_poll(),
        }
    }
}
