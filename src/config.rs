//! Relay configuration

use crate::relay::error::RelayError;
use std::time::Duration;

/// Environment variable naming the RTSP source locator.
pub const SOURCE_ENV: &str = "RELAY_SOURCE_URL";

/// Environment variable naming the SRT destination locator.
pub const DEST_ENV: &str = "RELAY_DEST_URL";

/// Everything needed to describe one relay topology.
///
/// Built once at startup and read-only afterwards; the supervisor
/// regenerates the topology from the same values before every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// RTSP source locator.
    pub source_url: String,

    /// SRT destination locator.
    pub dest_url: String,

    /// Source jitter buffer in milliseconds. Low values surface source
    /// failures faster.
    pub latency_ms: u32,

    /// Timeout applied to both the RTSP session and its TCP transport.
    pub io_timeout: Duration,

    /// Connection retries the source element performs internally.
    pub retry: u32,

    /// SRT stream id announced to the destination.
    pub stream_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            source_url: String::from("rtsp://127.0.0.1:8555/cam1"),
            dest_url: String::from("srt://127.0.0.1:8890"),
            latency_ms: 100,
            io_timeout: Duration::from_secs(5),
            retry: 3,
            stream_id: String::from("publish:cam1"),
        }
    }
}

impl SessionConfig {
    /// Check that the locators can describe a runnable topology.
    ///
    /// The topology builder assumes validated input; this is the only
    /// place locator shape is enforced.
    pub fn validate(&self) -> Result<(), RelayError> {
        if !self.source_url.starts_with("rtsp://") {
            return Err(RelayError::Configuration(format!(
                "source locator must be an rtsp:// URL, got '{}'",
                self.source_url
            )));
        }
        if !self.dest_url.starts_with("srt://") {
            return Err(RelayError::Configuration(format!(
                "destination locator must be an srt:// URL, got '{}'",
                self.dest_url
            )));
        }
        // the launch description is whitespace-separated
        for (name, value) in [
            ("source locator", &self.source_url),
            ("destination locator", &self.dest_url),
            ("stream id", &self.stream_id),
        ] {
            if value.contains(char::is_whitespace) {
                return Err(RelayError::Configuration(format!(
                    "{name} must not contain whitespace, got '{value}'"
                )));
            }
        }
        Ok(())
    }
}
