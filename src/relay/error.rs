//! Relay error types

use crate::engine::EngineError;
use thiserror::Error;

/// Errors that cross the supervisor boundary.
///
/// Runtime failures never appear here; the supervisor absorbs them into
/// its restart loop. Only problems that prevent a session from ever
/// starting are surfaced to the caller.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The configuration cannot describe a runnable topology.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The engine could not build or start a session from the topology.
    #[error("failed to construct session: {0}")]
    SessionConstruction(#[from] EngineError),
}
