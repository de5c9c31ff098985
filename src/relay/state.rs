//! Supervisor state management

use std::time::Instant;

/// Supervisor state machine
///
/// Tracks where the relay supervisor is in its session lifecycle. State
/// transitions are validated so the run loop cannot skip a teardown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// No session exists yet
    Idle,

    /// A session is being built and started
    Attempting,

    /// A session reached steady state and is relaying media
    Running {
        /// When the session started relaying
        started_at: Instant,
    },

    /// Waiting out the delay before the next attempt
    Restarting,

    /// Shutting down; no further sessions will be created
    Terminating,
}

impl RelayState {
    /// Check if this state transition is valid
    pub fn can_transition_to(&self, target: &RelayState) -> bool {
        use RelayState::*;

        match (self, target) {
            // From Idle
            (Idle, Attempting) => true,
            (Idle, Terminating) => true, // shutdown before the first attempt

            // From Attempting
            (Attempting, Running { .. }) => true,
            (Attempting, Terminating) => true, // construction failure or shutdown

            // From Running
            (Running { .. }, Restarting) => true,
            (Running { .. }, Terminating) => true,

            // From Restarting
            (Restarting, Attempting) => true,
            (Restarting, Terminating) => true, // shutdown during the delay

            // From Terminating - no transitions allowed
            (Terminating, _) => false,

            // Self-transitions
            (a, b) if a == b => true,

            // All other transitions invalid
            _ => false,
        }
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            RelayState::Idle => "Idle",
            RelayState::Attempting => "Attempting",
            RelayState::Running { .. } => "Running",
            RelayState::Restarting => "Restarting",
            RelayState::Terminating => "Terminating",
        }
    }

    /// Check if a session is currently relaying
    pub fn is_running(&self) -> bool {
        matches!(self, RelayState::Running { .. })
    }

    /// Check if the supervisor is shutting down
    pub fn is_terminating(&self) -> bool {
        matches!(self, RelayState::Terminating)
    }

    /// Get the duration since the session reached steady state (if running)
    pub fn running_duration(&self) -> Option<std::time::Duration> {
        if let RelayState::Running { started_at } = self {
            Some(started_at.elapsed())
        } else {
            None
        }
    }
}

impl std::fmt::Display for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
