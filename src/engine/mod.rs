//! Transport engine abstraction
//!
//! The relay treats the media-transport engine as a black box behind a
//! narrow seam: build a session from a topology description, start it,
//! read its bus events, stop it. Everything the supervisor ever learns
//! about the engine arrives as a `BusEvent`.

pub mod launch;

pub use launch::LaunchEngine;

use crate::relay::topology::TopologyDescriptor;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by a transport engine while building or starting a
/// session. These are never retried by the supervisor.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to spawn transport process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("failed to start session: {0}")]
    Start(String),
}

/// Coarse engine run states, ordered from torn-down to actively playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EngineState {
    Null,
    Ready,
    Paused,
    Playing,
}

impl EngineState {
    /// Engine-facing name of this state.
    pub fn name(&self) -> &'static str {
        match self {
            EngineState::Null => "NULL",
            EngineState::Ready => "READY",
            EngineState::Paused => "PAUSED",
            EngineState::Playing => "PLAYING",
        }
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Category of a bus event, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Error,
    EndOfStream,
    Warning,
    Info,
    StateChanged,
}

/// A state transition reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub old: EngineState,
    pub new: EngineState,
}

/// One raw event from the engine bus.
#[derive(Debug, Clone)]
pub struct BusEvent {
    pub category: EventCategory,

    /// Human-readable message carried by the event.
    pub detail: String,

    /// Extra diagnostic text, when the engine provides it. For errors and
    /// warnings this usually names the element that raised them.
    pub debug: Option<String>,

    /// Present only for `StateChanged` events.
    pub state_change: Option<StateChange>,
}

impl BusEvent {
    pub fn error(detail: impl Into<String>, debug: Option<String>) -> Self {
        Self {
            category: EventCategory::Error,
            detail: detail.into(),
            debug,
            state_change: None,
        }
    }

    pub fn warning(detail: impl Into<String>, debug: Option<String>) -> Self {
        Self {
            category: EventCategory::Warning,
            detail: detail.into(),
            debug,
            state_change: None,
        }
    }

    pub fn info(detail: impl Into<String>) -> Self {
        Self {
            category: EventCategory::Info,
            detail: detail.into(),
            debug: None,
            state_change: None,
        }
    }

    pub fn end_of_stream() -> Self {
        Self {
            category: EventCategory::EndOfStream,
            detail: String::from("end of stream"),
            debug: None,
            state_change: None,
        }
    }

    pub fn state_changed(old: EngineState, new: EngineState) -> Self {
        Self {
            category: EventCategory::StateChanged,
            detail: format!("state changed: {} -> {}", old.name(), new.name()),
            debug: None,
            state_change: Some(StateChange { old, new }),
        }
    }
}

/// Factory for relay sessions.
#[async_trait]
pub trait TransportEngine: Send + Sync {
    /// Build a session for the given topology. Construction failures are
    /// definitive; the supervisor does not retry them.
    async fn create_session(
        &self,
        topology: &TopologyDescriptor,
    ) -> Result<Box<dyn EngineSession>, EngineError>;
}

/// One running (or about to run) instance of a topology.
#[async_trait]
pub trait EngineSession: Send {
    /// Take the bus event receiver. Single take, before `start`; the
    /// session feeds events into it until it is stopped or retires.
    fn take_events(&mut self) -> mpsc::Receiver<BusEvent>;

    /// Bring the session to its playing state.
    async fn start(&mut self) -> Result<(), EngineError>;

    /// Tear the session down and release engine resources.
    async fn stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_states_are_ordered() {
        assert!(EngineState::Null < EngineState::Ready);
        assert!(EngineState::Ready < EngineState::Paused);
        assert!(EngineState::Paused < EngineState::Playing);
    }

    #[test]
    fn state_changed_event_carries_the_pair() {
        let event = BusEvent::state_changed(EngineState::Playing, EngineState::Paused);
        assert_eq!(event.category, EventCategory::StateChanged);
        let change = event.state_change.unwrap();
        assert_eq!(change.old, EngineState::Playing);
        assert_eq!(change.new, EngineState::Paused);
    }
}
