//! Relay session ownership
//!
//! Wraps one engine session together with its bus event stream. A
//! `Session` is exclusively owned by the supervisor and torn down at the
//! end of every attempt, whatever the outcome was.

use crate::engine::{BusEvent, EngineError, EngineSession};
use log::debug;
use tokio::sync::mpsc;

/// One attempt to run the relay topology end to end.
pub struct Session {
    inner: Box<dyn EngineSession>,
    events: mpsc::Receiver<BusEvent>,
    running: bool,
}

impl Session {
    /// Wrap a freshly constructed engine session.
    pub fn new(mut inner: Box<dyn EngineSession>) -> Self {
        let events = inner.take_events();
        Self {
            inner,
            events,
            running: false,
        }
    }

    /// Bring the session to its playing state.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        self.inner.start().await?;
        self.running = true;
        Ok(())
    }

    /// Receive the next bus event. `None` means the engine delivered
    /// everything it had and the session is over.
    pub async fn next_event(&mut self) -> Option<BusEvent> {
        self.events.recv().await
    }

    /// Tear the session down and release engine resources.
    pub async fn teardown(mut self) {
        if self.running {
            debug!("Stopping active session");
        }
        self.inner.stop().await;
    }
}
