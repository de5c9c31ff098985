//! Session supervisor
//!
//! Owns the lifecycle of exactly one relay session at a time: build the
//! topology, hand it to the transport engine, block on the bus event
//! stream and decide after every event whether to keep waiting, tear the
//! session down and restart it, or terminate. Runtime failures are always
//! retried after a fixed delay, with no retry cap; only construction
//! failures end the run with an error.

use crate::config::SessionConfig;
use crate::engine::TransportEngine;
use crate::relay::classify::{ClassifiedEvent, classify};
use crate::relay::error::RelayError;
use crate::relay::session::Session;
use crate::relay::state::RelayState;
use crate::relay::topology;
use crate::utils::sos::SignalOfStop;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Delay between tearing down a failed session and the next attempt.
const RESTART_DELAY: Duration = Duration::from_secs(2);

/// Consecutive link warnings tolerated before the whole session is
/// restarted (about 30 seconds at the engine's retry cadence).
const LINK_WARNING_THRESHOLD: u32 = 10;

/// How often a repeated link warning is worth a log line.
const LINK_WARNING_LOG_EVERY: u32 = 5;

/// Why the supervisor returned control to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The engine retired the session without a failure and no restart
    /// was warranted.
    Stopped,

    /// Shutdown was requested from outside.
    ShutdownRequested,
}

/// What ended one session attempt.
enum SessionOutcome {
    Restart,
    Stopped,
    Shutdown,
}

/// Counts consecutive destination-link warnings and decides when they
/// amount to a dead link the engine will not recover on its own.
struct EscalationCounter {
    count: u32,
}

impl EscalationCounter {
    fn new() -> Self {
        Self { count: 0 }
    }

    /// Record one link warning, returning the consecutive count so far.
    fn record(&mut self) -> u32 {
        self.count += 1;
        self.count
    }

    /// True once the consecutive count has reached the restart threshold.
    fn exhausted(&self) -> bool {
        self.count >= LINK_WARNING_THRESHOLD
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// Supervises the relay session lifecycle.
pub struct Supervisor {
    config: SessionConfig,
    engine: Arc<dyn TransportEngine>,
    sos: SignalOfStop,
    state: RelayState,
    escalation: EscalationCounter,
}

impl Supervisor {
    pub fn new(config: SessionConfig, engine: Arc<dyn TransportEngine>, sos: SignalOfStop) -> Self {
        Self {
            config,
            engine,
            sos,
            state: RelayState::Idle,
            escalation: EscalationCounter::new(),
        }
    }

    /// Current supervisor state.
    pub fn state(&self) -> &RelayState {
        &self.state
    }

    /// Run sessions until the stream ends or shutdown is requested.
    ///
    /// Runtime failures restart the session after a fixed delay, forever.
    /// Only construction failures surface as errors: an engine that
    /// cannot even build a session indicates misconfiguration, not a
    /// transient fault.
    pub async fn run(&mut self) -> Result<StopReason, RelayError> {
        loop {
            if self.sos.cancelled() {
                self.transition(RelayState::Terminating);
                return Ok(StopReason::ShutdownRequested);
            }

            let mut session = match self.attempt().await {
                Ok(session) => session,
                Err(e) => {
                    self.transition(RelayState::Terminating);
                    return Err(e);
                }
            };

            self.transition(RelayState::Running {
                started_at: Instant::now(),
            });
            self.escalation.reset();
            info!(
                "Session running - relaying {} to {}",
                self.config.source_url, self.config.dest_url
            );

            let outcome = self.wait_for_outcome(&mut session).await;
            session.teardown().await;

            match outcome {
                SessionOutcome::Restart => {
                    if let Some(uptime) = self.state.running_duration() {
                        debug!("Session ran for {uptime:?}");
                    }
                    self.transition(RelayState::Restarting);
                    warn!("Restarting session in {} seconds...", RESTART_DELAY.as_secs());
                    tokio::select! {
                        _ = self.sos.wait_cancellation() => {
                            self.transition(RelayState::Terminating);
                            return Ok(StopReason::ShutdownRequested);
                        }
                        _ = tokio::time::sleep(RESTART_DELAY) => {}
                    }
                }
                SessionOutcome::Stopped => {
                    info!("Session stopped normally");
                    self.transition(RelayState::Terminating);
                    return Ok(StopReason::Stopped);
                }
                SessionOutcome::Shutdown => {
                    self.transition(RelayState::Terminating);
                    return Ok(StopReason::ShutdownRequested);
                }
            }
        }
    }

    /// Build the topology and bring a new session up.
    async fn attempt(&mut self) -> Result<Session, RelayError> {
        self.transition(RelayState::Attempting);

        let topology = topology::build(&self.config);
        info!("Creating session: {topology}");

        let engine_session = self.engine.create_session(&topology).await?;
        let mut session = Session::new(engine_session);
        if let Err(e) = session.start().await {
            session.teardown().await;
            return Err(e.into());
        }

        Ok(session)
    }

    /// Block on the bus until an event, the end of the event stream, or
    /// shutdown decides the session's fate.
    async fn wait_for_outcome(&mut self, session: &mut Session) -> SessionOutcome {
        loop {
            let event = tokio::select! {
                _ = self.sos.wait_cancellation() => {
                    info!("Shutdown requested - stopping session");
                    return SessionOutcome::Shutdown;
                }
                event = session.next_event() => match event {
                    Some(event) => event,
                    // the engine retired the session without a failure
                    None => return SessionOutcome::Stopped,
                },
            };

            match classify(&event) {
                ClassifiedEvent::FatalError {
                    source_disconnected,
                } => {
                    if source_disconnected {
                        error!("RTSP source disconnected: {}", event.detail);
                    } else {
                        error!("Session error: {}", event.detail);
                    }
                    if let Some(debug) = &event.debug {
                        debug!("Debug info: {debug}");
                    }
                    self.escalation.reset();
                    return SessionOutcome::Restart;
                }
                ClassifiedEvent::EndOfStream => {
                    warn!("End of stream - restarting...");
                    self.escalation.reset();
                    return SessionOutcome::Restart;
                }
                ClassifiedEvent::LinkWarning => {
                    let attempt = self.escalation.record();
                    if attempt % LINK_WARNING_LOG_EVERY == 1 {
                        warn!("SRT connection lost - engine reconnecting (attempt {attempt})");
                    }
                    if self.escalation.exhausted() {
                        warn!("SRT reconnection failed repeatedly - restarting session");
                        self.escalation.reset();
                        return SessionOutcome::Restart;
                    }
                }
                ClassifiedEvent::TransientWarning => {
                    warn!("Session warning: {}", event.detail);
                    if let Some(debug) = &event.debug {
                        debug!("Debug info: {debug}");
                    }
                }
                ClassifiedEvent::Informational => {
                    info!("Session info: {}", event.detail);
                    self.escalation.reset();
                }
                ClassifiedEvent::StateDrop { from, to } => {
                    warn!("Session dropped from {from} to {to} - possible source failure");
                }
            }
        }
    }

    /// Move to `next`, logging the change. Transitions come from the run
    /// loop in a fixed order; an invalid one is a supervisor bug.
    fn transition(&mut self, next: RelayState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        debug!("Supervisor: {} -> {}", self.state, next);
        self.state = next;
    }
}
