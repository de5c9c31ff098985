//! Relay supervision core
//!
//! Everything between the configuration and the transport engine:
//! - Topology: builds the launch description for one session
//! - Classification: maps raw bus events onto supervisor outcomes
//! - Supervision: the state machine owning the single active session,
//!   with restart and escalation policy
//! - Errors: the small set of failures that reach the caller
//!
//! # Architecture
//!
//! The supervisor runs as one async task and blocks only on the engine's
//! bus event channel; the shutdown signal can interrupt every wait. A
//! session that fails at runtime is torn down and rebuilt from a freshly
//! generated, identical topology after a fixed delay, forever. Only a
//! session that cannot be constructed at all ends the run with an error.

pub mod classify;
pub mod error;
pub mod session;
pub mod state;
pub mod supervisor;
pub mod topology;

pub use classify::{ClassifiedEvent, classify};
pub use error::RelayError;
pub use session::Session;
pub use state::RelayState;
pub use supervisor::{StopReason, Supervisor};
pub use topology::TopologyDescriptor;
