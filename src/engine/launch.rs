//! Child-process transport engine
//!
//! Drives a `gst-launch-1.0` compatible launcher as a child process and
//! translates its bus-message output into `BusEvent`s. The launcher runs
//! with `-m` so state changes and EOS show up on stdout; errors and
//! warnings arrive on stderr in the launcher's canonical
//! `ERROR:`/`WARNING:` form.
//!
//! A child that exits nonzero without having reported an error gets a
//! synthesized fatal event, so an engine crash can never read as a clean
//! session end.

use super::{
    BusEvent, EngineError, EngineSession, EngineState, EventCategory, TransportEngine,
};
use crate::relay::topology::TopologyDescriptor;
use async_trait::async_trait;
use log::{debug, warn};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Transport engine backed by an external launcher binary.
pub struct LaunchEngine {
    program: String,
}

impl LaunchEngine {
    pub const DEFAULT_PROGRAM: &'static str = "gst-launch-1.0";

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for LaunchEngine {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

#[async_trait]
impl TransportEngine for LaunchEngine {
    async fn create_session(
        &self,
        topology: &TopologyDescriptor,
    ) -> Result<Box<dyn EngineSession>, EngineError> {
        let mut command = Command::new(&self.program);
        // -m prints bus messages, -e forwards EOS on shutdown so the
        // muxer can finalize the container
        command
            .arg("-m")
            .arg("-e")
            .args(topology.as_str().split_whitespace())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        Ok(Box::new(LaunchSession {
            command,
            events_tx: None,
            kill_tx: None,
            done_rx: None,
        }))
    }
}

/// One spawned launcher process plus the task pumping its output.
struct LaunchSession {
    command: Command,
    events_tx: Option<mpsc::Sender<BusEvent>>,
    kill_tx: Option<oneshot::Sender<()>>,
    done_rx: Option<oneshot::Receiver<()>>,
}

#[async_trait]
impl EngineSession for LaunchSession {
    fn take_events(&mut self) -> mpsc::Receiver<BusEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.events_tx = Some(tx);
        rx
    }

    async fn start(&mut self) -> Result<(), EngineError> {
        let events_tx = self
            .events_tx
            .take()
            .ok_or_else(|| EngineError::Start(String::from("event channel not attached")))?;

        let mut child = self.command.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Start(String::from("transport process has no stdout")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Start(String::from("transport process has no stderr")))?;

        let (kill_tx, mut kill_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        self.kill_tx = Some(kill_tx);
        self.done_rx = Some(done_rx);

        tokio::spawn(async move {
            let mut out_lines = BufReader::new(stdout).lines();
            let mut err_lines = BufReader::new(stderr).lines();
            let mut out_open = true;
            let mut err_open = true;
            let mut saw_error = false;
            let mut killed = false;

            while out_open || err_open {
                let line = tokio::select! {
                    _ = &mut kill_rx => {
                        killed = true;
                        break;
                    }
                    next = out_lines.next_line(), if out_open => match next {
                        Ok(Some(line)) => line,
                        _ => {
                            out_open = false;
                            continue;
                        }
                    },
                    next = err_lines.next_line(), if err_open => match next {
                        Ok(Some(line)) => line,
                        _ => {
                            err_open = false;
                            continue;
                        }
                    },
                };

                debug!("engine: {line}");
                let Some(event) = parse_bus_line(&line) else {
                    continue;
                };
                saw_error = saw_error || event.category == EventCategory::Error;

                let sent = tokio::select! {
                    _ = &mut kill_rx => {
                        killed = true;
                        break;
                    }
                    sent = events_tx.send(event) => sent,
                };
                if sent.is_err() {
                    break;
                }
            }

            if killed || kill_rx.try_recv().is_ok() {
                let _ = child.start_kill();
            }
            match child.wait().await {
                // a crash with no error on the bus must still look fatal
                Ok(status) if !status.success() && !killed && !saw_error => {
                    let _ = events_tx
                        .send(BusEvent::error(
                            format!("transport process exited with {status}"),
                            None,
                        ))
                        .await;
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to reap transport process: {e}"),
            }
            let _ = done_tx.send(());
        });

        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(kill_tx) = self.kill_tx.take() {
            let _ = kill_tx.send(());
        }
        if let Some(done_rx) = self.done_rx.take() {
            let _ = done_rx.await;
        }
    }
}

/// Translate one launcher output line into a bus event.
///
/// Lines that carry no bus semantics (progress chatter, additional-info
/// continuations, unparsable state messages) yield `None`.
fn parse_bus_line(line: &str) -> Option<BusEvent> {
    if let Some(rest) = line.strip_prefix("ERROR: from element ") {
        let (debug, detail) = split_origin(rest);
        return Some(BusEvent::error(detail, debug));
    }
    if let Some(rest) = line.strip_prefix("ERROR: ") {
        return Some(BusEvent::error(rest, None));
    }
    if let Some(rest) = line.strip_prefix("WARNING: from element ") {
        let (debug, detail) = split_origin(rest);
        return Some(BusEvent::warning(detail, debug));
    }
    if let Some(rest) = line.strip_prefix("WARNING: ") {
        return Some(BusEvent::warning(rest, None));
    }
    if let Some(rest) = line.strip_prefix("INFO: from element ") {
        let (_, detail) = split_origin(rest);
        return Some(BusEvent::info(detail));
    }
    if line.starts_with("Got EOS from element") {
        return Some(BusEvent::end_of_stream());
    }
    if line.starts_with("Got message") && line.contains("(state-changed)") {
        let old = parse_state_field(line, "old-state=(GstState)")?;
        let new = parse_state_field(line, "new-state=(GstState)")?;
        return Some(BusEvent::state_changed(old, new));
    }
    None
}

/// Split "`<origin>: <message>`" into the origin element path and the
/// message itself.
fn split_origin(rest: &str) -> (Option<String>, String) {
    match rest.split_once(": ") {
        Some((origin, message)) => (Some(origin.to_string()), message.to_string()),
        None => (None, rest.to_string()),
    }
}

fn parse_state_field(line: &str, key: &str) -> Option<EngineState> {
    let start = line.find(key)? + key.len();
    let rest = &line[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    parse_engine_state(&rest[..end])
}

fn parse_engine_state(name: &str) -> Option<EngineState> {
    match name {
        "GST_STATE_NULL" => Some(EngineState::Null),
        "GST_STATE_READY" => Some(EngineState::Ready),
        "GST_STATE_PAUSED" => Some(EngineState::Paused),
        "GST_STATE_PLAYING" => Some(EngineState::Playing),
        // VOID_PENDING and friends are not run states
        _ => None,
    }
}
