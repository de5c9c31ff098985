//! Bus event classification
//!
//! Maps raw engine bus events onto the small set of outcomes the
//! supervisor acts on. Matching is a fixed, case-sensitive phrase list
//! against the engine's free-text details; a phrase the list does not
//! know stays non-actionable, and the engine's own error and EOS
//! reporting remains the safety net for anything missed.

use crate::engine::{BusEvent, EngineState, EventCategory};

/// Error details that mark the RTSP source dropping out.
const SOURCE_FAILURE_PHRASES: [&str; 2] = ["Could not open resource", "Failed to connect"];

/// Element tag identifying the RTSP source in engine debug details.
const SOURCE_ELEMENT_TAG: &str = "rtspsrc";

/// Warning detail emitted while the SRT link to the destination is down.
const LINK_BROKEN_PHRASE: &str = "Socket is broken or closed";

/// Semantic outcome of one bus event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifiedEvent {
    /// The session cannot continue and must be torn down.
    FatalError {
        /// The failure was recognized as the RTSP source dropping out.
        source_disconnected: bool,
    },

    /// The source delivered everything it had.
    EndOfStream,

    /// A warning with no bearing on session health.
    TransientWarning,

    /// The destination link is down and the engine is retrying it
    /// internally.
    LinkWarning,

    /// Nothing actionable.
    Informational,

    /// The engine fell out of its playing state without an error.
    StateDrop { from: EngineState, to: EngineState },
}

/// Classify one bus event. First matching rule wins.
pub fn classify(event: &BusEvent) -> ClassifiedEvent {
    match event.category {
        EventCategory::Error => {
            let in_detail = SOURCE_FAILURE_PHRASES
                .iter()
                .any(|phrase| event.detail.contains(phrase));
            let in_debug = event
                .debug
                .as_deref()
                .is_some_and(|debug| debug.contains(SOURCE_ELEMENT_TAG));
            ClassifiedEvent::FatalError {
                source_disconnected: in_detail || in_debug,
            }
        }
        EventCategory::EndOfStream => ClassifiedEvent::EndOfStream,
        EventCategory::Warning => {
            if event.detail.contains(LINK_BROKEN_PHRASE) {
                ClassifiedEvent::LinkWarning
            } else {
                ClassifiedEvent::TransientWarning
            }
        }
        EventCategory::Info => ClassifiedEvent::Informational,
        EventCategory::StateChanged => match event.state_change {
            Some(change)
                if change.old == EngineState::Playing && change.new < EngineState::Playing =>
            {
                ClassifiedEvent::StateDrop {
                    from: change.old,
                    to: change.new,
                }
            }
            _ => ClassifiedEvent::Informational,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_failures_are_source_disconnections() {
        let event = BusEvent::error("Failed to connect to rtsp://127.0.0.1:8555/cam1", None);
        assert_eq!(
            classify(&event),
            ClassifiedEvent::FatalError {
                source_disconnected: true
            }
        );

        let event = BusEvent::error("Could not open resource for reading and writing.", None);
        assert_eq!(
            classify(&event),
            ClassifiedEvent::FatalError {
                source_disconnected: true
            }
        );
    }

    #[test]
    fn source_element_tag_in_debug_marks_source_disconnection() {
        let event = BusEvent::error(
            "Internal data stream error.",
            Some(String::from("/GstPipeline:pipeline0/GstRTSPSrc:rtspsrc0")),
        );
        assert_eq!(
            classify(&event),
            ClassifiedEvent::FatalError {
                source_disconnected: true
            }
        );
    }

    #[test]
    fn other_errors_are_generic_fatals() {
        let event = BusEvent::error("Internal data stream error.", None);
        assert_eq!(
            classify(&event),
            ClassifiedEvent::FatalError {
                source_disconnected: false
            }
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        let event = BusEvent::error("failed to connect to host", None);
        assert_eq!(
            classify(&event),
            ClassifiedEvent::FatalError {
                source_disconnected: false
            }
        );

        let event = BusEvent::warning("socket is broken or closed", None);
        assert_eq!(classify(&event), ClassifiedEvent::TransientWarning);
    }

    #[test]
    fn errors_win_over_warning_phrases() {
        // link phrases only matter on warnings
        let event = BusEvent::error("Socket is broken or closed", None);
        assert_eq!(
            classify(&event),
            ClassifiedEvent::FatalError {
                source_disconnected: false
            }
        );
    }

    #[test]
    fn broken_socket_warnings_are_link_warnings() {
        let event = BusEvent::warning("Socket is broken or closed", None);
        assert_eq!(classify(&event), ClassifiedEvent::LinkWarning);
    }

    #[test]
    fn other_warnings_are_transient() {
        let event = BusEvent::warning("Can't determine running time for this packet", None);
        assert_eq!(classify(&event), ClassifiedEvent::TransientWarning);
    }

    #[test]
    fn eos_and_info_pass_through() {
        assert_eq!(classify(&BusEvent::end_of_stream()), ClassifiedEvent::EndOfStream);
        assert_eq!(
            classify(&BusEvent::info("Redistribute latency...")),
            ClassifiedEvent::Informational
        );
    }

    #[test]
    fn drop_from_playing_is_a_state_drop() {
        let event = BusEvent::state_changed(EngineState::Playing, EngineState::Paused);
        assert_eq!(
            classify(&event),
            ClassifiedEvent::StateDrop {
                from: EngineState::Playing,
                to: EngineState::Paused,
            }
        );

        let event = BusEvent::state_changed(EngineState::Playing, EngineState::Null);
        assert!(matches!(classify(&event), ClassifiedEvent::StateDrop { .. }));
    }

    #[test]
    fn state_rises_are_informational() {
        let event = BusEvent::state_changed(EngineState::Paused, EngineState::Playing);
        assert_eq!(classify(&event), ClassifiedEvent::Informational);

        let event = BusEvent::state_changed(EngineState::Ready, EngineState::Paused);
        assert_eq!(classify(&event), ClassifiedEvent::Informational);
    }
}
