//! Topology construction
//!
//! Turns a `SessionConfig` into the launch description consumed by the
//! transport engine. Pure and deterministic: equal configs produce equal
//! descriptors, so a restarted session always reruns the same topology.

use crate::config::SessionConfig;

/// Opaque launch description for one relay topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyDescriptor(String);

impl TopologyDescriptor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TopologyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the relay topology for `config`.
///
/// The chain reads H.264 video from the RTSP source over TCP, remuxes it
/// into MPEG-TS and pushes it to the SRT destination in caller mode
/// without waiting for the destination to be up.
pub fn build(config: &SessionConfig) -> TopologyDescriptor {
    let timeout_us = config.io_timeout.as_micros();
    let description = format!(
        // tight source timeouts so a dead camera is noticed quickly
        "rtspsrc location={src} protocols=tcp do-rtsp-keep-alive=true latency={latency} \
         timeout={timeout_us} tcp-timeout={timeout_us} retry={retry} ! \
         rtph264depay ! \
         h264parse config-interval=-1 ! \
         video/x-h264,stream-format=byte-stream,alignment=au ! \
         mpegtsmux ! \
         srtclientsink uri={dst} streamid={sid} mode=caller wait-for-connection=false",
        src = config.source_url,
        latency = config.latency_ms,
        retry = config.retry,
        dst = config.dest_url,
        sid = config.stream_id,
    );
    TopologyDescriptor(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_is_deterministic() {
        let config = SessionConfig::default();
        assert_eq!(build(&config), build(&config.clone()));
    }

    #[test]
    fn descriptor_carries_both_locators() {
        let config = SessionConfig {
            source_url: String::from("rtsp://camera.local:8554/door"),
            dest_url: String::from("srt://ingest.example.com:9000"),
            ..SessionConfig::default()
        };
        let descriptor = build(&config);
        assert!(descriptor.as_str().contains("location=rtsp://camera.local:8554/door"));
        assert!(descriptor.as_str().contains("uri=srt://ingest.example.com:9000"));
    }

    #[test]
    fn tuning_parameters_are_rendered() {
        let descriptor = build(&SessionConfig::default());
        let text = descriptor.as_str();
        assert!(text.contains("latency=100"));
        assert!(text.contains("timeout=5000000"));
        assert!(text.contains("tcp-timeout=5000000"));
        assert!(text.contains("retry=3"));
        assert!(text.contains("streamid=publish:cam1"));
    }

    #[test]
    fn different_sources_yield_different_descriptors() {
        let a = SessionConfig::default();
        let b = SessionConfig {
            source_url: String::from("rtsp://127.0.0.1:8555/cam2"),
            ..SessionConfig::default()
        };
        assert_ne!(build(&a), build(&b));
    }
}
