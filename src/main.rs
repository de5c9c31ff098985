use crate::config::SessionConfig;
use crate::engine::LaunchEngine;
use crate::relay::supervisor::{StopReason, Supervisor};
use crate::utils::sos::SignalOfStop;
use anyhow::Context;
use clap::{Arg, Command};
use log::{error, info};
use std::process::ExitCode;
use std::sync::Arc;
use std::{env, panic, process};

pub mod config;
pub mod engine;
pub mod relay;
pub mod utils;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    // kill the process as soon as a background task panics
    let orig_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        process::exit(105);
    }));

    match run().await {
        Ok(StopReason::ShutdownRequested) => {
            info!("Relay shutting down");
            ExitCode::SUCCESS
        }
        Ok(StopReason::Stopped) => {
            info!("Relay stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Relay failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<StopReason> {
    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .value_name("RTSP URL")
                .help("RTSP source to read from."),
        )
        .arg(
            Arg::new("dest")
                .short('d')
                .long("dest")
                .value_name("SRT URL")
                .help("SRT destination to publish to."),
        )
        .arg(
            Arg::new("stream-id")
                .long("stream-id")
                .value_name("ID")
                .help("SRT stream id announced to the destination."),
        )
        .arg(
            Arg::new("latency")
                .long("latency")
                .value_name("MS")
                .help("Source jitter buffer in milliseconds.")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("engine")
                .long("engine")
                .value_name("PROGRAM")
                .help("Transport engine launcher binary.")
                .default_value(LaunchEngine::DEFAULT_PROGRAM),
        )
        .get_matches();

    let defaults = SessionConfig::default();
    // flag, then environment, then the built-in default
    let source_url = matches
        .get_one::<String>("source")
        .cloned()
        .or_else(|| env::var(config::SOURCE_ENV).ok())
        .unwrap_or(defaults.source_url.clone());
    let dest_url = matches
        .get_one::<String>("dest")
        .cloned()
        .or_else(|| env::var(config::DEST_ENV).ok())
        .unwrap_or(defaults.dest_url.clone());
    let stream_id = matches
        .get_one::<String>("stream-id")
        .cloned()
        .unwrap_or(defaults.stream_id.clone());
    let latency_ms = matches
        .get_one::<u32>("latency")
        .copied()
        .unwrap_or(defaults.latency_ms);

    let config = SessionConfig {
        source_url,
        dest_url,
        stream_id,
        latency_ms,
        ..defaults
    };
    config.validate()?;

    let sos = SignalOfStop::new();

    // first SIGINT/SIGTERM asks for a graceful stop, a second one while
    // teardown is still in flight exits immediately
    let signal_sos = sos.clone();
    ctrlc::set_handler(move || {
        if signal_sos.cancelled() {
            eprintln!("Force shutdown - exiting immediately");
            process::exit(1);
        }
        signal_sos.cancel();
    })
    .context("failed to set signal handler")?;

    let program = matches
        .get_one::<String>("engine")
        .cloned()
        .unwrap_or_else(|| String::from(LaunchEngine::DEFAULT_PROGRAM));

    info!("Starting RTSP to SRT relay");
    info!("Input: {}", config.source_url);
    info!("Output: {}", config.dest_url);

    let engine = Arc::new(LaunchEngine::new(program));
    let mut supervisor = Supervisor::new(config, engine, sos);
    Ok(supervisor.run().await?)
}
