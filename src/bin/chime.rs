//! chime - Interactive alarm console
//!
//! Reads alarm commands from stdin, schedules them on a self-scaling
//! pool of worker tasks, and announces expirations on stdout.
//!
//! # Usage
//!
//! ```text
//! chime                         # defaults: 1s poll, 2 slots per worker
//! chime --config chime.toml     # load tuning knobs from a file
//! chime --poll-interval-ms 250  # override a single knob
//! ```
//!
//! Commands, one per line at the prompt:
//!
//! ```text
//! Start_Alarm(12): 45 Water the plants
//! Change_Alarm(12): 90 Water the garden
//! Cancel_Alarm(12)
//! View_Alarms
//! ```

use std::io::Write as _;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chime_core::Alarm;
use chime_engine::{AlarmEngine, EngineConfig, EngineEvent, Reply};
use chime_protocol::render::{self, BAD_COMMAND};
use chime_protocol::{parse_command, PROMPT};
use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// CLI Arguments
// ============================================================================

/// Interactive alarm console
#[derive(Parser, Debug)]
#[command(name = "chime")]
#[command(about = "Schedule one-shot alarms from an interactive prompt")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Worker poll interval in milliseconds (overrides the config file)
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Alarms per worker before the pool grows (overrides the config file)
    #[arg(long)]
    slot_capacity: Option<usize>,

    /// Hard ceiling on the worker pool (overrides the config file)
    #[arg(long)]
    max_workers: Option<usize>,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(ms) = args.poll_interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(capacity) = args.slot_capacity {
        config.slot_capacity = capacity;
    }
    if let Some(limit) = args.max_workers {
        config.max_workers = limit;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

// ============================================================================
// Event Printer
// ============================================================================

/// Forwards engine events to stdout: expiry announcements and pool-growth
/// lines, each printed over the prompt and followed by a fresh prompt.
///
/// The event channel buffers `EVENT_BUFFER` entries. If this task falls
/// further behind than that, the oldest announcements are dropped: the
/// lag warning on stderr reports how many, and printing resumes with the
/// events still buffered.
fn spawn_printer(
    mut events: broadcast::Receiver<EngineEvent>,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                _ = cancel_token.cancelled() => break,

                received = events.recv() => match received {
                    Ok(EngineEvent::AlarmFired { duration_secs, message, .. }) => {
                        interject(&render::announcement(duration_secs, &message));
                    }
                    Ok(EngineEvent::WorkerSpawned { id }) => {
                        interject(&render::worker_created(id));
                    }
                    Ok(EngineEvent::WorkerRetired { .. }) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "Event printer lagged, announcements dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        debug!("Event printer stopped");
    })
}

/// Prints a line over the current prompt, then redraws the prompt.
fn interject(line: &str) {
    print!("\r{line}\n{PROMPT}");
    let _ = std::io::stdout().flush();
}

// ============================================================================
// Console Loop
// ============================================================================

async fn run_console(engine: &AlarmEngine, cancel_token: &CancellationToken) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{PROMPT}");
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            biased;

            _ = cancel_token.cancelled() => {
                println!();
                return Ok(());
            }

            line = lines.next_line() => line.context("Failed to read stdin")?,
        };

        let Some(line) = line else {
            info!("End of input");
            return Ok(());
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(error) => {
                debug!(%error, "Rejected input line");
                eprintln!("{BAD_COMMAND}");
                continue;
            }
        };
        debug!(command = command.name(), "Dispatching command");

        match engine.execute(command) {
            Ok(reply) => print_reply(reply),
            Err(error) if error.is_fatal() => {
                error!(%error, "Engine fault, shutting down");
                return Err(error.into());
            }
            Err(error) => {
                debug!(%error, "Rejected command");
                eprintln!("{BAD_COMMAND}");
            }
        }
    }
}

fn print_reply(reply: Reply) {
    match reply {
        // Submissions are acknowledged by the pool, not echoed here.
        Reply::Submitted(_) => {}
        Reply::Rescheduled(alarm) => {
            let line =
                render::alarm_changed(alarm.id, Utc::now(), remaining_now(&alarm), alarm.message.as_str());
            println!("{line}");
        }
        Reply::Canceled(alarm) => {
            let line =
                render::alarm_canceled(alarm.id, Utc::now(), remaining_now(&alarm), alarm.message.as_str());
            println!("{line}");
        }
        Reply::Report(report) => {
            print!("{}", render::status_report(&report));
        }
    }
}

fn remaining_now(alarm: &Alarm) -> u64 {
    alarm.remaining_secs(Instant::now())
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout belongs to the prompt and the reports.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("chime=info".parse()?)
                .add_directive("chime_engine=info".parse()?)
                .add_directive("chime_core=info".parse()?)
                .add_directive("chime_protocol=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        poll_interval_ms = config.poll_interval_ms,
        slot_capacity = config.slot_capacity,
        max_workers = config.max_workers,
        "Alarm console starting"
    );

    let engine = AlarmEngine::new(config);
    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!(%error, "Failed to listen for interrupt");
            return;
        }
        info!("Interrupt received");
        shutdown_token.cancel();
    });

    let _monitor_handle = engine.spawn_monitor(cancel_token.clone());
    let _printer_handle = spawn_printer(engine.subscribe(), cancel_token.clone());

    let result = run_console(&engine, &cancel_token).await;

    // Workers are never joined: exiting with alarms still scheduled is
    // allowed, and their tasks die with the process.
    cancel_token.cancel();
    match engine.alarm_count() {
        Ok(remaining) if remaining > 0 => {
            info!(remaining, "Alarm console stopped with alarms still scheduled");
        }
        _ => info!("Alarm console stopped"),
    }

    result
}
