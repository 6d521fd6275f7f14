//! ttyscribe: run a command under a PTY and stream its transcript.
//!
//! Each transcript event is printed as one JSON line (or plain text with
//! `--plain`); diagnostics go to stderr via tracing.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ttyscribe_core::{CaptureConfig, Session, SessionOptions};

/// Bash one-liner mirroring the fixture binary, used when no command is
/// given: committed lines around spinner rewrites.
const DEFAULT_FIXTURE: &str = "echo 'fixture: start'; \
     for i in 1 2 3; do printf '\\rspinner |'; sleep 0.05; printf '\\rspinner /'; sleep 0.05; done; \
     printf '\\r\\033[K'; echo 'fixture: done'";

#[derive(Parser)]
#[command(
    name = "ttyscribe",
    about = "Capture a clean transcript from an interactive terminal program"
)]
struct Args {
    /// Terminal columns
    #[arg(long, default_value_t = 120)]
    cols: u16,

    /// Terminal rows
    #[arg(long, default_value_t = 30)]
    rows: u16,

    /// Working directory for the child process
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Bottom rows excluded from screen-stability emission
    #[arg(long, default_value_t = 2)]
    volatile_rows: usize,

    /// Milliseconds a screen row must stay unchanged before emission
    #[arg(long, default_value_t = 350)]
    stability_ms: u64,

    /// Print transcript text directly instead of JSON lines
    #[arg(long)]
    plain: bool,

    /// Command to run (defaults to a bundled fixture)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let command = if args.command.is_empty() {
        vec![
            "/bin/bash".to_string(),
            "-c".to_string(),
            DEFAULT_FIXTURE.to_string(),
        ]
    } else {
        args.command.clone()
    };

    let options = SessionOptions {
        command,
        cwd: args.cwd.clone(),
        cols: args.cols,
        rows: args.rows,
        capture: CaptureConfig {
            volatile_row_count: args.volatile_rows,
            stability_window: Duration::from_millis(args.stability_ms),
            suppress_alternate_screen: true,
        },
        ..Default::default()
    };

    let session = Session::spawn(options)?;
    info!(session = %session.id(), "capturing");

    while let Some(event) = session.next_event().await {
        if args.plain {
            print!("{}", event.text);
        } else {
            println!("{}", serde_json::to_string(&event.to_wire())?);
        }
    }

    let code = session.wait_for_exit().await;
    if session.dropped_events() > 0 {
        warn!(dropped = session.dropped_events(), "transcript events lost to overflow");
    }
    info!(code, "child exited");
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
