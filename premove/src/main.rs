//! premove - play a UCI engine from the terminal, with premoves.
//!
//! Spawns the engine, completes the UCI handshake, then runs the play loop
//! (see [`play`]) until the player quits or stdin closes. Moves are typed in
//! coordinate notation; several moves on one line queue premoves that go out
//! as soon as it is the player's turn again.
//!
//! Every tunable has a default in [`config`] that an environment variable can
//! override, and the flags below override both.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use engine::{EngineClient, EngineOption, TransportError};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod input;
mod play;
mod premoves;
mod table;
mod wait;

#[derive(Parser)]
#[command(name = "premove", about = "Play a UCI chess engine from the terminal")]
struct Cli {
    /// Engine executable. Defaults to $PREMOVE_ENGINE_PATH, then the first
    /// Stockfish found.
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Starting position. You play the side to move.
    #[arg(long, default_value = chess::START_FEN)]
    fen: String,

    /// Engine thinking time per move in milliseconds.
    #[arg(long)]
    movetime: Option<u64>,

    /// Engine search threads (clamped to 1-16).
    #[arg(long, default_value_t = 1)]
    threads: u32,

    /// Engine hash table size in MB (clamped to 1-2048).
    #[arg(long, default_value_t = 16)]
    hash: u32,

    /// Write logs to this file instead of stderr.
    #[arg(long, env = "PREMOVE_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn boot_options(&self) -> Vec<EngineOption> {
        vec![
            EngineOption::new("Threads", self.threads.clamp(1, 16)),
            EngineOption::new("Hash", self.hash.clamp(1, 2048)),
            EngineOption::new("Ponder", false),
        ]
    }

    fn settings(&self) -> play::Settings {
        play::Settings {
            move_time: Duration::from_millis(self.movetime.unwrap_or_else(config::get_movetime_ms)),
            frame_interval: Duration::from_millis(config::get_frame_interval_ms()),
        }
    }
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Logs go to a file through a background writer, or to stderr. Stdout is
/// reserved for the game transcript.
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_log_file(path)?);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;
    tracing::info!("premove starting up");

    let engine_path = cli
        .engine
        .clone()
        .or_else(config::get_engine_path)
        .ok_or(TransportError::EngineNotFound)
        .context("pass --engine or set PREMOVE_ENGINE_PATH")?;

    let cooldown = Duration::from_millis(config::get_premove_cooldown_ms());
    let mut table = table::Table::new(&cli.fen, cooldown).context("invalid --fen")?;
    let settings = cli.settings();

    let mut client = EngineClient::spawn(&engine_path, cli.boot_options())
        .with_context(|| format!("failed to start engine {}", engine_path.display()))?;

    let handshake_timeout = Duration::from_secs(config::get_handshake_timeout_secs());
    let result = match wait::wait_for_ready(&mut client, handshake_timeout).await {
        Ok(()) => play::run(&mut client, &mut table, &settings).await,
        Err(e) => Err(e.into()),
    };

    client.shutdown().await;
    tracing::info!("premove shutting down");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_file() {
        let tempdir = tempfile::tempdir().expect("failed to create temp dir");
        let log_path = tempdir.path().join("premove.log");

        assert!(!log_path.exists());
        let _ = open_log_file(&log_path).expect("failed to open log file");
        assert!(log_path.exists());
    }

    #[test]
    fn test_open_log_file_missing_dir_fails() {
        let tempdir = tempfile::tempdir().expect("failed to create temp dir");
        let log_path = tempdir.path().join("missing").join("premove.log");
        assert!(open_log_file(&log_path).is_err());
    }

    #[test]
    fn test_boot_options_are_clamped() {
        let cli = Cli::parse_from(["premove", "--threads", "64", "--hash", "0"]);
        let options = cli.boot_options();
        assert_eq!(options[0], EngineOption::new("Threads", 16));
        assert_eq!(options[1], EngineOption::new("Hash", 1));
        assert_eq!(options[2], EngineOption::new("Ponder", false));
        assert_eq!(cli.fen, chess::START_FEN);
    }

    #[test]
    fn test_movetime_flag_wins() {
        let cli = Cli::parse_from(["premove", "--movetime", "250"]);
        assert_eq!(cli.settings().move_time, Duration::from_millis(250));
    }
}
