//! Headless perimeter defense runner.
//!
//! # Usage
//!
//! ```bash
//! # Play a scenario to the end as fast as possible
//! cargo run -p td_headless -- run --scenario scenarios/opening_wave.ron
//!
//! # Play on the wall clock, taking commands from stdin
//! cargo run -p td_headless -- run --scenario scenarios/opening_wave.ron --realtime
//!
//! # Verify determinism
//! cargo run -p td_headless -- verify --scenario scenarios/opening_wave.ron --runs 5
//! ```
//!
//! Events and responses go to stdout as JSON lines. Logs go to stderr.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use td_core::events::EventSink;
use td_headless::{
    command_channel, DriverCommand, JsonLinesSink, MatchLoop, RealtimeDriver, Response, Scenario,
    StepRunner,
};

#[derive(Parser)]
#[command(name = "td_headless")]
#[command(about = "Headless perimeter defense runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scenario
    Run {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Tick on the wall clock and read commands from stdin
        #[arg(long)]
        realtime: bool,
    },

    /// Verify determinism by playing a scenario several times
    Verify {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: usize,
    },

    /// Load a scenario and check its placements without playing it
    Check {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries the protocol
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .init();

    let result = match cli.command {
        Commands::Run { scenario, realtime } => cmd_run(&scenario, realtime),
        Commands::Verify { scenario, runs } => cmd_verify(&scenario, runs),
        Commands::Check { scenario } => cmd_check(&scenario),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

type CliResult = Result<ExitCode, Box<dyn std::error::Error>>;

/// Play a scenario and print its report.
fn cmd_run(path: &Path, realtime: bool) -> CliResult {
    let scenario = Scenario::load(path)?;
    let events: Box<dyn EventSink> = Box::new(JsonLinesSink::new(std::io::stdout()));

    let report = if realtime {
        let game = MatchLoop::new(&scenario, vec![events])?;
        let (commands, receiver) = command_channel();
        spawn_stdin_reader(commands);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        runtime.block_on(RealtimeDriver::new(game, receiver).run(|response| write_response(&response)))
    } else {
        StepRunner::new(scenario).run(vec![events])?
    };

    write_response(&Response::Report(report));
    Ok(ExitCode::SUCCESS)
}

/// Write one response line to stdout with a single locked write.
fn write_response(response: &Response) {
    let mut stdout = std::io::stdout().lock();
    let result = stdout
        .write_all(response.to_json_line().as_bytes())
        .and_then(|()| stdout.flush());
    if let Err(err) = result {
        tracing::warn!(%err, "Failed to write response");
    }
}

/// Forward stdin lines to the driver until EOF.
fn spawn_stdin_reader(commands: tokio::sync::mpsc::Sender<DriverCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!(%err, "Failed to read stdin");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match DriverCommand::from_json(&line) {
                Ok(command) => {
                    if commands.blocking_send(command).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    write_response(&Response::error(format!("Invalid command: {err}"), None));
                }
            }
        }
        tracing::debug!("Stdin closed");
    });
}

/// Verify determinism.
fn cmd_verify(path: &Path, runs: usize) -> CliResult {
    let scenario = Scenario::load(path)?;
    tracing::info!(scenario = %scenario.name, runs, "Verifying determinism");

    if StepRunner::new(scenario).verify(runs)? {
        eprintln!("PASS: All {runs} runs produced identical results");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        Ok(ExitCode::FAILURE)
    }
}

/// Build the battle without playing it.
fn cmd_check(path: &Path) -> CliResult {
    let scenario = Scenario::load(path)?;
    let battle = scenario.build_battle()?;
    eprintln!(
        "OK: {} ({}x{} grid, {} units, {} spawn entries)",
        scenario.name,
        battle.grid().width(),
        battle.grid().height(),
        battle.registry().unit_count(),
        scenario.spawns.len()
    );
    Ok(ExitCode::SUCCESS)
}
