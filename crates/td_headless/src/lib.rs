//! Headless match runner for perimeter defense.
//!
//! Plays scenarios without graphics so that CI and scripted controllers can
//! exercise the combat core:
//!
//! - **Step mode**: run a scenario as fast as possible and print a report
//! - **Real-time mode**: tick on the wall clock and accept commands on stdin
//! - **Verification**: replay a scenario several times and compare state hashes
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: [`protocol::DriverCommand`]s (real-time mode only)
//! - **stdout**: core events, [`protocol::Response`]s and the final report
//! - **stderr**: logs
//!
//! # Example
//!
//! ```bash
//! cargo run -p td_headless -- run --scenario scenarios/opening_wave.ron
//! echo '{"cmd":"query"}' | cargo run -p td_headless -- run --scenario scenarios/opening_wave.ron --realtime
//! cargo run -p td_headless -- verify --scenario scenarios/opening_wave.ron --runs 5
//! ```

pub mod driver;
pub mod output;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use driver::{command_channel, handle_command, RealtimeDriver};
pub use output::JsonLinesSink;
pub use protocol::{DriverCommand, Response};
pub use runner::{MatchLoop, RunReport, StepRunner, StepStatus, WaveSchedule};
pub use scenario::{Scenario, ScenarioError, SpawnEntry, UnitPlacement};
