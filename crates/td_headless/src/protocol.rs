//! JSON protocol for driving a real-time match.
//!
//! **Input (stdin):** one [`DriverCommand`] per line
//! **Output (stdout):** core events, [`Response`]s and the final report
//!
//! # Example Session
//!
//! ```text
//! -> {"cmd":"change_state","phase":"Preparation"}
//! <- {"event":"PhaseChanged","from":"Combat","to":"Preparation"}
//! <- {"type":"ack","cmd":"change_state"}
//! -> {"cmd":"place_unit","unit":"archer","x":1,"y":3}
//! <- {"type":"placed","unit_id":4,"x":1,"y":3}
//! -> {"cmd":"change_state","phase":"Combat"}
//! -> {"cmd":"query"}
//! <- {"type":"state","tick":12,"phase":"Combat","units":5,"monsters":3,"selected":null}
//! ```

use serde::{Deserialize, Serialize};

use td_core::grid::GridCoordinate;
use td_core::phase::MatchPhase;

use crate::runner::RunReport;

/// Commands accepted by the real-time driver.
///
/// Commands are queued and applied between ticks, never during one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DriverCommand {
    /// Place a unit (preparation only).
    PlaceUnit {
        /// Unit definition id.
        unit: String,
        /// Grid column.
        x: u32,
        /// Grid row.
        y: u32,
    },
    /// Remove the unit on a cell (preparation only).
    RemoveUnit {
        /// Grid column.
        x: u32,
        /// Grid row.
        y: u32,
    },
    /// Spawn a monster at the loop start.
    SpawnMonster {
        /// Monster definition id.
        monster: String,
    },
    /// Move the match to another phase.
    ChangeState {
        /// Phase to enter.
        phase: MatchPhase,
    },
    /// Select a cell for placement.
    SelectCell {
        /// Grid column.
        x: u32,
        /// Grid row.
        y: u32,
    },
    /// Clear the cell selection.
    DeselectCell,
    /// Report match state without changing it.
    Query,
    /// End the match now.
    Quit,
}

impl DriverCommand {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Command name for acknowledgments.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlaceUnit { .. } => "place_unit",
            Self::RemoveUnit { .. } => "remove_unit",
            Self::SpawnMonster { .. } => "spawn_monster",
            Self::ChangeState { .. } => "change_state",
            Self::SelectCell { .. } => "select_cell",
            Self::DeselectCell => "deselect_cell",
            Self::Query => "query",
            Self::Quit => "quit",
        }
    }
}

/// Replies written by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Command applied.
    Ack {
        /// Command name.
        cmd: String,
    },
    /// Unit placed.
    Placed {
        /// New unit's id.
        unit_id: u32,
        /// Grid column.
        x: u32,
        /// Grid row.
        y: u32,
    },
    /// Monster spawned.
    Spawned {
        /// New monster's id.
        monster_id: u32,
    },
    /// Current match state.
    State {
        /// Combat tick counter.
        tick: u64,
        /// Current phase.
        phase: MatchPhase,
        /// Units placed.
        units: usize,
        /// Monsters alive.
        monsters: usize,
        /// Selected cell.
        selected: Option<GridCoordinate>,
    },
    /// Command rejected.
    Error {
        /// Reason.
        message: String,
        /// Command name, when the line parsed.
        cmd: Option<String>,
    },
    /// Final summary.
    Report(RunReport),
}

impl Response {
    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            DriverCommand::from_json(r#"{"cmd":"place_unit","unit":"archer","x":1,"y":3}"#)
                .expect("parse"),
            DriverCommand::PlaceUnit {
                unit: "archer".to_string(),
                x: 1,
                y: 3,
            }
        );
        assert_eq!(
            DriverCommand::from_json(r#"{"cmd":"change_state","phase":"Combat"}"#).expect("parse"),
            DriverCommand::ChangeState {
                phase: MatchPhase::Combat
            }
        );
        assert_eq!(
            DriverCommand::from_json(r#"{"cmd":"quit"}"#).expect("parse").name(),
            "quit"
        );
        assert!(DriverCommand::from_json(r#"{"cmd":"launch"}"#).is_err());
    }

    #[test]
    fn test_response_lines() {
        let line = Response::ack("query").to_json_line();
        assert_eq!(line, "{\"type\":\"ack\",\"cmd\":\"query\"}\n");

        let line = Response::error("bad", None).to_json_line();
        assert!(line.starts_with("{\"type\":\"error\""));
    }

    #[test]
    fn test_state_line_always_carries_selection() {
        let state = Response::State {
            tick: 12,
            phase: MatchPhase::Combat,
            units: 5,
            monsters: 3,
            selected: None,
        };
        assert_eq!(
            state.to_json_line(),
            "{\"type\":\"state\",\"tick\":12,\"phase\":\"Combat\",\"units\":5,\"monsters\":3,\"selected\":null}\n"
        );

        let state = Response::State {
            tick: 0,
            phase: MatchPhase::Preparation,
            units: 0,
            monsters: 0,
            selected: Some(GridCoordinate::new(1, 3)),
        };
        assert!(state.to_json_line().contains("\"selected\":{\"x\":1,\"y\":3}"));
    }
}
