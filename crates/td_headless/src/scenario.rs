//! Scenario loading and configuration.
//!
//! Scenarios define a complete headless match: layout, the definition
//! catalog, starting placements, a spawn schedule and the policy deciding
//! how the round ends.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use td_core::battle::Battle;
use td_core::config::{CoreConfig, Viewport};
use td_core::data::Catalog;
use td_core::error::CoreError;
use td_core::grid::GridCoordinate;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario's content was rejected by the core.
    #[error("Invalid scenario: {0}")]
    Core(#[from] CoreError),
    /// A determinism check needs something to compare.
    #[error("Determinism check needs at least 2 runs, got {0}")]
    TooFewRuns(usize),
}

/// A unit placed before combat starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Unit definition id.
    pub unit: String,
    /// Grid column.
    pub x: u32,
    /// Grid row.
    pub y: u32,
}

impl UnitPlacement {
    /// Create a placement.
    #[must_use]
    pub fn new(unit: &str, x: u32, y: u32) -> Self {
        Self {
            unit: unit.to_string(),
            x,
            y,
        }
    }

    /// Target cell.
    #[must_use]
    pub const fn coord(&self) -> GridCoordinate {
        GridCoordinate::new(self.x, self.y)
    }
}

/// Monsters entering the loop on a given combat tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Monster definition id.
    pub monster: String,
    /// Combat tick (1-based) the monsters appear on.
    pub at_tick: u64,
    /// How many to spawn.
    #[serde(default = "default_spawn_count")]
    pub count: u32,
}

fn default_spawn_count() -> u32 {
    1
}

impl SpawnEntry {
    /// Create a spawn of `count` monsters at `at_tick`.
    #[must_use]
    pub fn new(monster: &str, at_tick: u64, count: u32) -> Self {
        Self {
            monster: monster.to_string(),
            at_tick,
            count,
        }
    }
}

/// A complete headless match.
///
/// # Example RON
///
/// ```ron
/// Scenario(
///     name: "Opening wave",
///     viewport: (400, 800),
///     catalog: (units: [...], monsters: [...]),
///     placements: [(unit: "archer", x: 0, y: 0)],
///     spawns: [(monster: "slime", at_tick: 1, count: 3)],
///     combat_ticks: 600,
///     max_laps: Some(3),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Grid layout and tick rate.
    #[serde(default)]
    pub config: CoreConfig,
    /// Viewport size (width, height) in world units.
    #[serde(default = "default_viewport")]
    pub viewport: (i32, i32),
    /// Unit and monster definitions.
    pub catalog: Catalog,
    /// Units placed during preparation.
    #[serde(default)]
    pub placements: Vec<UnitPlacement>,
    /// Spawn schedule.
    #[serde(default)]
    pub spawns: Vec<SpawnEntry>,
    /// Upper bound on combat ticks before the round is called.
    #[serde(default = "default_combat_ticks")]
    pub combat_ticks: u64,
    /// Laps after which a monster escapes. `None` lets monsters loop forever.
    #[serde(default)]
    pub max_laps: Option<u32>,
    /// Escaped monsters tolerated before the match is lost.
    #[serde(default)]
    pub max_leaks: u32,
}

fn default_viewport() -> (i32, i32) {
    (400, 800)
}

fn default_combat_ticks() -> u64 {
    600
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        tracing::debug!(name = %scenario.name, path = %path.display(), "Scenario loaded");
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Create a minimal scenario around `catalog` with nothing placed.
    #[must_use]
    pub fn empty(name: &str, catalog: Catalog) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            config: CoreConfig::default(),
            viewport: default_viewport(),
            catalog,
            placements: Vec::new(),
            spawns: Vec::new(),
            combat_ticks: default_combat_ticks(),
            max_laps: None,
            max_leaks: 0,
        }
    }

    /// Viewport the grid is laid out in.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::sized(self.viewport.0, self.viewport.1)
    }

    /// Build the battle and perform every placement.
    pub fn build_battle(&self) -> Result<Battle, ScenarioError> {
        let mut battle = Battle::new(self.config, self.viewport(), self.catalog.clone())
            .map_err(CoreError::from)?;
        for placement in &self.placements {
            battle
                .place_unit(&placement.unit, placement.coord())
                .map_err(CoreError::from)?;
        }
        Ok(battle)
    }
}
