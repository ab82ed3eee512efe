//! Match configuration.
//!
//! All values are plain data so hosts can load them from RON alongside the
//! unit and monster catalog. Defaults reproduce the reference layout: a 4x8
//! grid ticking at 10 Hz.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Default number of grid columns.
pub const DEFAULT_GRID_WIDTH: u32 = 4;

/// Default number of grid rows.
pub const DEFAULT_GRID_HEIGHT: u32 = 8;

/// Default patrol loop subdivision per rectangle side.
pub const DEFAULT_POINTS_PER_SIDE: u32 = 8;

/// Default outward offset of the patrol loop, as a percentage of one cell.
pub const DEFAULT_PATH_MARGIN_PERCENT: u32 = 60;

/// Largest number of cells a grid may have.
pub const MAX_GRID_CELLS: u32 = 1 << 20;

/// Combat ticks per second.
pub const TICK_RATE: u32 = 10;

/// Duration of one combat tick in milliseconds.
pub const TICK_INTERVAL_MS: u64 = 1000 / TICK_RATE as u64;

/// Layout of the placement grid and the patrol loop around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Waypoints generated along each side of the patrol rectangle.
    pub points_per_side: u32,
    /// Distance between the grid bounds and the patrol loop, in percent of a cell.
    pub path_margin_percent: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            points_per_side: DEFAULT_POINTS_PER_SIDE,
            path_margin_percent: DEFAULT_PATH_MARGIN_PERCENT,
        }
    }
}

/// Top-level configuration for a match.
///
/// # Example RON
///
/// ```ron
/// CoreConfig(
///     grid: GridConfig(width: 4, height: 8, points_per_side: 8, path_margin_percent: 60),
///     tick_interval_ms: 100,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Grid layout.
    pub grid: GridConfig,
    /// Wall-clock period between combat ticks.
    pub tick_interval_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            tick_interval_ms: TICK_INTERVAL_MS,
        }
    }
}

impl CoreConfig {
    /// Tick period as a [`Duration`].
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Tick period in seconds, for advancing monsters once per tick.
    #[must_use]
    pub fn tick_seconds(&self) -> Fixed {
        Fixed::from_num(self.tick_interval_ms) / Fixed::from_num(1000)
    }
}

/// Screen region reserved for the grid, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Lower-left corner of the reserved region.
    pub origin: Vec2Fixed,
    /// Width of the reserved region.
    #[serde(with = "fixed_serde")]
    pub width: Fixed,
    /// Height of the reserved region.
    #[serde(with = "fixed_serde")]
    pub height: Fixed,
}

impl Viewport {
    /// Create a viewport anchored at the world origin.
    #[must_use]
    pub fn sized(width: i32, height: i32) -> Self {
        Self {
            origin: Vec2Fixed::ZERO,
            width: Fixed::from_num(width),
            height: Fixed::from_num(height),
        }
    }

    /// True when the region has no usable area.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width <= Fixed::ZERO || self.height <= Fixed::ZERO
    }
}
