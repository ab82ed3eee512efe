//! Error types for the combat core.
//!
//! Every error here is local and recoverable. Per-tick anomalies (a unit
//! without a target, a monster that died earlier in the same tick) are not
//! errors and never surface through these types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::GridCoordinate;
use crate::phase::MatchPhase;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Reasons a placement, removal or actor lookup can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The coordinate lies outside the grid.
    #[error("Coordinate ({}, {}) is out of bounds", .0.x, .0.y)]
    OutOfBounds(GridCoordinate),

    /// Another unit already occupies the cell.
    #[error("Cell ({}, {}) is already occupied", .0.x, .0.y)]
    AlreadyOccupied(GridCoordinate),

    /// No actor exists at the given coordinate or with the given identifier.
    #[error("Actor not found")]
    NotFound,

    /// Units can only be placed or removed while preparing a round.
    #[error("Placement is not allowed during the {0:?} phase")]
    WrongPhase(MatchPhase),

    /// The catalog holds no definition with this identifier.
    #[error("Unknown definition: {0}")]
    UnknownDefinition(String),
}

/// Errors raised while building the grid or loading definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The viewport has zero or negative extent, so cells cannot be sized.
    #[error("Viewport is degenerate: width and height must be positive")]
    DegenerateViewport,

    /// The grid was configured with zero columns or rows.
    #[error("Grid must have at least one column and one row, got {width}x{height}")]
    EmptyGrid {
        /// Configured column count.
        width: u32,
        /// Configured row count.
        height: u32,
    },

    /// The grid has more cells than [`crate::config::MAX_GRID_CELLS`].
    #[error("Grid of {width}x{height} cells exceeds {max} cells")]
    OversizedGrid {
        /// Configured column count.
        width: u32,
        /// Configured row count.
        height: u32,
        /// Cell limit.
        max: u32,
    },

    /// The catalog lists the same identifier twice.
    #[error("Duplicate definition id: {0}")]
    DuplicateDefinition(String),

    /// Definition data failed to parse.
    #[error("Failed to parse definition data: {0}")]
    DataParse(String),
}

/// Errors raised by the match phase state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhaseError {
    /// The match already ended; no further transitions are accepted.
    #[error("Match already ended in {from:?}; cannot enter {to:?}")]
    Terminal {
        /// Terminal phase the match is in.
        from: MatchPhase,
        /// Phase that was requested.
        to: MatchPhase,
    },
}

/// Top-level error type for the combat core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Placement or lookup failure.
    #[error(transparent)]
    Placement(#[from] PlacementError),

    /// Grid or catalog configuration failure.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Phase transition failure.
    #[error(transparent)]
    Phase(#[from] PhaseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_errors_render_coordinates() {
        let err = PlacementError::AlreadyOccupied(GridCoordinate::new(2, 5));
        assert_eq!(err.to_string(), "Cell (2, 5) is already occupied");
    }

    #[test]
    fn core_error_wraps_sources_transparently() {
        let err: CoreError = ConfigurationError::DegenerateViewport.into();
        assert_eq!(
            err.to_string(),
            "Viewport is degenerate: width and height must be positive"
        );
        assert!(matches!(
            CoreError::from(PlacementError::NotFound),
            CoreError::Placement(PlacementError::NotFound)
        ));
    }
}
