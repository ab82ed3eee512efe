//! Placement grid, coordinate transforms and the monster patrol loop.
//!
//! The grid is a dense `width x height` array of [`Cell`]s laid out inside a
//! reserved [`Viewport`]. Row 0 is the bottom row; world `y` grows upward.
//! Cells only hold a [`UnitId`] back-reference, the
//! [`ActorRegistry`](crate::registry::ActorRegistry) owns the units.
//!
//! Geometry (cell size, origin, patrol loop) is computed once in
//! [`Grid::initialize`] and never changes for the lifetime of a match.

use serde::{Deserialize, Serialize};

use crate::config::{GridConfig, Viewport, MAX_GRID_CELLS};
use crate::error::{ConfigurationError, PlacementError};
use crate::math::{Fixed, Vec2Fixed};
use crate::registry::UnitId;

/// Integer cell coordinate, `x` is the column and `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoordinate {
    /// Column index.
    pub x: u32,
    /// Row index, 0 at the bottom.
    pub y: u32,
}

impl GridCoordinate {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Self { x, y })
    }
}

/// Presentation-only highlight state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellVisual {
    /// Not highlighted.
    #[default]
    Idle,
    /// Currently selected by the placement UI.
    Selected,
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    coord: GridCoordinate,
    occupant: Option<UnitId>,
    visual: CellVisual,
}

impl Cell {
    fn new(coord: GridCoordinate) -> Self {
        Self {
            coord,
            occupant: None,
            visual: CellVisual::Idle,
        }
    }

    /// Coordinate of this cell.
    #[must_use]
    pub const fn coord(&self) -> GridCoordinate {
        self.coord
    }

    /// Unit standing on this cell, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<UnitId> {
        self.occupant
    }

    /// True when a unit occupies this cell.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Highlight state.
    #[must_use]
    pub const fn visual(&self) -> CellVisual {
        self.visual
    }
}

/// Closed loop of waypoints with precomputed segment lengths.
///
/// Positions along the loop are addressed by travelled distance. Distances
/// past the loop length wrap, so a monster's lap count and position both
/// derive from one monotonic value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatrolPath {
    waypoints: Vec<Vec2Fixed>,
    /// Distance from the first waypoint to the start of each segment.
    segment_starts: Vec<Fixed>,
    length: Fixed,
}

impl PatrolPath {
    /// Build a closed path through `waypoints`; the last point connects back
    /// to the first.
    #[must_use]
    pub fn new(waypoints: Vec<Vec2Fixed>) -> Self {
        let mut segment_starts = Vec::with_capacity(waypoints.len());
        let mut length = Fixed::ZERO;
        for (index, point) in waypoints.iter().enumerate() {
            segment_starts.push(length);
            let next = waypoints[(index + 1) % waypoints.len()];
            length += point.distance(next);
        }
        Self {
            waypoints,
            segment_starts,
            length,
        }
    }

    /// Waypoints in traversal order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2Fixed] {
        &self.waypoints
    }

    /// Total length of one lap.
    #[must_use]
    pub const fn length(&self) -> Fixed {
        self.length
    }

    /// Number of complete laps covered by `distance`.
    #[must_use]
    pub fn laps_at(&self, distance: Fixed) -> u32 {
        if self.length <= Fixed::ZERO || distance <= Fixed::ZERO {
            return 0;
        }
        (distance / self.length).floor().to_num::<u32>()
    }

    /// Index of the waypoint that starts the segment containing `distance`.
    #[must_use]
    pub fn waypoint_index_at(&self, distance: Fixed) -> usize {
        if self.waypoints.is_empty() {
            return 0;
        }
        let along = self.wrap(distance);
        self.segment_starts
            .partition_point(|start| *start <= along)
            .saturating_sub(1)
    }

    /// World position after travelling `distance` from the first waypoint.
    #[must_use]
    pub fn point_at(&self, distance: Fixed) -> Vec2Fixed {
        let Some(first) = self.waypoints.first() else {
            return Vec2Fixed::ZERO;
        };
        if self.length <= Fixed::ZERO {
            return *first;
        }

        let along = self.wrap(distance);
        let index = self.waypoint_index_at(along);
        let from = self.waypoints[index];
        let to = self.waypoints[(index + 1) % self.waypoints.len()];
        let segment = from.distance(to);
        if segment <= Fixed::ZERO {
            return from;
        }
        from.lerp(to, (along - self.segment_starts[index]) / segment)
    }

    fn wrap(&self, distance: Fixed) -> Fixed {
        if self.length <= Fixed::ZERO || distance <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        let laps = (distance / self.length).floor();
        distance - laps * self.length
    }
}

/// The placement grid.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    cell_size: Fixed,
    origin: Vec2Fixed,
    cells: Vec<Cell>,
    patrol: PatrolPath,
    selected: Option<GridCoordinate>,
}

impl Grid {
    /// Lay out the grid inside `viewport`.
    ///
    /// Cells are square and sized so the whole grid fits the viewport; the
    /// grid is centred along the axis with spare room. The patrol loop is
    /// generated from the config's subdivision and margin.
    pub fn initialize(config: &GridConfig, viewport: Viewport) -> Result<Self, ConfigurationError> {
        if config.width == 0 || config.height == 0 {
            return Err(ConfigurationError::EmptyGrid {
                width: config.width,
                height: config.height,
            });
        }
        let oversized = ConfigurationError::OversizedGrid {
            width: config.width,
            height: config.height,
            max: MAX_GRID_CELLS,
        };
        let cell_count = config
            .width
            .checked_mul(config.height)
            .filter(|&count| count <= MAX_GRID_CELLS)
            .ok_or(oversized)?;
        if viewport.is_degenerate() {
            return Err(ConfigurationError::DegenerateViewport);
        }

        // Both sides are at most MAX_GRID_CELLS here
        let columns = Fixed::from_num(config.width);
        let rows = Fixed::from_num(config.height);
        let cell_size = (viewport.width / columns).min(viewport.height / rows);
        if cell_size <= Fixed::ZERO {
            return Err(ConfigurationError::DegenerateViewport);
        }

        let two = Fixed::from_num(2);
        let origin = Vec2Fixed::new(
            viewport.origin.x + (viewport.width - cell_size * columns) / two,
            viewport.origin.y + (viewport.height - cell_size * rows) / two,
        );

        let mut cells = Vec::with_capacity(cell_count as usize);
        for y in 0..config.height {
            for x in 0..config.width {
                cells.push(Cell::new(GridCoordinate::new(x, y)));
            }
        }

        let mut grid = Self {
            width: config.width,
            height: config.height,
            cell_size,
            origin,
            cells,
            patrol: PatrolPath::new(Vec::new()),
            selected: None,
        };
        let margin = cell_size.saturating_mul(Fixed::saturating_from_num(config.path_margin_percent))
            / Fixed::from_num(100);
        grid.patrol = PatrolPath::new(grid.generate_loop_waypoints(config.points_per_side, margin));
        Ok(grid)
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Side length of one cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> Fixed {
        self.cell_size
    }

    /// World position of the grid's lower-left corner.
    #[must_use]
    pub const fn origin(&self) -> Vec2Fixed {
        self.origin
    }

    /// The patrol loop monsters follow.
    #[must_use]
    pub const fn patrol_path(&self) -> &PatrolPath {
        &self.patrol
    }

    /// True when `coord` lies on the grid.
    #[must_use]
    pub const fn contains(&self, coord: GridCoordinate) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Cell at `coord`.
    #[must_use]
    pub fn cell(&self, coord: GridCoordinate) -> Option<&Cell> {
        self.index(coord).map(|index| &self.cells[index])
    }

    /// All cells, row by row from the bottom.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Map a world point to the cell containing it.
    #[must_use]
    pub fn world_to_grid(&self, point: Vec2Fixed) -> Option<GridCoordinate> {
        let column = ((point.x - self.origin.x) / self.cell_size).floor();
        let row = ((point.y - self.origin.y) / self.cell_size).floor();
        if column < Fixed::ZERO || row < Fixed::ZERO {
            return None;
        }
        let coord = GridCoordinate::new(column.to_num::<u32>(), row.to_num::<u32>());
        self.contains(coord).then_some(coord)
    }

    /// World position of the centre of `coord`.
    ///
    /// Callers pass valid coordinates only; out-of-range input yields a point
    /// outside the grid rather than panicking.
    #[must_use]
    pub fn grid_to_world(&self, coord: GridCoordinate) -> Vec2Fixed {
        let half = self.cell_size / Fixed::from_num(2);
        Vec2Fixed::new(
            self.origin.x + self.cell_size * Fixed::from_num(coord.x) + half,
            self.origin.y + self.cell_size * Fixed::from_num(coord.y) + half,
        )
    }

    /// In-bounds neighbours of `coord`: cardinal first (N, E, S, W), then
    /// diagonals (NE, SE, SW, NW) when requested.
    #[must_use]
    pub fn neighbors(&self, coord: GridCoordinate, include_diagonal: bool) -> Vec<GridCoordinate> {
        const CARDINAL: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
        const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

        let diagonals: &[(i32, i32)] = if include_diagonal { &DIAGONAL } else { &[] };
        CARDINAL
            .iter()
            .chain(diagonals)
            .filter_map(|&(dx, dy)| coord.offset(dx, dy))
            .filter(|candidate| self.contains(*candidate))
            .collect()
    }

    /// True when a unit stands on `coord`. Out-of-bounds cells are never occupied.
    #[must_use]
    pub fn is_occupied(&self, coord: GridCoordinate) -> bool {
        self.cell(coord).is_some_and(Cell::is_occupied)
    }

    /// Check that a unit could be placed on `coord` without mutating anything.
    pub fn check_placeable(&self, coord: GridCoordinate) -> Result<(), PlacementError> {
        match self.cell(coord) {
            None => Err(PlacementError::OutOfBounds(coord)),
            Some(cell) if cell.is_occupied() => Err(PlacementError::AlreadyOccupied(coord)),
            Some(_) => Ok(()),
        }
    }

    /// Record `unit` as the occupant of `coord`.
    pub fn set_occupant(&mut self, coord: GridCoordinate, unit: UnitId) -> Result<(), PlacementError> {
        self.check_placeable(coord)?;
        let index = self.index(coord).ok_or(PlacementError::OutOfBounds(coord))?;
        self.cells[index].occupant = Some(unit);
        Ok(())
    }

    /// Empty `coord`, returning the unit that stood there.
    pub fn clear_occupant(&mut self, coord: GridCoordinate) -> Option<UnitId> {
        let index = self.index(coord)?;
        self.cells[index].occupant.take()
    }

    /// Currently selected cell.
    #[must_use]
    pub const fn selected(&self) -> Option<GridCoordinate> {
        self.selected
    }

    /// Select `coord`, returning the previously selected cell (now deselected).
    pub fn select(&mut self, coord: GridCoordinate) -> Result<Option<GridCoordinate>, PlacementError> {
        let index = self.index(coord).ok_or(PlacementError::OutOfBounds(coord))?;
        let previous = self.deselect();
        self.cells[index].visual = CellVisual::Selected;
        self.selected = Some(coord);
        Ok(previous.filter(|prev| *prev != coord))
    }

    /// Clear the current selection.
    pub fn deselect(&mut self) -> Option<GridCoordinate> {
        let previous = self.selected.take()?;
        if let Some(index) = self.index(previous) {
            self.cells[index].visual = CellVisual::Idle;
        }
        Some(previous)
    }

    /// Waypoints of a rectangle offset `margin` outside the grid bounds.
    ///
    /// Starts at the lower-left corner and runs counter-clockwise
    /// (bottom, right, top, left side) with `points_per_side` evenly spaced
    /// points per side, so the result has `4 * points_per_side` entries and
    /// its last point connects back to the first.
    #[must_use]
    pub fn generate_loop_waypoints(&self, points_per_side: u32, margin: Fixed) -> Vec<Vec2Fixed> {
        let left = self.origin.x - margin;
        let bottom = self.origin.y - margin;
        let right = self.origin.x + self.cell_size * Fixed::from_num(self.width) + margin;
        let top = self.origin.y + self.cell_size * Fixed::from_num(self.height) + margin;

        let corners = [
            Vec2Fixed::new(left, bottom),
            Vec2Fixed::new(right, bottom),
            Vec2Fixed::new(right, top),
            Vec2Fixed::new(left, top),
        ];

        let steps = Fixed::from_num(points_per_side);
        let mut waypoints = Vec::with_capacity(4 * points_per_side as usize);
        for (side, from) in corners.iter().enumerate() {
            let to = corners[(side + 1) % corners.len()];
            for step in 0..points_per_side {
                let step = Fixed::from_num(step);
                waypoints.push(Vec2Fixed::new(
                    from.x + (to.x - from.x) * step / steps,
                    from.y + (to.y - from.y) * step / steps,
                ));
            }
        }
        waypoints
    }

    fn index(&self, coord: GridCoordinate) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        let row = usize::try_from(coord.y).ok()?;
        let column = usize::try_from(coord.x).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }
}
