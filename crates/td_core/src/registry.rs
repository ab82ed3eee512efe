//! Actor registry: the single owner of placed units and active monsters.
//!
//! Units are keyed by the coordinate they stand on; monsters by identifier.
//! The scheduler reads owned snapshots each tick, so nothing it holds
//! borrows from the registry while damage is being applied.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data::{MonsterDefinition, UnitDefinition};
use crate::error::PlacementError;
use crate::grid::{Grid, GridCoordinate, PatrolPath};
use crate::math::{duration_to_seconds, Fixed, Vec2Fixed};

/// Identifier of a placed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Create a new unit identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Numeric value of the identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Identifier of a spawned monster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonsterId(u32);

impl MonsterId {
    /// Create a new monster identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Numeric value of the identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MonsterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "monster#{}", self.0)
    }
}

/// Health pool of a monster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create a health pool at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if the pool is empty.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }
}

/// A placed unit. Units never move once placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    id: UnitId,
    definition: UnitDefinition,
    coord: GridCoordinate,
    position: Vec2Fixed,
    cooldown: u32,
}

impl Unit {
    /// Build a unit ready to fire on its first tick.
    #[must_use]
    pub fn new(id: UnitId, definition: UnitDefinition, coord: GridCoordinate, position: Vec2Fixed) -> Self {
        Self {
            id,
            definition,
            coord,
            position,
            cooldown: 0,
        }
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Definition the unit was placed from.
    #[must_use]
    pub const fn definition(&self) -> &UnitDefinition {
        &self.definition
    }

    /// Cell the unit stands on.
    #[must_use]
    pub const fn coord(&self) -> GridCoordinate {
        self.coord
    }

    /// World position (centre of its cell).
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Ticks until the unit may fire again.
    #[must_use]
    pub const fn cooldown_remaining(&self) -> u32 {
        self.cooldown
    }

    /// True when the cooldown has elapsed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.cooldown == 0
    }

    /// Count one tick off the cooldown.
    pub fn tick_cooldown(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    /// Restart the cooldown after firing.
    pub fn reset_cooldown(&mut self) {
        self.cooldown = self.definition.attack_interval;
    }

    /// Override the remaining cooldown.
    pub fn set_cooldown(&mut self, ticks: u32) {
        self.cooldown = ticks;
    }
}

/// A monster travelling the patrol loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monster {
    id: MonsterId,
    definition: MonsterDefinition,
    health: Health,
    travelled: Fixed,
    position: Vec2Fixed,
}

impl Monster {
    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> MonsterId {
        self.id
    }

    /// Definition the monster was spawned from.
    #[must_use]
    pub const fn definition(&self) -> &MonsterDefinition {
        &self.definition
    }

    /// Health pool.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// Total distance travelled along the loop since spawning, across laps.
    #[must_use]
    pub const fn progress(&self) -> Fixed {
        self.travelled
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Immutable copy for one tick's resolution pass.
    #[must_use]
    pub fn snapshot(&self) -> MonsterSnapshot {
        MonsterSnapshot {
            id: self.id,
            position: self.position,
            progress: self.travelled,
            health: self.health.current,
        }
    }
}

/// Immutable view of a monster captured at tick start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonsterSnapshot {
    /// Identifier.
    pub id: MonsterId,
    /// World position.
    pub position: Vec2Fixed,
    /// Total distance travelled along the loop.
    pub progress: Fixed,
    /// Health at capture time.
    pub health: u32,
}

/// Result of applying damage to a monster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// The monster survived.
    Damaged {
        /// Health left after the hit.
        remaining_health: u32,
    },
    /// Health reached zero and the monster left the active set.
    Died,
}

impl DamageOutcome {
    /// Health left after the hit (zero on death).
    #[must_use]
    pub const fn remaining_health(self) -> u32 {
        match self {
            Self::Damaged { remaining_health } => remaining_health,
            Self::Died => 0,
        }
    }
}

/// Where a monster ended up after moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonsterMotion {
    /// New world position.
    pub position: Vec2Fixed,
    /// Waypoint starting the segment the monster is on.
    pub waypoint_index: usize,
    /// Complete laps travelled since spawning.
    pub laps: u32,
}

/// Owner of every live unit and monster.
#[derive(Debug, Clone, Default)]
pub struct ActorRegistry {
    units: BTreeMap<UnitId, Unit>,
    units_by_coord: BTreeMap<GridCoordinate, UnitId>,
    monsters: BTreeMap<MonsterId, Monster>,
    next_unit_id: u32,
    next_monster_id: u32,
}

impl ActorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a unit on an empty, in-bounds cell.
    ///
    /// Either both the grid and the registry record the unit or neither does.
    pub fn place_unit(
        &mut self,
        grid: &mut Grid,
        definition: UnitDefinition,
        coord: GridCoordinate,
    ) -> Result<UnitId, PlacementError> {
        grid.check_placeable(coord)?;
        if self.units_by_coord.contains_key(&coord) {
            return Err(PlacementError::AlreadyOccupied(coord));
        }

        let id = UnitId::new(self.next_unit_id);
        grid.set_occupant(coord, id)?;
        self.next_unit_id += 1;

        let unit = Unit::new(id, definition, coord, grid.grid_to_world(coord));
        self.units.insert(id, unit);
        self.units_by_coord.insert(coord, id);
        tracing::debug!(%id, x = coord.x, y = coord.y, "Unit placed");
        Ok(id)
    }

    /// Remove the unit standing on `coord`.
    pub fn remove_unit(&mut self, grid: &mut Grid, coord: GridCoordinate) -> Option<UnitId> {
        let id = self.units_by_coord.remove(&coord)?;
        self.units.remove(&id);
        grid.clear_occupant(coord);
        tracing::debug!(%id, x = coord.x, y = coord.y, "Unit removed");
        Some(id)
    }

    /// Snapshot of placed unit identifiers, ascending.
    #[must_use]
    pub fn all_placed_units(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    /// Snapshot of active monster identifiers, ascending.
    #[must_use]
    pub fn all_active_monsters(&self) -> Vec<MonsterId> {
        self.monsters.keys().copied().collect()
    }

    /// Snapshot of every active monster's targeting-relevant state.
    #[must_use]
    pub fn monster_snapshots(&self) -> Vec<MonsterSnapshot> {
        self.monsters.values().map(Monster::snapshot).collect()
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Look up a unit mutably.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Unit standing on `coord`.
    #[must_use]
    pub fn unit_at(&self, coord: GridCoordinate) -> Option<UnitId> {
        self.units_by_coord.get(&coord).copied()
    }

    /// Look up a monster.
    #[must_use]
    pub fn monster(&self, id: MonsterId) -> Option<&Monster> {
        self.monsters.get(&id)
    }

    /// Number of placed units.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Number of active monsters.
    #[must_use]
    pub fn monster_count(&self) -> usize {
        self.monsters.len()
    }

    /// Advance every unit's cooldown by one tick.
    pub fn tick_cooldowns(&mut self) {
        for unit in self.units.values_mut() {
            unit.tick_cooldown();
        }
    }

    /// Apply `amount` damage to a monster.
    ///
    /// Health floors at zero. A monster that dies is removed from the active
    /// set before this returns.
    pub fn apply_damage(&mut self, id: MonsterId, amount: u32) -> Result<DamageOutcome, PlacementError> {
        let monster = self.monsters.get_mut(&id).ok_or(PlacementError::NotFound)?;
        monster.health.apply_damage(amount);

        if monster.health.is_dead() {
            self.monsters.remove(&id);
            tracing::debug!(%id, "Monster died");
            return Ok(DamageOutcome::Died);
        }

        Ok(DamageOutcome::Damaged {
            remaining_health: monster.health.current,
        })
    }

    /// Spawn a monster at the start of the patrol loop.
    pub fn spawn_monster(&mut self, definition: MonsterDefinition, path: &PatrolPath) -> MonsterId {
        let id = MonsterId::new(self.next_monster_id);
        self.next_monster_id += 1;

        let monster = Monster {
            id,
            health: Health::new(definition.health),
            definition,
            travelled: Fixed::ZERO,
            position: path.point_at(Fixed::ZERO),
        };
        tracing::debug!(%id, monster = %monster.definition.id, "Monster spawned");
        self.monsters.insert(id, monster);
        id
    }

    /// Move a monster along the patrol loop by its speed times `dt`.
    pub fn advance_monster_along_path(
        &mut self,
        id: MonsterId,
        dt: Duration,
        path: &PatrolPath,
    ) -> Result<MonsterMotion, PlacementError> {
        let monster = self.monsters.get_mut(&id).ok_or(PlacementError::NotFound)?;
        let step = monster.definition.speed.saturating_mul(duration_to_seconds(dt));
        Ok(Self::move_monster(monster, monster.travelled.saturating_add(step), path))
    }

    /// Place a monster at an absolute distance along the loop.
    ///
    /// Used by hosts that drive movement themselves and by tests.
    pub fn set_monster_progress(
        &mut self,
        id: MonsterId,
        travelled: Fixed,
        path: &PatrolPath,
    ) -> Result<MonsterMotion, PlacementError> {
        let monster = self.monsters.get_mut(&id).ok_or(PlacementError::NotFound)?;
        Ok(Self::move_monster(monster, travelled.max(Fixed::ZERO), path))
    }

    /// Retire a monster without killing it (e.g. after its lap allowance).
    pub fn despawn_monster(&mut self, id: MonsterId) -> Option<Monster> {
        self.monsters.remove(&id)
    }

    /// Remove every unit and monster, clearing grid occupancy.
    pub fn clear(&mut self, grid: &mut Grid) {
        for coord in self.units_by_coord.keys() {
            grid.clear_occupant(*coord);
        }
        self.units.clear();
        self.units_by_coord.clear();
        self.monsters.clear();
    }

    fn move_monster(monster: &mut Monster, travelled: Fixed, path: &PatrolPath) -> MonsterMotion {
        monster.travelled = travelled;
        monster.position = path.point_at(travelled);
        MonsterMotion {
            position: monster.position,
            waypoint_index: path.waypoint_index_at(travelled),
            laps: path.laps_at(travelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridConfig, Viewport};

    fn grid() -> Grid {
        Grid::initialize(&GridConfig::default(), Viewport::sized(400, 800)).expect("grid")
    }

    fn archer() -> UnitDefinition {
        UnitDefinition::single_target("archer", 7, 3, Fixed::from_num(250))
    }

    fn slime(health: u32) -> MonsterDefinition {
        MonsterDefinition::new("slime", health, Fixed::from_num(100))
    }

    #[test]
    fn test_place_and_remove_unit() {
        let mut grid = grid();
        let mut registry = ActorRegistry::new();
        let coord = GridCoordinate::new(1, 1);

        let id = registry.place_unit(&mut grid, archer(), coord).expect("place");
        assert!(grid.is_occupied(coord));
        assert_eq!(registry.unit_at(coord), Some(id));
        assert_eq!(
            registry.unit(id).map(Unit::position),
            Some(Vec2Fixed::from_ints(150, 150))
        );

        assert_eq!(registry.remove_unit(&mut grid, coord), Some(id));
        assert!(!grid.is_occupied(coord));
        assert_eq!(registry.remove_unit(&mut grid, coord), None);
        assert!(registry.all_placed_units().is_empty());
    }

    #[test]
    fn test_failed_placement_changes_nothing() {
        let mut grid = grid();
        let mut registry = ActorRegistry::new();
        let coord = GridCoordinate::new(0, 0);
        let first = registry.place_unit(&mut grid, archer(), coord).expect("place");

        assert_eq!(
            registry.place_unit(&mut grid, archer(), coord),
            Err(PlacementError::AlreadyOccupied(coord))
        );
        let outside = GridCoordinate::new(9, 9);
        assert_eq!(
            registry.place_unit(&mut grid, archer(), outside),
            Err(PlacementError::OutOfBounds(outside))
        );

        assert_eq!(registry.all_placed_units(), vec![first]);
        assert_eq!(grid.cell(coord).and_then(|c| c.occupant()), Some(first));

        // The failed attempts did not consume identifiers.
        let next = registry
            .place_unit(&mut grid, archer(), GridCoordinate::new(1, 0))
            .expect("place");
        assert_eq!(next, UnitId::new(first.get() + 1));
    }

    #[test]
    fn test_damage_floors_at_zero_and_removes() {
        let grid = grid();
        let mut registry = ActorRegistry::new();
        let id = registry.spawn_monster(slime(10), grid.patrol_path());

        assert_eq!(
            registry.apply_damage(id, 7),
            Ok(DamageOutcome::Damaged { remaining_health: 3 })
        );
        assert_eq!(registry.apply_damage(id, 7), Ok(DamageOutcome::Died));
        assert!(registry.all_active_monsters().is_empty());
        assert_eq!(registry.apply_damage(id, 1), Err(PlacementError::NotFound));
    }

    #[test]
    fn test_monster_advances_along_loop() {
        let grid = grid();
        let path = grid.patrol_path();
        let mut registry = ActorRegistry::new();
        let walker = MonsterDefinition::new("walker", 10, Fixed::from_num(65));
        let id = registry.spawn_monster(walker, path);
        assert_eq!(
            registry.monster(id).map(Monster::position),
            Some(Vec2Fixed::from_ints(-60, -60))
        );

        // 65 units/s for 2 s: two 65-long segments along the bottom side
        let motion = registry
            .advance_monster_along_path(id, Duration::from_secs(2), path)
            .expect("advance");
        assert_eq!(motion.position, Vec2Fixed::from_ints(70, -60));
        assert_eq!(motion.waypoint_index, 2);
        assert_eq!(motion.laps, 0);
        assert_eq!(
            registry.monster(id).map(Monster::progress),
            Some(Fixed::from_num(130))
        );
    }

    #[test]
    fn test_laps_accumulate() {
        let grid = grid();
        let path = grid.patrol_path();
        let mut registry = ActorRegistry::new();
        let id = registry.spawn_monster(slime(10), path);

        let motion = registry
            .set_monster_progress(id, path.length() * Fixed::from_num(2), path)
            .expect("move");
        assert_eq!(motion.laps, 2);
        assert_eq!(motion.position, path.waypoints()[0]);
    }

    #[test]
    fn test_missing_monster_cannot_move() {
        let grid = grid();
        let mut registry = ActorRegistry::new();
        let result = registry.advance_monster_along_path(
            MonsterId::new(42),
            Duration::from_millis(100),
            grid.patrol_path(),
        );
        assert_eq!(result, Err(PlacementError::NotFound));
    }

    #[test]
    fn test_clear_empties_grid() {
        let mut grid = grid();
        let mut registry = ActorRegistry::new();
        let coord = GridCoordinate::new(3, 7);
        registry.place_unit(&mut grid, archer(), coord).expect("place");
        registry.spawn_monster(slime(5), grid.patrol_path());

        registry.clear(&mut grid);
        assert!(!grid.is_occupied(coord));
        assert_eq!(registry.unit_count(), 0);
        assert_eq!(registry.monster_count(), 0);
    }
}
