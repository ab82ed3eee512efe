//! Match composition root.
//!
//! [`Battle`] owns one match's grid, registry, scheduler, phase machine,
//! catalog and event bus, and exposes the operations collaborators call into
//! the core. Each component receives the others it needs as explicit
//! arguments, so every part can also be driven on its own in tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::config::{CoreConfig, Viewport};
use crate::data::Catalog;
use crate::error::{ConfigurationError, PhaseError, PlacementError};
use crate::events::{CoreEvent, EventBus, EventSink};
use crate::grid::{Grid, GridCoordinate};
use crate::phase::{MatchPhase, PhaseMachine, PhaseTransition};
use crate::registry::{ActorRegistry, MonsterId, MonsterMotion, UnitId};
use crate::scheduler::{CombatScheduler, SchedulerHandle, TickSummary};

/// One match of the combat core.
#[derive(Debug)]
pub struct Battle {
    config: CoreConfig,
    grid: Grid,
    registry: ActorRegistry,
    scheduler: CombatScheduler,
    phase: PhaseMachine,
    catalog: Catalog,
    bus: EventBus,
}

impl Battle {
    /// Lay out the grid and start in [`MatchPhase::Preparation`].
    pub fn new(
        config: CoreConfig,
        viewport: Viewport,
        catalog: Catalog,
    ) -> Result<Self, ConfigurationError> {
        let grid = Grid::initialize(&config.grid, viewport)?;
        tracing::info!(
            width = grid.width(),
            height = grid.height(),
            units = catalog.units().count(),
            monsters = catalog.monsters().count(),
            "Battle created"
        );
        Ok(Self {
            config,
            grid,
            registry: ActorRegistry::new(),
            scheduler: CombatScheduler::new(),
            phase: PhaseMachine::new(),
            catalog,
            bus: EventBus::new(),
        })
    }

    /// Attach an event sink. Call while wiring the match, before ticking.
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.bus.subscribe(sink);
    }

    /// Configuration the match was built with.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// The placement grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Live units and monsters.
    #[must_use]
    pub const fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    /// The combat scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &CombatScheduler {
        &self.scheduler
    }

    /// Handle for stopping combat from an event sink.
    #[must_use]
    pub fn scheduler_handle(&self) -> SchedulerHandle {
        self.scheduler.handle()
    }

    /// Definitions available to this match.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> MatchPhase {
        self.phase.current()
    }

    /// Place a unit from the catalog. Only allowed during preparation.
    pub fn place_unit(
        &mut self,
        definition_id: &str,
        coord: GridCoordinate,
    ) -> Result<UnitId, PlacementError> {
        self.ensure_placement_phase()?;
        let definition = self
            .catalog
            .unit(definition_id)
            .cloned()
            .ok_or_else(|| PlacementError::UnknownDefinition(definition_id.to_string()))?;
        self.registry.place_unit(&mut self.grid, definition, coord)
    }

    /// Remove the unit on `coord`. Only allowed during preparation.
    pub fn remove_unit(&mut self, coord: GridCoordinate) -> Result<UnitId, PlacementError> {
        self.ensure_placement_phase()?;
        self.registry
            .remove_unit(&mut self.grid, coord)
            .ok_or(PlacementError::NotFound)
    }

    /// Move the match to `next`, starting or stopping combat.
    pub fn change_state(
        &mut self,
        next: MatchPhase,
    ) -> Result<Option<PhaseTransition>, PhaseError> {
        self.phase
            .change_state(next, &mut self.scheduler, &mut self.bus)
    }

    /// Spawn a monster from the catalog at the start of the patrol loop.
    pub fn spawn_monster(&mut self, definition_id: &str) -> Result<MonsterId, PlacementError> {
        let definition = self
            .catalog
            .monster(definition_id)
            .cloned()
            .ok_or_else(|| PlacementError::UnknownDefinition(definition_id.to_string()))?;
        Ok(self
            .registry
            .spawn_monster(definition, self.grid.patrol_path()))
    }

    /// Move one monster along the patrol loop.
    pub fn advance_monster_along_path(
        &mut self,
        monster: MonsterId,
        dt: Duration,
    ) -> Result<MonsterMotion, PlacementError> {
        self.registry
            .advance_monster_along_path(monster, dt, self.grid.patrol_path())
    }

    /// Move every active monster by `dt`.
    pub fn advance_monsters(&mut self, dt: Duration) {
        for id in self.registry.all_active_monsters() {
            if let Err(err) = self.advance_monster_along_path(id, dt) {
                tracing::debug!(monster = %id, %err, "Monster not advanced");
            }
        }
    }

    /// Retire a monster without killing it.
    pub fn despawn_monster(&mut self, monster: MonsterId) -> Result<(), PlacementError> {
        self.registry
            .despawn_monster(monster)
            .map(|_| ())
            .ok_or(PlacementError::NotFound)
    }

    /// Select a cell for the placement UI.
    pub fn select_cell(&mut self, coord: GridCoordinate) -> Result<(), PlacementError> {
        if self.grid.selected() == Some(coord) {
            return Ok(());
        }
        if let Some(previous) = self.grid.select(coord)? {
            self.bus.publish(CoreEvent::CellDeselected { coord: previous });
        }
        self.bus.publish(CoreEvent::CellSelected { coord });
        Ok(())
    }

    /// Clear the current selection, if any.
    pub fn deselect_cell(&mut self) -> Option<GridCoordinate> {
        let previous = self.grid.deselect()?;
        self.bus.publish(CoreEvent::CellDeselected { coord: previous });
        Some(previous)
    }

    /// Run one combat tick. `None` unless combat is running.
    pub fn tick(&mut self) -> Option<TickSummary> {
        self.scheduler
            .tick(&self.grid, &mut self.registry, &mut self.bus)
    }

    /// Remove every unit and monster (match teardown).
    pub fn clear_actors(&mut self) {
        self.registry.clear(&mut self.grid);
    }

    /// Hash of all simulation-relevant state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.phase.current().hash(&mut hasher);
        self.scheduler.tick_count().hash(&mut hasher);

        let units = self.registry.all_placed_units();
        units.len().hash(&mut hasher);
        for id in units {
            if let Some(unit) = self.registry.unit(id) {
                id.hash(&mut hasher);
                unit.coord().hash(&mut hasher);
                unit.cooldown_remaining().hash(&mut hasher);
            }
        }

        let monsters = self.registry.monster_snapshots();
        monsters.len().hash(&mut hasher);
        for monster in monsters {
            monster.id.hash(&mut hasher);
            monster.health.hash(&mut hasher);
            monster.progress.to_bits().hash(&mut hasher);
            monster.position.x.to_bits().hash(&mut hasher);
            monster.position.y.to_bits().hash(&mut hasher);
        }

        hasher.finish()
    }

    fn ensure_placement_phase(&self) -> Result<(), PlacementError> {
        let phase = self.phase.current();
        if phase.allows_placement() {
            Ok(())
        } else {
            Err(PlacementError::WrongPhase(phase))
        }
    }
}
