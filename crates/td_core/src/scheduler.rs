//! Fixed-rate combat scheduler.
//!
//! The scheduler owns no timer. A host fires [`CombatScheduler::tick`] every
//! tick interval (see `td_headless`'s real-time driver) or steps it directly.
//! The running flag is checked once, at the top of each tick, so stopping from
//! inside an event handler takes effect on the next tick and never mid-pass.
//!
//! # Tick order
//!
//! 1. Increment the tick counter and count down unit cooldowns
//! 2. Snapshot units and monsters from the registry
//! 3. Per unit (ascending id): select a target, resolve the attack, apply
//!    damage per hit
//! 4. Publish [`CoreEvent::TickCompleted`]
//!
//! Damage applied during the pass is not visible to targeting later in the
//! same pass. A monster killed earlier in the tick can still be picked; its
//! damage application finds nothing and is skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::combat::{resolve_attack, select_target};
use crate::error::PlacementError;
use crate::events::{CoreEvent, EventBus};
use crate::grid::Grid;
use crate::registry::{ActorRegistry, DamageOutcome};

/// Scheduler run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// Ticks do nothing.
    Idle,
    /// Ticks resolve combat.
    Running,
}

/// Totals for one running tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickSummary {
    /// Tick counter value.
    pub tick: u64,
    /// Attacks resolved.
    pub attacks: u32,
    /// Damage events applied.
    pub hits_applied: u32,
    /// Monsters killed.
    pub kills: u32,
    /// Actor references skipped because they no longer existed.
    pub skipped: u32,
}

/// Cloneable handle for stopping the scheduler from an event handler.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    running: Arc<AtomicBool>,
}

impl SchedulerHandle {
    /// Ask the scheduler to stop. Honoured at the top of the next tick.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// True while the scheduler is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Drives per-tick combat resolution.
#[derive(Debug, Default)]
pub struct CombatScheduler {
    running: Arc<AtomicBool>,
    tick: u64,
}

impl CombatScheduler {
    /// Create an idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// Ticks run since the last [`start`](Self::start). Retained after stop.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Handle sharing this scheduler's running flag.
    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Begin running. Returns false (and warns) if already running.
    pub fn start(&mut self) -> bool {
        if self.running.load(Ordering::SeqCst) {
            tracing::warn!(tick = self.tick, "Combat scheduler already running");
            return false;
        }
        self.tick = 0;
        self.running.store(true, Ordering::SeqCst);
        tracing::info!("Combat scheduler started");
        true
    }

    /// Stop running. Returns false if already idle.
    pub fn stop(&mut self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        tracing::info!(tick = self.tick, "Combat scheduler stopped");
        true
    }

    /// Run one tick. Returns `None` without touching anything when idle.
    pub fn tick(
        &mut self,
        grid: &Grid,
        registry: &mut ActorRegistry,
        bus: &mut EventBus,
    ) -> Option<TickSummary> {
        if !self.running.load(Ordering::SeqCst) {
            return None;
        }

        self.tick += 1;
        let mut summary = TickSummary {
            tick: self.tick,
            ..TickSummary::default()
        };
        registry.tick_cooldowns();

        let units = registry.all_placed_units();
        let monsters = registry.monster_snapshots();

        if units.is_empty() || monsters.is_empty() {
            tracing::trace!(tick = self.tick, "Nothing to resolve");
            bus.publish(CoreEvent::TickCompleted {
                tick: self.tick,
                attacks: 0,
            });
            return Some(summary);
        }

        for unit_id in units {
            let Some(unit) = registry.unit_mut(unit_id) else {
                tracing::debug!(%unit_id, "Unit vanished mid-tick, skipping");
                summary.skipped += 1;
                continue;
            };
            if grid.cell(unit.coord()).and_then(|cell| cell.occupant()) != Some(unit_id) {
                tracing::warn!(%unit_id, "Unit is not on its grid cell, skipping");
                summary.skipped += 1;
                continue;
            }

            let Some(target) = select_target(unit, &monsters) else {
                continue;
            };
            let Some(outcome) = resolve_attack(unit, target, &monsters) else {
                continue;
            };

            summary.attacks += 1;
            bus.publish(CoreEvent::AttackResolved {
                tick: self.tick,
                attacker: outcome.attacker,
                hits: outcome.hits.clone(),
                mode: outcome.kind,
            });

            for hit in &outcome.hits {
                match registry.apply_damage(hit.monster, hit.damage) {
                    Ok(result) => {
                        summary.hits_applied += 1;
                        bus.publish(CoreEvent::MonsterDamaged {
                            monster: hit.monster,
                            amount: hit.damage,
                            remaining_health: result.remaining_health(),
                        });
                        if result == DamageOutcome::Died {
                            summary.kills += 1;
                            bus.publish(CoreEvent::MonsterKilled {
                                monster: hit.monster,
                                killer: outcome.attacker,
                            });
                        }
                    }
                    Err(PlacementError::NotFound) => {
                        tracing::debug!(monster = %hit.monster, "Target already gone, skipping hit");
                        summary.skipped += 1;
                    }
                    Err(err) => {
                        tracing::warn!(monster = %hit.monster, %err, "Damage not applied");
                        summary.skipped += 1;
                    }
                }
            }
        }

        tracing::debug!(
            tick = self.tick,
            attacks = summary.attacks,
            kills = summary.kills,
            "Tick resolved"
        );
        bus.publish(CoreEvent::TickCompleted {
            tick: self.tick,
            attacks: summary.attacks,
        });
        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridConfig, Viewport};
    use crate::data::{MonsterDefinition, UnitDefinition};
    use crate::grid::GridCoordinate;
    use crate::math::Fixed;
    use std::sync::Mutex;

    fn setup() -> (Grid, ActorRegistry, EventBus, Arc<Mutex<Vec<CoreEvent>>>) {
        let grid = Grid::initialize(&GridConfig::default(), Viewport::sized(400, 800)).expect("grid");
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = Arc::clone(&events);
        bus.subscribe(Box::new(move |event: &CoreEvent| {
            sink.lock().expect("lock").push(event.clone());
        }));
        (grid, ActorRegistry::new(), bus, events)
    }

    #[test]
    fn test_idle_tick_does_nothing() {
        let (grid, mut registry, mut bus, events) = setup();
        let mut scheduler = CombatScheduler::new();
        assert!(scheduler.tick(&grid, &mut registry, &mut bus).is_none());
        assert_eq!(scheduler.tick_count(), 0);
        assert!(events.lock().expect("lock").is_empty());
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let mut scheduler = CombatScheduler::new();
        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_empty_tick_still_completes() {
        let (grid, mut registry, mut bus, events) = setup();
        let mut scheduler = CombatScheduler::new();
        scheduler.start();

        let summary = scheduler.tick(&grid, &mut registry, &mut bus).expect("running");
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.attacks, 0);
        assert_eq!(
            *events.lock().expect("lock"),
            vec![CoreEvent::TickCompleted { tick: 1, attacks: 0 }]
        );
    }

    #[test]
    fn test_counter_kept_after_stop_and_reset_on_start() {
        let (grid, mut registry, mut bus, _events) = setup();
        let mut scheduler = CombatScheduler::new();
        scheduler.start();
        scheduler.tick(&grid, &mut registry, &mut bus);
        scheduler.tick(&grid, &mut registry, &mut bus);
        scheduler.stop();
        assert_eq!(scheduler.tick_count(), 2);
        scheduler.start();
        assert_eq!(scheduler.tick_count(), 0);
    }

    #[test]
    fn test_handle_stop_applies_next_tick() {
        let (grid, mut registry, mut bus, _events) = setup();
        let mut scheduler = CombatScheduler::new();
        let handle = scheduler.handle();
        bus.subscribe(Box::new(move |event: &CoreEvent| {
            if matches!(event, CoreEvent::TickCompleted { .. }) {
                handle.request_stop();
            }
        }));

        scheduler.start();
        assert!(scheduler.tick(&grid, &mut registry, &mut bus).is_some());
        assert!(scheduler.tick(&grid, &mut registry, &mut bus).is_none());
        assert_eq!(scheduler.tick_count(), 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_snapshot_keeps_dead_monster_targetable() {
        let (mut grid, mut registry, mut bus, events) = setup();
        let definition = UnitDefinition::single_target("archer", 10, 5, Fixed::from_num(2000));
        let first = registry
            .place_unit(&mut grid, definition.clone(), GridCoordinate::new(0, 0))
            .expect("place");
        let second = registry
            .place_unit(&mut grid, definition, GridCoordinate::new(1, 0))
            .expect("place");
        let monster = registry.spawn_monster(
            MonsterDefinition::new("slime", 10, Fixed::ZERO),
            grid.patrol_path(),
        );

        let mut scheduler = CombatScheduler::new();
        scheduler.start();
        let summary = scheduler.tick(&grid, &mut registry, &mut bus).expect("running");

        assert_eq!(summary.attacks, 2);
        assert_eq!(summary.kills, 1);
        assert_eq!(summary.skipped, 1);
        let events = events.lock().expect("lock");
        let attackers: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                CoreEvent::AttackResolved { attacker, .. } => Some(*attacker),
                _ => None,
            })
            .collect();
        assert_eq!(attackers, vec![first, second]);
        assert!(events.contains(&CoreEvent::MonsterKilled {
            monster,
            killer: first,
        }));
    }
}
