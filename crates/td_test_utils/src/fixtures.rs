//! Test fixtures and helpers.
//!
//! Reference layouts and definitions for consistent testing. The reference
//! grid is 4x8 cells of 100 world units inside a 400x800 viewport, so cell
//! `(x, y)` is centred on `(100x + 50, 100y + 50)` and the patrol loop runs
//! 60 units outside the grid bounds.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use fixed::types::I32F32;
use td_core::battle::Battle;
use td_core::combat::{DeliveryMode, Hit};
use td_core::config::{CoreConfig, Viewport};
use td_core::data::{Catalog, MonsterDefinition, UnitDefinition};
use td_core::events::{CoreEvent, EventSink};
use td_core::grid::Grid;
use td_core::registry::{MonsterId, UnitId};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Viewport the reference grid is laid out in.
#[must_use]
pub fn reference_viewport() -> Viewport {
    Viewport::sized(400, 800)
}

/// The reference 4x8 grid.
///
/// # Panics
///
/// Never for the reference configuration.
#[must_use]
pub fn reference_grid() -> Grid {
    Grid::initialize(&CoreConfig::default().grid, reference_viewport())
        .expect("reference grid is valid")
}

/// Single-target unit reaching every point of the reference patrol loop.
#[must_use]
pub fn sniper(damage: u32) -> UnitDefinition {
    UnitDefinition::single_target("sniper", damage, 1, fixed(2000))
}

/// Short-range single-target unit.
#[must_use]
pub fn archer() -> UnitDefinition {
    UnitDefinition::single_target("archer", 7, 10, fixed(250))
}

/// Splash unit.
#[must_use]
pub fn mortar() -> UnitDefinition {
    UnitDefinition::single_target("mortar", 12, 15, fixed(400)).with_delivery(DeliveryMode::Splash {
        radius: fixed(80),
        percent: 50,
    })
}

/// Chain unit.
#[must_use]
pub fn tesla() -> UnitDefinition {
    UnitDefinition::single_target("tesla", 9, 12, fixed(300)).with_delivery(DeliveryMode::Chain {
        radius: fixed(120),
        max_hops: 3,
        decay_percent: 70,
    })
}

/// Monster with the given health.
#[must_use]
pub fn slime(health: u32) -> MonsterDefinition {
    MonsterDefinition::new("slime", health, fixed(100))
}

/// Fast monster.
#[must_use]
pub fn runner() -> MonsterDefinition {
    MonsterDefinition::new("runner", 6, fixed(250))
}

/// Catalog holding every fixture definition; `sniper` deals 7 damage and
/// `slime` has 10 health.
///
/// # Panics
///
/// Never; fixture identifiers are unique.
#[must_use]
pub fn reference_catalog() -> Catalog {
    Catalog::new(
        vec![sniper(7), archer(), mortar(), tesla()],
        vec![slime(10), runner()],
    )
    .expect("fixture ids are unique")
}

/// A reference battle in preparation, with its events recorded.
///
/// # Panics
///
/// Never for the reference configuration.
#[must_use]
pub fn reference_battle() -> (Battle, EventLog) {
    let mut battle = Battle::new(
        CoreConfig::default(),
        reference_viewport(),
        reference_catalog(),
    )
    .expect("reference battle is valid");
    let log = EventLog::new();
    battle.subscribe(log.sink());
    (battle, log)
}

/// One simulation step: move monsters by one tick interval, then tick.
pub fn step_battle(battle: &mut Battle) {
    let dt: Duration = battle.config().tick_interval();
    battle.advance_monsters(dt);
    battle.tick();
}

/// Shared, cloneable record of published events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<CoreEvent>>>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink appending to this log.
    #[must_use]
    pub fn sink(&self) -> Box<dyn EventSink> {
        Box::new(RecordingSink {
            events: Arc::clone(&self.events),
        })
    }

    /// Copy of every event recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<CoreEvent> {
        self.lock().clone()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of events recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// `(attacker, hits)` of every attack, in order.
    #[must_use]
    pub fn attacks(&self) -> Vec<(UnitId, Vec<Hit>)> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                CoreEvent::AttackResolved { attacker, hits, .. } => Some((*attacker, hits.clone())),
                _ => None,
            })
            .collect()
    }

    /// `(monster, amount, remaining_health)` of every damage report, in order.
    #[must_use]
    pub fn damage_reports(&self) -> Vec<(MonsterId, u32, u32)> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                CoreEvent::MonsterDamaged {
                    monster,
                    amount,
                    remaining_health,
                } => Some((*monster, *amount, *remaining_health)),
                _ => None,
            })
            .collect()
    }

    /// Number of tick-completed events.
    #[must_use]
    pub fn ticks_completed(&self) -> usize {
        self.lock()
            .iter()
            .filter(|event| matches!(event, CoreEvent::TickCompleted { .. }))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CoreEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sink that appends every event to a shared vector.
#[derive(Debug)]
struct RecordingSink {
    events: Arc<Mutex<Vec<CoreEvent>>>,
}

impl EventSink for RecordingSink {
    fn publish(&mut self, event: &CoreEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
