//! Outbound notifications.
//!
//! Collaborators (presentation, wave logic, reward granting) observe the core
//! through [`CoreEvent`]s. Sinks are attached to the [`EventBus`] once, when
//! the match is wired up, and receive every event in publication order.

use serde::{Deserialize, Serialize};

use crate::combat::{DeliveryKind, Hit};
use crate::grid::GridCoordinate;
use crate::phase::MatchPhase;
use crate::registry::{MonsterId, UnitId};

/// Events published by the combat core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum CoreEvent {
    /// A combat tick finished. Fired once per running tick, even when nothing
    /// could attack.
    TickCompleted {
        /// Tick counter value since the scheduler last started.
        tick: u64,
        /// Attacks resolved during the tick.
        attacks: u32,
    },
    /// A unit attacked.
    AttackResolved {
        /// Tick the attack happened on.
        tick: u64,
        /// Attacking unit.
        attacker: UnitId,
        /// Monsters hit, primary target first.
        hits: Vec<Hit>,
        /// Delivery used.
        mode: DeliveryKind,
    },
    /// Damage was applied to a monster.
    MonsterDamaged {
        /// Monster damaged.
        monster: MonsterId,
        /// Damage dealt.
        amount: u32,
        /// Health left afterwards.
        remaining_health: u32,
    },
    /// A monster's health reached zero and it left the active set.
    MonsterKilled {
        /// Monster that died.
        monster: MonsterId,
        /// Unit that landed the final hit.
        killer: UnitId,
    },
    /// The match moved to another phase.
    PhaseChanged {
        /// Previous phase.
        from: MatchPhase,
        /// New phase.
        to: MatchPhase,
    },
    /// A grid cell was selected.
    CellSelected {
        /// Selected cell.
        coord: GridCoordinate,
    },
    /// A grid cell lost its selection.
    CellDeselected {
        /// Previously selected cell.
        coord: GridCoordinate,
    },
}

/// Receiver of core events.
pub trait EventSink: Send {
    /// Handle one event.
    fn publish(&mut self, event: &CoreEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&CoreEvent) + Send,
{
    fn publish(&mut self, event: &CoreEvent) {
        self(event);
    }
}

/// Fan-out of events to every attached sink.
#[derive(Default)]
pub struct EventBus {
    sinks: Vec<Box<dyn EventSink>>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sink. Sinks stay attached for the bus's lifetime.
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Number of attached sinks.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliver `event` to every sink in subscription order.
    pub fn publish(&mut self, event: CoreEvent) {
        tracing::trace!(?event, "Publishing event");
        for sink in &mut self.sinks {
            sink.publish(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_every_sink_receives_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        for label in ["a", "b"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(Box::new(move |event: &CoreEvent| {
                if let CoreEvent::TickCompleted { tick, .. } = event {
                    seen.lock().expect("lock").push((label, *tick));
                }
            }));
        }

        bus.publish(CoreEvent::TickCompleted { tick: 1, attacks: 0 });
        bus.publish(CoreEvent::TickCompleted { tick: 2, attacks: 0 });

        assert_eq!(bus.subscriber_count(), 2);
        assert_eq!(
            *seen.lock().expect("lock"),
            vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]
        );
    }

    #[test]
    fn test_events_serialize_with_tag() {
        let event = CoreEvent::PhaseChanged {
            from: MatchPhase::Preparation,
            to: MatchPhase::Combat,
        };
        let text = ron::to_string(&event).expect("serialize");
        assert!(text.contains("\"PhaseChanged\""));
        assert!(text.contains("Combat"));
    }
}
