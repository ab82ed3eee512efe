//! Match phase state machine.
//!
//! Phases are changed from outside (by the round orchestrator); the machine
//! only reacts to arrival: entering [`MatchPhase::Combat`] starts the combat
//! scheduler and entering any other phase stops it.

use serde::{Deserialize, Serialize};

use crate::error::PhaseError;
use crate::events::{CoreEvent, EventBus};
use crate::scheduler::CombatScheduler;

/// Stage of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Units may be placed and removed.
    #[default]
    Preparation,
    /// Combat ticks run.
    Combat,
    /// Between rounds.
    RoundResult,
    /// The match was won. Terminal.
    Victory,
    /// The match was lost. Terminal.
    Defeat,
}

impl MatchPhase {
    /// True for phases that end the match.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }

    /// True when units may be placed or removed.
    #[must_use]
    pub const fn allows_placement(self) -> bool {
        matches!(self, Self::Preparation)
    }

    /// True when the combat scheduler should be running.
    #[must_use]
    pub const fn runs_combat(self) -> bool {
        matches!(self, Self::Combat)
    }
}

/// A phase change that took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Phase left.
    pub from: MatchPhase,
    /// Phase entered.
    pub to: MatchPhase,
}

/// Tracks the current phase and drives the scheduler on arrival.
#[derive(Debug, Clone, Default)]
pub struct PhaseMachine {
    current: MatchPhase,
}

impl PhaseMachine {
    /// Start in [`MatchPhase::Preparation`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub const fn current(&self) -> MatchPhase {
        self.current
    }

    /// Move to `next`.
    ///
    /// Requesting the current phase changes nothing and returns `Ok(None)`.
    /// Victory and Defeat cannot be left.
    pub fn change_state(
        &mut self,
        next: MatchPhase,
        scheduler: &mut CombatScheduler,
        bus: &mut EventBus,
    ) -> Result<Option<PhaseTransition>, PhaseError> {
        let from = self.current;
        if from == next {
            tracing::debug!(phase = ?next, "Phase unchanged");
            return Ok(None);
        }
        if from.is_terminal() {
            tracing::warn!(?from, to = ?next, "Rejected transition out of terminal phase");
            return Err(PhaseError::Terminal { from, to: next });
        }

        self.current = next;
        if next.runs_combat() {
            scheduler.start();
        } else {
            scheduler.stop();
        }

        tracing::info!(?from, to = ?next, "Phase changed");
        bus.publish(CoreEvent::PhaseChanged { from, to: next });
        Ok(Some(PhaseTransition { from, to: next }))
    }
}
