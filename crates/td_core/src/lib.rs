//! # TD Core
//!
//! Deterministic combat core for Perimeter Defense.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No wall clock (hosts fire ticks)
//! - No floating-point math (uses fixed-point)
//!
//! Stationary units placed on a grid attack monsters looping the grid's
//! perimeter. A fixed-rate scheduler resolves targeting and damage each tick
//! and publishes events for presentation and wave logic to react to.
//!
//! ## Crate Structure
//!
//! - [`grid`] - Placement grid, coordinate transforms, patrol loop
//! - [`registry`] - Owner of placed units and active monsters
//! - [`combat`] - Target selection and attack resolution
//! - [`scheduler`] - Per-tick combat orchestration
//! - [`phase`] - Match phase state machine
//! - [`battle`] - Composition root wiring the above together
//! - [`data`] - RON-loadable unit and monster definitions
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod battle;
pub mod combat;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod grid;
pub mod math;
pub mod phase;
pub mod registry;
pub mod scheduler;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::battle::Battle;
    pub use crate::combat::{AttackOutcome, DeliveryKind, DeliveryMode, EffectRequest, Hit};
    pub use crate::config::{CoreConfig, GridConfig, Viewport};
    pub use crate::data::{Catalog, MonsterDefinition, Rarity, UnitDefinition};
    pub use crate::error::{ConfigurationError, CoreError, PhaseError, PlacementError, Result};
    pub use crate::events::{CoreEvent, EventBus, EventSink};
    pub use crate::grid::{Grid, GridCoordinate, PatrolPath};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::phase::{MatchPhase, PhaseTransition};
    pub use crate::registry::{ActorRegistry, DamageOutcome, MonsterId, UnitId};
    pub use crate::scheduler::{CombatScheduler, SchedulerHandle, SchedulerState, TickSummary};
}
