//! Data structures for unit and monster definitions.
//!
//! Content (names, stats, delivery modes) is supplied from outside the core,
//! keyed by string identifier. All structs deserialize from RON.
//!
//! **Note:** This module contains no IO - it only defines data types and
//! parses strings. Reading files is the host's job.

mod catalog;
mod monster_data;
mod unit_data;

pub use catalog::Catalog;
pub use monster_data::MonsterDefinition;
pub use unit_data::{Rarity, UnitDefinition};
