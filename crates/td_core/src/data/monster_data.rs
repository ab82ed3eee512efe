//! Monster definitions.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// Data-driven monster definition.
///
/// # Example RON
///
/// ```ron
/// MonsterDefinition(
///     id: "slime",
///     name: "monster.slime.name",
///     health: 10,
///     speed: 429496729600,  // Fixed-point for 100.0 world units per second
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterDefinition {
    /// Unique string identifier.
    pub id: String,

    /// Display name or localization key.
    pub name: String,

    /// Health at spawn.
    pub health: u32,

    /// Travel speed along the patrol loop in world units per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
}

impl MonsterDefinition {
    /// Create a definition whose name matches its id.
    #[must_use]
    pub fn new(id: &str, health: u32, speed: Fixed) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            health,
            speed,
        }
    }
}
