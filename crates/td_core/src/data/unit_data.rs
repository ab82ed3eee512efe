//! Unit definitions for data-driven placement.

use serde::{Deserialize, Serialize};

use crate::combat::DeliveryMode;
use crate::math::{fixed_serde, Fixed};

/// Rarity tier of a unit definition.
///
/// Carried for the lobby and presentation layers; combat ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Rarity {
    /// Baseline tier.
    #[default]
    Common,
    /// Second tier.
    Rare,
    /// Third tier.
    Epic,
    /// Top tier.
    Legendary,
}

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitDefinition(
///     id: "archer",
///     name: "unit.archer.name",
///     rarity: Common,
///     damage: 7,
///     attack_interval: 10,
///     range: 1073741824000,  // Fixed-point for 250.0
///     delivery: Single,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDefinition {
    /// Unique string identifier.
    pub id: String,

    /// Display name or localization key.
    pub name: String,

    /// Rarity tier.
    #[serde(default)]
    pub rarity: Rarity,

    /// Damage dealt to the primary target per attack.
    pub damage: u32,

    /// Ticks between attacks.
    pub attack_interval: u32,

    /// Attack range in world units, measured from the unit's cell centre.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,

    /// How damage is distributed.
    #[serde(default)]
    pub delivery: DeliveryMode,
}

impl UnitDefinition {
    /// Convenience constructor for a single-target unit.
    #[must_use]
    pub fn single_target(id: &str, damage: u32, attack_interval: u32, range: Fixed) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            rarity: Rarity::Common,
            damage,
            attack_interval,
            range,
            delivery: DeliveryMode::Single,
        }
    }

    /// Builder method to set the delivery mode.
    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_ron() {
        let text = r#"UnitDefinition(
            id: "mage",
            name: "unit.mage.name",
            rarity: Epic,
            damage: 12,
            attack_interval: 15,
            range: 858993459200,
            delivery: Splash(radius: 343597383680, percent: 50),
        )"#;
        let unit: UnitDefinition = ron::from_str(text).expect("parse unit");

        assert_eq!(unit.rarity, Rarity::Epic);
        assert_eq!(unit.range, Fixed::from_num(200));
        assert_eq!(
            unit.delivery,
            DeliveryMode::Splash {
                radius: Fixed::from_num(80),
                percent: 50,
            }
        );
    }

    #[test]
    fn test_defaults_to_common_single_target() {
        let text = r#"(id: "a", name: "a", damage: 1, attack_interval: 1, range: 0)"#;
        let unit: UnitDefinition = ron::from_str(text).expect("parse unit");
        assert_eq!(unit.rarity, Rarity::Common);
        assert_eq!(unit.delivery, DeliveryMode::Single);
    }
}
