//! Targeting and attack resolution properties.

use std::collections::BTreeSet;

use proptest::prelude::*;
use td_core::combat::{resolve_attack, select_target, DeliveryKind, DeliveryMode};
use td_core::data::UnitDefinition;
use td_core::grid::GridCoordinate;
use td_core::math::{Fixed, Vec2Fixed};
use td_core::registry::{Unit, UnitId};
use td_test_utils::fixtures::fixed;
use td_test_utils::strategies::{arb_delivery_mode, arb_monster_field};

fn unit_at_origin(damage: u32, interval: u32, range: i32, delivery: DeliveryMode) -> Unit {
    Unit::new(
        UnitId::new(0),
        UnitDefinition::single_target("probe", damage, interval, fixed(range)).with_delivery(delivery),
        GridCoordinate::new(0, 0),
        Vec2Fixed::ZERO,
    )
}

proptest! {
    /// A unit that is cooling down never attacks, whatever is in range.
    #[test]
    fn prop_cooldown_gates_attacks(
        monsters in arb_monster_field(12),
        delivery in arb_delivery_mode(),
        remaining in 1u32..50,
    ) {
        let mut unit = unit_at_origin(10, 50, 1000, delivery);
        unit.set_cooldown(remaining);
        if let Some(target) = select_target(&unit, &monsters) {
            prop_assert!(resolve_attack(&mut unit, target, &monsters).is_none());
        }
        prop_assert_eq!(unit.cooldown_remaining(), remaining);
    }

    /// Splash always lands on the primary target first, at full damage.
    #[test]
    fn prop_splash_hits_primary(
        monsters in arb_monster_field(12),
        radius in 0i32..200,
        percent in 0u32..=100,
    ) {
        let delivery = DeliveryMode::Splash { radius: Fixed::from_num(radius), percent };
        let mut unit = unit_at_origin(10, 3, 1000, delivery);
        if let Some(target) = select_target(&unit, &monsters) {
            let outcome = resolve_attack(&mut unit, target, &monsters).expect("ready unit fires");
            prop_assert_eq!(outcome.kind, DeliveryKind::Splash);
            let primary = outcome.primary().expect("primary hit");
            prop_assert_eq!(primary.monster, target);
            prop_assert_eq!(primary.damage, 10);
            prop_assert_eq!(unit.cooldown_remaining(), 3);
        }
    }

    /// Chains never hit a monster twice and never exceed their hop budget.
    #[test]
    fn prop_chain_hits_are_unique(
        monsters in arb_monster_field(16),
        radius in 1i32..400,
        max_hops in 0u32..20,
        decay_percent in 0u32..=150,
    ) {
        let delivery = DeliveryMode::Chain { radius: Fixed::from_num(radius), max_hops, decay_percent };
        let mut unit = unit_at_origin(25, 1, 1000, delivery);
        if let Some(target) = select_target(&unit, &monsters) {
            let outcome = resolve_attack(&mut unit, target, &monsters).expect("ready unit fires");
            let unique: BTreeSet<_> = outcome.hits.iter().map(|hit| hit.monster).collect();
            prop_assert_eq!(unique.len(), outcome.hits.len());
            prop_assert!(outcome.hits.len() <= max_hops as usize + 1);
            prop_assert!(outcome.hits.iter().all(|hit| hit.damage >= 1));
        }
    }

    /// The chosen target is in range and no in-range monster is further along.
    #[test]
    fn prop_target_is_most_advanced_in_range(
        monsters in arb_monster_field(16),
        range in 0i32..500,
    ) {
        let unit = unit_at_origin(1, 1, range, DeliveryMode::Single);
        let range = Fixed::from_num(range);
        let in_range: Vec<_> = monsters
            .iter()
            .filter(|monster| Vec2Fixed::ZERO.within(monster.position, range))
            .collect();

        match select_target(&unit, &monsters) {
            None => prop_assert!(in_range.is_empty()),
            Some(target) => {
                let chosen = in_range
                    .iter()
                    .find(|monster| monster.id == target)
                    .expect("target is in range");
                for other in &in_range {
                    prop_assert!(
                        other.progress < chosen.progress
                            || (other.progress == chosen.progress && other.id >= chosen.id)
                    );
                }
            }
        }
    }
}
