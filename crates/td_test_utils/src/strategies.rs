//! Proptest strategies for the combat core.
//!
//! These strategies generate random but reproducible inputs for
//! property-based testing of grid geometry, placement and attack resolution.

use proptest::prelude::*;
use td_core::combat::DeliveryMode;
use td_core::grid::GridCoordinate;
use td_core::math::{Fixed, Vec2Fixed};
use td_core::registry::{MonsterId, MonsterSnapshot};

/// Generate a coordinate inside a `width x height` grid.
pub fn arb_coordinate_in(width: u32, height: u32) -> impl Strategy<Value = GridCoordinate> {
    (0..width, 0..height).prop_map(|(x, y)| GridCoordinate::new(x, y))
}

/// Generate a coordinate that may fall up to `slack` cells outside the grid.
pub fn arb_coordinate_near(
    width: u32,
    height: u32,
    slack: u32,
) -> impl Strategy<Value = GridCoordinate> {
    (0..width + slack, 0..height + slack).prop_map(|(x, y)| GridCoordinate::new(x, y))
}

/// Generate a sequence of placement attempts, duplicates included.
pub fn arb_placement_sequence(
    width: u32,
    height: u32,
    max_len: usize,
) -> impl Strategy<Value = Vec<GridCoordinate>> {
    prop::collection::vec(arb_coordinate_near(width, height, 2), 0..max_len)
}

/// Generate a world position within `extent` of the origin on both axes.
pub fn arb_position(extent: i32) -> impl Strategy<Value = Vec2Fixed> {
    (-extent..=extent, -extent..=extent).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
}

/// Generate any delivery mode with sensible parameters.
pub fn arb_delivery_mode() -> impl Strategy<Value = DeliveryMode> {
    prop_oneof![
        Just(DeliveryMode::Single),
        (1i32..300, 0u32..=100).prop_map(|(radius, percent)| DeliveryMode::Splash {
            radius: Fixed::from_num(radius),
            percent,
        }),
        (1i32..300, 0u32..8, 0u32..=100).prop_map(|(radius, max_hops, decay_percent)| {
            DeliveryMode::Chain {
                radius: Fixed::from_num(radius),
                max_hops,
                decay_percent,
            }
        }),
    ]
}

/// Generate a field of monsters with unique ids, scattered around the origin.
pub fn arb_monster_field(max_len: usize) -> impl Strategy<Value = Vec<MonsterSnapshot>> {
    prop::collection::vec((arb_position(400), 0i32..3000, 1u32..100), 0..max_len).prop_map(
        |entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(index, (position, progress, health))| MonsterSnapshot {
                    id: MonsterId::new(u32::try_from(index).unwrap_or(u32::MAX)),
                    position,
                    progress: Fixed::from_num(progress),
                    health,
                })
                .collect()
        },
    )
}
