//! Targeting and attack resolution.
//!
//! Units pick a target from the monster snapshot taken at the start of the
//! tick and, when their cooldown has elapsed, resolve one attack whose damage
//! is distributed according to the unit's [`DeliveryMode`]:
//!
//! - **Single**: the target only
//! - **Splash**: the target, plus a percentage of damage to every other
//!   monster near it
//! - **Chain**: the target, then hops to the nearest monster not yet hit,
//!   decaying damage per hop
//!
//! Scaled damage floors to an integer but never drops below [`MIN_DAMAGE`]
//! while the base damage is positive.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::registry::{MonsterId, MonsterSnapshot, Unit, UnitId};

/// Minimum damage floor - scaled hits always deal at least 1 damage when the
/// base damage is positive.
pub const MIN_DAMAGE: u32 = 1;

/// How a unit's damage is distributed among monsters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// Damage the target only.
    #[default]
    Single,
    /// Damage the target and everything around it.
    Splash {
        /// Radius around the target's position.
        #[serde(with = "fixed_serde")]
        radius: Fixed,
        /// Share of the base damage dealt to secondary targets (0-100).
        percent: u32,
    },
    /// Damage the target, then jump between nearby monsters.
    Chain {
        /// Maximum jump distance from the last monster hit.
        #[serde(with = "fixed_serde")]
        radius: Fixed,
        /// Additional monsters hit after the target.
        max_hops: u32,
        /// Damage kept on each hop, in percent of the previous hop.
        decay_percent: u32,
    },
}

impl DeliveryMode {
    /// Kind tag reported in attack events.
    #[must_use]
    pub const fn kind(&self) -> DeliveryKind {
        match self {
            Self::Single => DeliveryKind::Single,
            Self::Splash { .. } => DeliveryKind::Splash,
            Self::Chain { .. } => DeliveryKind::Chain,
        }
    }
}

/// Payload-free delivery tag carried by events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryKind {
    /// Single-target attack.
    Single,
    /// Splash attack.
    Splash,
    /// Chain attack.
    Chain,
}

impl DeliveryKind {
    /// Visual effect the presentation layer should request for this kind.
    #[must_use]
    pub const fn effect(self) -> EffectRequest {
        match self {
            Self::Single => EffectRequest::Missile,
            Self::Splash => EffectRequest::Splash,
            Self::Chain => EffectRequest::ChainSequence,
        }
    }
}

/// Fire-and-forget effect request for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectRequest {
    /// Projectile from attacker to target.
    Missile,
    /// Area burst centred on the target.
    Splash,
    /// Sequential arcs following the hit order.
    ChainSequence,
}

/// Damage dealt to one monster by one attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hit {
    /// Monster hit.
    pub monster: MonsterId,
    /// Damage before health flooring.
    pub damage: u32,
}

/// Everything one attack did, primary target first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Unit that attacked.
    pub attacker: UnitId,
    /// Monsters hit, in application order.
    pub hits: Vec<Hit>,
    /// How damage was distributed.
    pub kind: DeliveryKind,
}

impl AttackOutcome {
    /// The primary target's hit.
    #[must_use]
    pub fn primary(&self) -> Option<&Hit> {
        self.hits.first()
    }

    /// Sum of damage across all hits.
    #[must_use]
    pub fn total_damage(&self) -> u64 {
        self.hits.iter().map(|hit| u64::from(hit.damage)).sum()
    }
}

/// Scale `base` by `percent`, rounding down, with the [`MIN_DAMAGE`] floor.
#[must_use]
pub fn scale_damage(base: u32, percent: u32) -> u32 {
    if base == 0 {
        return 0;
    }
    let scaled = u64::from(base) * u64::from(percent) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX).max(MIN_DAMAGE)
}

/// Pick the monster `unit` should attack.
///
/// Only monsters within the unit's range (inclusive) qualify. Among them the
/// most advanced along the patrol loop wins, with the lowest identifier
/// breaking exact ties.
#[must_use]
pub fn select_target(unit: &Unit, monsters: &[MonsterSnapshot]) -> Option<MonsterId> {
    let origin = unit.position();
    let range = unit.definition().range;

    monsters
        .iter()
        .filter(|monster| origin.within(monster.position, range))
        .max_by(|a, b| a.progress.cmp(&b.progress).then_with(|| b.id.cmp(&a.id)))
        .map(|monster| monster.id)
}

/// Resolve `unit`'s attack on `target`.
///
/// Returns `None` while the unit is cooling down or when `target` is not in
/// the snapshot. On fire the cooldown restarts at the unit's attack interval.
pub fn resolve_attack(
    unit: &mut Unit,
    target: MonsterId,
    monsters: &[MonsterSnapshot],
) -> Option<AttackOutcome> {
    if !unit.is_ready() {
        return None;
    }
    let primary = monsters.iter().find(|monster| monster.id == target)?;

    unit.reset_cooldown();
    let definition = unit.definition();
    let damage = definition.damage;

    let mut hits = vec![Hit {
        monster: primary.id,
        damage,
    }];

    match definition.delivery {
        DeliveryMode::Single => {}
        DeliveryMode::Splash { radius, percent } => {
            let splash = scale_damage(damage, percent);
            hits.extend(
                monsters
                    .iter()
                    .filter(|monster| monster.id != primary.id)
                    .filter(|monster| primary.position.within(monster.position, radius))
                    .map(|monster| Hit {
                        monster: monster.id,
                        damage: splash,
                    }),
            );
        }
        DeliveryMode::Chain {
            radius,
            max_hops,
            decay_percent,
        } => {
            let mut last = primary.position;
            let mut hop_damage = damage;
            for _ in 0..max_hops {
                let Some(next) = nearest_unhit(last, radius, monsters, &hits) else {
                    break;
                };
                hop_damage = scale_damage(hop_damage, decay_percent);
                hits.push(Hit {
                    monster: next.id,
                    damage: hop_damage,
                });
                last = next.position;
            }
        }
    }

    Some(AttackOutcome {
        attacker: unit.id(),
        hits,
        kind: definition.delivery.kind(),
    })
}

fn nearest_unhit<'a>(
    from: Vec2Fixed,
    radius: Fixed,
    monsters: &'a [MonsterSnapshot],
    hits: &[Hit],
) -> Option<&'a MonsterSnapshot> {
    monsters
        .iter()
        .filter(|monster| hits.iter().all(|hit| hit.monster != monster.id))
        .filter(|monster| from.within(monster.position, radius))
        .min_by(|a, b| {
            from.distance_squared(a.position)
                .cmp(&from.distance_squared(b.position))
                .then_with(|| a.id.cmp(&b.id))
        })
}
