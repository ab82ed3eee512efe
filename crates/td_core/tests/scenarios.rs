//! End-to-end match scenarios on the reference 4x8 layout.

use std::time::Duration;

use td_core::battle::Battle;
use td_core::combat::{DeliveryKind, DeliveryMode, Hit};
use td_core::config::{CoreConfig, Viewport};
use td_core::data::{Catalog, UnitDefinition};
use td_core::events::CoreEvent;
use td_core::grid::GridCoordinate;
use td_core::phase::MatchPhase;
use td_core::scheduler::{CombatScheduler, SchedulerState};
use td_test_utils::fixtures::{
    fixed, reference_battle, reference_viewport, slime, step_battle, EventLog,
};

#[test]
fn single_unit_hits_monster_on_perimeter() {
    let (mut battle, log) = reference_battle();
    let unit = battle
        .place_unit("sniper", GridCoordinate::new(0, 0))
        .expect("place");
    let monster = battle.spawn_monster("slime").expect("spawn");
    // Two waypoints along the bottom side
    battle
        .advance_monster_along_path(monster, Duration::from_millis(1300))
        .expect("advance");

    battle.change_state(MatchPhase::Combat).expect("combat");
    log.clear();
    battle.tick().expect("running");

    assert_eq!(
        log.attacks(),
        vec![(
            unit,
            vec![Hit {
                monster,
                damage: 7
            }]
        )]
    );
    assert_eq!(log.ticks_completed(), 1);
}

#[test]
fn seven_damage_kills_ten_health_in_two_attacks() {
    let (mut battle, log) = reference_battle();
    battle
        .place_unit("sniper", GridCoordinate::new(0, 0))
        .expect("place");
    let monster = battle.spawn_monster("slime").expect("spawn");
    battle.change_state(MatchPhase::Combat).expect("combat");

    battle.tick().expect("running");
    battle.tick().expect("running");

    assert_eq!(
        log.damage_reports(),
        vec![(monster, 7, 3), (monster, 7, 0)]
    );
    assert!(battle.registry().all_active_monsters().is_empty());
    assert!(log.events().contains(&CoreEvent::MonsterKilled {
        monster,
        killer: battle.registry().all_placed_units()[0],
    }));

    // Nothing left to attack: ticks keep completing without attacks
    battle.tick().expect("running");
    assert_eq!(log.attacks().len(), 2);
    assert_eq!(log.ticks_completed(), 3);
}

#[test]
fn leaving_combat_before_any_tick_runs_nothing() {
    let (mut battle, log) = reference_battle();
    battle
        .place_unit("sniper", GridCoordinate::new(0, 0))
        .expect("place");
    battle.spawn_monster("slime").expect("spawn");

    battle.change_state(MatchPhase::Combat).expect("combat");
    battle.change_state(MatchPhase::Preparation).expect("preparation");
    assert!(battle.tick().is_none());

    assert_eq!(battle.scheduler().tick_count(), 0);
    assert_eq!(
        log.events(),
        vec![
            CoreEvent::PhaseChanged {
                from: MatchPhase::Preparation,
                to: MatchPhase::Combat,
            },
            CoreEvent::PhaseChanged {
                from: MatchPhase::Combat,
                to: MatchPhase::Preparation,
            },
        ]
    );
}

#[test]
fn stop_twice_is_idempotent() {
    let mut scheduler = CombatScheduler::new();
    scheduler.start();
    assert!(scheduler.stop());
    assert!(!scheduler.stop());
    assert_eq!(scheduler.state(), SchedulerState::Idle);

    let (mut battle, log) = reference_battle();
    battle.change_state(MatchPhase::Combat).expect("combat");
    battle.change_state(MatchPhase::RoundResult).expect("result");
    log.clear();
    assert_eq!(battle.change_state(MatchPhase::RoundResult), Ok(None));
    assert!(log.is_empty());
}

#[test]
fn later_units_still_see_monsters_killed_this_tick() {
    let (mut battle, log) = reference_battle();
    let snipers: Vec<_> = [(0, 0), (3, 7), (1, 4)]
        .into_iter()
        .map(|(x, y)| {
            battle
                .place_unit("sniper", GridCoordinate::new(x, y))
                .expect("place")
        })
        .collect();
    let monster = battle.spawn_monster("slime").expect("spawn");
    battle.change_state(MatchPhase::Combat).expect("combat");

    let summary = battle.tick().expect("running");

    // The second hit kills; the third sniper still targets the snapshot
    // and its damage finds nothing to apply.
    assert_eq!(summary.attacks, 3);
    assert_eq!(summary.kills, 1);
    assert_eq!(summary.skipped, 1);
    let attackers: Vec<_> = log.attacks().into_iter().map(|(unit, _)| unit).collect();
    assert_eq!(attackers, snipers);
    assert_eq!(log.damage_reports(), vec![(monster, 7, 3), (monster, 7, 0)]);
    assert!(battle.registry().all_active_monsters().is_empty());
}

#[test]
fn splash_and_chain_report_their_delivery() {
    let (mut battle, log) = reference_battle();
    battle
        .place_unit("mortar", GridCoordinate::new(0, 0))
        .expect("place");
    battle
        .place_unit("tesla", GridCoordinate::new(0, 1))
        .expect("place");
    for _ in 0..3 {
        battle.spawn_monster("slime").expect("spawn");
    }
    battle.change_state(MatchPhase::Combat).expect("combat");
    battle.tick().expect("running");

    let modes: Vec<_> = log
        .events()
        .into_iter()
        .filter_map(|event| match event {
            CoreEvent::AttackResolved { mode, hits, .. } => Some((mode, hits.len())),
            _ => None,
        })
        .collect();
    // Three monsters stacked at the loop start
    assert_eq!(modes, vec![(DeliveryKind::Splash, 3), (DeliveryKind::Chain, 3)]);
}

#[test]
fn monsters_keep_looping_until_killed() {
    let (mut battle, _log) = reference_battle();
    let monster = battle.spawn_monster("runner").expect("spawn");
    battle.change_state(MatchPhase::Combat).expect("combat");

    // 250 units/s over a 2880-long loop: one lap takes 11.52 s
    for _ in 0..120 {
        step_battle(&mut battle);
    }
    let progress = battle
        .registry()
        .monster(monster)
        .map(|m| m.progress())
        .expect("alive");
    assert!(battle.grid().patrol_path().laps_at(progress) >= 1);
}

fn battle_with(viewport: Viewport, units: Vec<UnitDefinition>) -> (Battle, EventLog) {
    let catalog = Catalog::new(units, vec![slime(10)]).expect("catalog");
    let mut battle = Battle::new(CoreConfig::default(), viewport, catalog).expect("battle");
    let log = EventLog::new();
    battle.subscribe(log.sink());
    (battle, log)
}

#[test]
fn very_long_ranges_still_resolve() {
    let longbow = UnitDefinition::single_target("longbow", 7, 1, fixed(50_000));
    let quake = UnitDefinition::single_target("quake", 12, 1, fixed(50_000)).with_delivery(
        DeliveryMode::Splash {
            radius: fixed(60_000),
            percent: 50,
        },
    );
    let (mut battle, log) = battle_with(reference_viewport(), vec![longbow, quake]);
    battle.place_unit("longbow", GridCoordinate::new(0, 0)).expect("place");
    battle.place_unit("quake", GridCoordinate::new(1, 0)).expect("place");
    battle.spawn_monster("slime").expect("spawn");
    battle.spawn_monster("slime").expect("spawn");
    battle.change_state(MatchPhase::Combat).expect("combat");

    let summary = battle.tick().expect("running");
    assert_eq!(summary.attacks, 2);
    let hits: Vec<usize> = log.attacks().iter().map(|(_, hits)| hits.len()).collect();
    assert_eq!(hits, vec![1, 2]);
}

#[test]
fn huge_viewport_measures_range_exactly() {
    // 50 000-unit cells; the loop starts at (-30 000, -30 000)
    let long = UnitDefinition::single_target("long", 7, 1, fixed(100_000));
    let short = UnitDefinition::single_target("short", 7, 1, fixed(1_000));
    let (mut battle, log) = battle_with(Viewport::sized(200_000, 400_000), vec![long, short]);
    let long_id = battle.place_unit("long", GridCoordinate::new(0, 0)).expect("place");
    battle.place_unit("short", GridCoordinate::new(1, 0)).expect("place");
    let monster = battle.spawn_monster("slime").expect("spawn");
    battle.change_state(MatchPhase::Combat).expect("combat");

    let summary = battle.tick().expect("running");
    assert_eq!(summary.attacks, 1);
    assert_eq!(
        log.attacks(),
        vec![(
            long_id,
            vec![Hit {
                monster,
                damage: 7
            }]
        )]
    );
}
