//! Scenario files loaded from disk.

use std::io::Write;

use td_core::events::EventSink;
use td_core::grid::GridCoordinate;
use td_core::phase::MatchPhase;
use td_headless::{JsonLinesSink, Response, Scenario, ScenarioError, StepRunner};

const OPENING_WAVE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../scenarios/opening_wave.ron");

#[test]
fn opening_wave_loads_and_builds() {
    let scenario = Scenario::load(OPENING_WAVE).expect("load");
    assert_eq!(scenario.name, "Opening wave");
    assert_eq!(scenario.max_laps, Some(3));
    assert!(scenario.catalog.unit("tesla").is_some());

    let battle = scenario.build_battle().expect("battle");
    assert_eq!(battle.registry().unit_count(), 4);
    assert!(battle.grid().is_occupied(GridCoordinate::new(3, 7)));
    assert_eq!(battle.phase(), MatchPhase::Preparation);
}

#[test]
fn opening_wave_plays_to_a_decision() {
    let scenario = Scenario::load(OPENING_WAVE).expect("load");
    let limit = scenario.combat_ticks;
    let sink: Box<dyn EventSink> = Box::new(JsonLinesSink::new(Vec::new()));

    let report = StepRunner::new(scenario).run(vec![sink]).expect("run");
    assert!(report.ticks <= limit);
    assert!(report.attacks > 0);
    assert!(matches!(
        report.final_phase,
        MatchPhase::Victory | MatchPhase::Defeat | MatchPhase::RoundResult
    ));

    let line = Response::Report(report.clone()).to_json_line();
    match serde_json::from_str::<Response>(line.trim_end()).expect("parse") {
        Response::Report(parsed) => assert_eq!(parsed, report),
        other => panic!("expected report, got {other:?}"),
    }
}

#[test]
fn opening_wave_is_deterministic() {
    let scenario = Scenario::load(OPENING_WAVE).expect("load");
    assert!(StepRunner::new(scenario).verify(3).expect("verify"));
}

#[test]
fn scenario_from_temp_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"Scenario(
            name: "temp",
            viewport: (200, 200),
            config: (grid: (width: 2, height: 2)),
            catalog: (
                units: [(id: "archer", name: "archer", damage: 7, attack_interval: 10, range: 1073741824000)],
            ),
            placements: [(unit: "archer", x: 1, y: 1)],
        )"#
    )
    .expect("write");

    let scenario = Scenario::load(file.path()).expect("load");
    let battle = scenario.build_battle().expect("battle");
    assert_eq!(battle.grid().width(), 2);
    assert_eq!(battle.grid().height(), 2);
    assert_eq!(battle.registry().unit_count(), 1);

    // Nothing spawns, so the round is won on the first tick
    let report = StepRunner::new(scenario).run(Vec::new()).expect("run");
    assert_eq!(report.ticks, 1);
    assert_eq!(report.final_phase, MatchPhase::Victory);
}

#[test]
fn out_of_bounds_placement_in_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"Scenario(
            name: "broken",
            catalog: (
                units: [(id: "archer", name: "archer", damage: 7, attack_interval: 10, range: 1073741824000)],
            ),
            placements: [(unit: "archer", x: 9, y: 9)],
        )"#
    )
    .expect("write");

    let scenario = Scenario::load(file.path()).expect("load");
    assert!(matches!(scenario.build_battle(), Err(ScenarioError::Core(_))));
}
