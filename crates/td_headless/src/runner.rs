//! Scenario playback.
//!
//! [`MatchLoop`] is one match in progress: the battle plus the wave schedule
//! and the lap policy that surround it. [`StepRunner`] drives it as fast as
//! possible; the real-time driver drives the same loop on a wall-clock timer.

use serde::{Deserialize, Serialize};

use td_core::battle::Battle;
use td_core::events::EventSink;
use td_core::phase::MatchPhase;
use td_core::registry::MonsterId;

use crate::scenario::{Scenario, ScenarioError, SpawnEntry};

/// Spawn schedule consumed in tick order.
#[derive(Debug, Clone)]
pub struct WaveSchedule {
    entries: Vec<SpawnEntry>,
    next: usize,
}

impl WaveSchedule {
    /// Order `entries` by tick, keeping file order within a tick.
    #[must_use]
    pub fn new(mut entries: Vec<SpawnEntry>) -> Self {
        entries.sort_by_key(|entry| entry.at_tick);
        Self { entries, next: 0 }
    }

    /// Spawn everything scheduled at or before `tick`.
    pub fn spawn_due(&mut self, battle: &mut Battle, tick: u64) -> Vec<MonsterId> {
        let mut spawned = Vec::new();
        while let Some(entry) = self.entries.get(self.next) {
            if entry.at_tick > tick {
                break;
            }
            for _ in 0..entry.count {
                match battle.spawn_monster(&entry.monster) {
                    Ok(id) => spawned.push(id),
                    Err(err) => tracing::warn!(monster = %entry.monster, %err, "Spawn skipped"),
                }
            }
            self.next += 1;
        }
        spawned
    }

    /// True once every entry has been spawned.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.next >= self.entries.len()
    }
}

/// Despawn every monster that has completed `max_laps` laps.
pub fn retire_lapped(battle: &mut Battle, max_laps: u32) -> Vec<MonsterId> {
    let path = battle.grid().patrol_path();
    let escaped: Vec<MonsterId> = battle
        .registry()
        .monster_snapshots()
        .iter()
        .filter(|monster| path.laps_at(monster.progress) >= max_laps)
        .map(|monster| monster.id)
        .collect();

    for id in &escaped {
        if battle.despawn_monster(*id).is_ok() {
            tracing::debug!(monster = %id, max_laps, "Monster escaped");
        }
    }
    escaped
}

/// Whether a match should keep stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// More ticks to run.
    Continue,
    /// The round is decided.
    Finished,
}

/// Summary of a finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Scenario name.
    pub scenario: String,
    /// Combat ticks stepped.
    pub ticks: u64,
    /// Attacks resolved.
    pub attacks: u64,
    /// Monsters killed.
    pub kills: u64,
    /// Monsters that escaped after their lap allowance.
    pub leaked: u64,
    /// Monsters still on the loop at the end.
    pub remaining_monsters: usize,
    /// Phase the match ended in.
    pub final_phase: MatchPhase,
    /// Final state hash.
    pub state_hash: u64,
}

/// One match in progress.
#[derive(Debug)]
pub struct MatchLoop {
    name: String,
    battle: Battle,
    waves: WaveSchedule,
    combat_ticks: u64,
    max_laps: Option<u32>,
    max_leaks: u32,
    elapsed: u64,
    attacks: u64,
    kills: u64,
    leaked: u64,
}

impl MatchLoop {
    /// Build the scenario's battle, attach `sinks` and enter combat.
    pub fn new(scenario: &Scenario, sinks: Vec<Box<dyn EventSink>>) -> Result<Self, ScenarioError> {
        let mut battle = scenario.build_battle()?;
        for sink in sinks {
            battle.subscribe(sink);
        }
        battle
            .change_state(MatchPhase::Combat)
            .map_err(td_core::error::CoreError::from)?;

        tracing::info!(
            scenario = %scenario.name,
            units = battle.registry().unit_count(),
            spawns = scenario.spawns.len(),
            "Match started"
        );
        Ok(Self {
            name: scenario.name.clone(),
            battle,
            waves: WaveSchedule::new(scenario.spawns.clone()),
            combat_ticks: scenario.combat_ticks,
            max_laps: scenario.max_laps,
            max_leaks: scenario.max_leaks,
            elapsed: 0,
            attacks: 0,
            kills: 0,
            leaked: 0,
        })
    }

    /// The battle being played.
    #[must_use]
    pub const fn battle(&self) -> &Battle {
        &self.battle
    }

    /// Mutable access for command handling between steps.
    pub fn battle_mut(&mut self) -> &mut Battle {
        &mut self.battle
    }

    /// Combat ticks stepped so far.
    #[must_use]
    pub const fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Advance one tick: spawn, move, retire escapees, resolve combat.
    ///
    /// Outside combat the match is paused and nothing happens.
    pub fn step(&mut self) -> StepStatus {
        if self.battle.phase().is_terminal() {
            return StepStatus::Finished;
        }
        if !self.battle.phase().runs_combat() {
            return StepStatus::Continue;
        }

        self.elapsed += 1;
        self.waves.spawn_due(&mut self.battle, self.elapsed);
        let dt = self.battle.config().tick_interval();
        self.battle.advance_monsters(dt);
        if let Some(max_laps) = self.max_laps {
            self.leaked += retire_lapped(&mut self.battle, max_laps).len() as u64;
        }
        if let Some(summary) = self.battle.tick() {
            self.attacks += u64::from(summary.attacks);
            self.kills += u64::from(summary.kills);
        }

        let cleared = self.waves.is_exhausted() && self.battle.registry().monster_count() == 0;
        if cleared || self.elapsed >= self.combat_ticks || self.leaked > u64::from(self.max_leaks) {
            StepStatus::Finished
        } else {
            StepStatus::Continue
        }
    }

    /// Phase the round ends in under the scenario's policy.
    #[must_use]
    pub fn outcome(&self) -> MatchPhase {
        if self.leaked > u64::from(self.max_leaks) {
            MatchPhase::Defeat
        } else if self.waves.is_exhausted() && self.battle.registry().monster_count() == 0 {
            MatchPhase::Victory
        } else {
            MatchPhase::RoundResult
        }
    }

    /// Enter the outcome phase and summarize.
    pub fn finish(mut self) -> RunReport {
        let outcome = self.outcome();
        if let Err(err) = self.battle.change_state(outcome) {
            tracing::warn!(%err, "Match already ended");
        }
        let report = RunReport {
            scenario: self.name,
            ticks: self.elapsed,
            attacks: self.attacks,
            kills: self.kills,
            leaked: self.leaked,
            remaining_monsters: self.battle.registry().monster_count(),
            final_phase: self.battle.phase(),
            state_hash: self.battle.state_hash(),
        };
        tracing::info!(
            ticks = report.ticks,
            kills = report.kills,
            leaked = report.leaked,
            phase = ?report.final_phase,
            "Match finished"
        );
        report
    }
}

/// Runs a scenario tick by tick without waiting on the wall clock.
#[derive(Debug, Clone)]
pub struct StepRunner {
    scenario: Scenario,
}

impl StepRunner {
    /// Create a runner for `scenario`.
    #[must_use]
    pub fn new(scenario: Scenario) -> Self {
        Self { scenario }
    }

    /// Play the scenario to the end.
    pub fn run(&self, sinks: Vec<Box<dyn EventSink>>) -> Result<RunReport, ScenarioError> {
        let mut game = MatchLoop::new(&self.scenario, sinks)?;
        while game.step() == StepStatus::Continue {}
        Ok(game.finish())
    }

    /// Play the scenario `runs` times and check every run ends identically.
    ///
    /// At least two runs are required.
    pub fn verify(&self, runs: usize) -> Result<bool, ScenarioError> {
        if runs < 2 {
            return Err(ScenarioError::TooFewRuns(runs));
        }
        let mut hashes = Vec::with_capacity(runs);
        for _ in 0..runs {
            hashes.push(self.run(Vec::new())?.state_hash);
        }
        Ok(hashes.windows(2).all(|w| w[0] == w[1]))
    }
}
