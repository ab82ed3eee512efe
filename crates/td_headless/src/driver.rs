//! Wall-clock driver.
//!
//! Ticks a [`MatchLoop`] on a tokio interval. Commands arrive on an mpsc
//! channel and are applied between ticks, so a tick never observes a
//! half-applied command.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::{interval, MissedTickBehavior};

use td_core::grid::GridCoordinate;

use crate::protocol::{DriverCommand, Response};
use crate::runner::{MatchLoop, RunReport, StepStatus};

/// Commands buffered before senders wait.
pub const COMMAND_BUFFER: usize = 64;

/// Create the command channel for a [`RealtimeDriver`].
#[must_use]
pub fn command_channel() -> (mpsc::Sender<DriverCommand>, mpsc::Receiver<DriverCommand>) {
    mpsc::channel(COMMAND_BUFFER)
}

/// Apply one command to the match and describe the result.
pub fn handle_command(game: &mut MatchLoop, command: DriverCommand) -> Response {
    let name = command.name();
    let battle = game.battle_mut();
    let result = match command {
        DriverCommand::PlaceUnit { unit, x, y } => battle
            .place_unit(&unit, GridCoordinate::new(x, y))
            .map(|id| Response::Placed {
                unit_id: id.get(),
                x,
                y,
            })
            .map_err(|err| err.to_string()),
        DriverCommand::RemoveUnit { x, y } => battle
            .remove_unit(GridCoordinate::new(x, y))
            .map(|_| Response::ack(name))
            .map_err(|err| err.to_string()),
        DriverCommand::SpawnMonster { monster } => battle
            .spawn_monster(&monster)
            .map(|id| Response::Spawned {
                monster_id: id.get(),
            })
            .map_err(|err| err.to_string()),
        DriverCommand::ChangeState { phase } => battle
            .change_state(phase)
            .map(|_| Response::ack(name))
            .map_err(|err| err.to_string()),
        DriverCommand::SelectCell { x, y } => battle
            .select_cell(GridCoordinate::new(x, y))
            .map(|()| Response::ack(name))
            .map_err(|err| err.to_string()),
        DriverCommand::DeselectCell => {
            battle.deselect_cell();
            Ok(Response::ack(name))
        }
        DriverCommand::Query => Ok(Response::State {
            tick: battle.scheduler().tick_count(),
            phase: battle.phase(),
            units: battle.registry().unit_count(),
            monsters: battle.registry().monster_count(),
            selected: battle.grid().selected(),
        }),
        DriverCommand::Quit => Ok(Response::ack(name)),
    };

    result.unwrap_or_else(|message| {
        tracing::debug!(cmd = name, %message, "Command rejected");
        Response::error(message, Some(name))
    })
}

/// Runs a match against the wall clock.
#[derive(Debug)]
pub struct RealtimeDriver {
    game: MatchLoop,
    commands: mpsc::Receiver<DriverCommand>,
}

impl RealtimeDriver {
    /// Drive `game`, taking commands from `commands`.
    pub fn new(game: MatchLoop, commands: mpsc::Receiver<DriverCommand>) -> Self {
        Self { game, commands }
    }

    /// Tick until the round ends or a quit command arrives.
    ///
    /// Every command gets exactly one [`Response`] through `reply`. Once
    /// every sender is gone the match keeps ticking, unless it is paused
    /// outside combat, in which case it ends immediately.
    pub async fn run<F>(mut self, mut reply: F) -> RunReport
    where
        F: FnMut(Response),
    {
        // interval() rejects a zero period
        let period = self.game.battle().config().tick_interval().max(Duration::from_millis(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut connected = true;

        tracing::info!(period_ms = period.as_millis() as u64, "Real-time driver started");
        loop {
            ticker.tick().await;

            while connected {
                match self.commands.try_recv() {
                    Ok(DriverCommand::Quit) => {
                        reply(Response::ack("quit"));
                        tracing::info!(tick = self.game.elapsed(), "Quit requested");
                        return self.game.finish();
                    }
                    Ok(command) => reply(handle_command(&mut self.game, command)),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        tracing::debug!("Command channel closed");
                        connected = false;
                    }
                }
            }

            if !connected && !self.game.battle().phase().runs_combat() {
                break;
            }
            if self.game.step() == StepStatus::Finished {
                break;
            }
        }
        self.game.finish()
    }
}
