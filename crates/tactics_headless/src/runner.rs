//! Headless battle runner implementation.
//!
//! Reads [`Command`]s line by line, applies them to one [`Simulation`] and
//! writes [`Response`]s back. The runner is generic over its input and output
//! so tests can drive it from strings.

use std::io::{self, BufRead, Write};

use tactics_core::hex::HexCoord;
use tactics_core::math::Fixed;
use tactics_core::simulation::{SimEvent, Simulation, UnitCommand};
use tracing::{debug, info, warn};

use crate::protocol::{Command, Response};
use crate::scenario::{Scenario, ScenarioError};

/// Upper bound on ticks a single `tick` command may request (one hour at
/// the stock tick rate).
pub const MAX_TICKS_PER_COMMAND: u32 = 20 * 60 * 60;

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output state after every tick command (vs only on query).
    pub auto_state_output: bool,
}

/// Headless runner for externally controlled play.
#[derive(Debug)]
pub struct HeadlessRunner {
    config: HeadlessConfig,
    scenario: Scenario,
    sim: Simulation,
    game_over_sent: bool,
    should_quit: bool,
}

impl HeadlessRunner {
    /// Create a runner for a scenario with default config.
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        Self::with_config(scenario, HeadlessConfig::default())
    }

    /// Create a runner with custom configuration.
    pub fn with_config(scenario: Scenario, config: HeadlessConfig) -> Result<Self, ScenarioError> {
        let sim = scenario.build()?;
        info!(
            scenario = %scenario.name,
            units = sim.board().len(),
            seed = scenario.seed,
            "Scenario loaded"
        );
        Ok(Self {
            config,
            scenario,
            sim,
            game_over_sent: false,
            should_quit: false,
        })
    }

    /// The simulation being driven.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Whether a `quit` command has been processed.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run the session until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write_response(&mut output, &Response::ready(&self.scenario.name, self.sim.get_tick()))?;

        for line in input.lines() {
            for response in self.handle_line(&line?) {
                write_response(&mut output, &response)?;
            }
            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    /// Parse and process one input line. Blank lines produce nothing.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        match Command::from_json(line) {
            Ok(cmd) => self.handle(cmd),
            Err(e) => vec![Response::error(format!("Parse error: {e}"), None)],
        }
    }

    /// Process one command.
    pub fn handle(&mut self, cmd: Command) -> Vec<Response> {
        let cmd_name = cmd.name();
        debug!(cmd = cmd_name, "Processing command");

        let mut responses = Vec::new();
        match cmd {
            Command::Tick { count } => {
                if count > MAX_TICKS_PER_COMMAND {
                    responses.push(Response::error(
                        format!("tick count {count} exceeds limit {MAX_TICKS_PER_COMMAND}"),
                        Some(cmd_name),
                    ));
                    return responses;
                }
                let mut events = Vec::new();
                for _ in 0..count {
                    events.extend(self.sim.tick().events);
                    if self.sim.outcome().is_decided() {
                        break;
                    }
                }
                responses.push(Response::events(&self.sim, events));
                if self.config.auto_state_output {
                    responses.push(Response::state(&self.sim));
                }
            }

            Command::Query => responses.push(Response::state(&self.sim)),

            Command::Move { unit, col, row } => {
                let result = self.sim.issue(unit, UnitCommand::MoveTo(HexCoord::new(col, row)));
                responses.push(self.command_result(cmd_name, result));
            }

            Command::Attack { unit, col, row } => {
                let result = self
                    .sim
                    .issue(unit, UnitCommand::AttackTo(HexCoord::new(col, row)));
                responses.push(self.command_result(cmd_name, result));
            }

            Command::Preview {
                unit,
                col,
                row,
                legal_only,
            } => {
                let target = HexCoord::new(col, row);
                let preview = if legal_only {
                    self.sim.preview_legal_attack(unit, target)
                } else {
                    self.sim.preview_attack(unit, target)
                };
                match preview {
                    Ok(breakdown) => responses.push(Response::Preview {
                        summary: breakdown.to_string(),
                        breakdown,
                    }),
                    Err(e) => responses.push(Response::error(e.to_string(), Some(cmd_name))),
                }
            }

            Command::Speed { multiplier } => {
                let result = Fixed::checked_from_num(multiplier)
                    .ok_or_else(|| format!("speed {multiplier} is out of range"))
                    .and_then(|scale| self.sim.set_time_scale(scale).map_err(|e| e.to_string()));
                match result {
                    Ok(()) => responses.push(Response::ack(cmd_name)),
                    Err(message) => responses.push(Response::error(message, Some(cmd_name))),
                }
            }

            Command::Reset => match self.scenario.board() {
                Ok(board) => {
                    self.sim.reset(board);
                    self.game_over_sent = false;
                    responses.push(Response::ack(cmd_name));
                }
                Err(e) => responses.push(Response::error(e.to_string(), Some(cmd_name))),
            },

            Command::Hash => responses.push(Response::StateHash {
                tick: self.sim.get_tick(),
                hash: self.sim.state_hash(),
            }),

            Command::Quit => {
                self.should_quit = true;
                responses.push(Response::Bye);
                return responses;
            }
        }

        if let Some(game_over) = self.check_game_over() {
            responses.push(game_over);
        }
        responses
    }

    fn command_result(
        &self,
        cmd_name: &str,
        result: tactics_core::error::Result<Vec<SimEvent>>,
    ) -> Response {
        match result {
            Ok(events) => Response::events(&self.sim, events),
            Err(e) => {
                warn!(cmd = cmd_name, error = %e, "Command rejected");
                Response::error(e.to_string(), Some(cmd_name))
            }
        }
    }

    /// A game-over response the first time the battle is decided.
    fn check_game_over(&mut self) -> Option<Response> {
        let outcome = self.sim.outcome();
        if !outcome.is_decided() || self.game_over_sent {
            return None;
        }
        self.game_over_sent = true;
        info!(tick = self.sim.get_tick(), ?outcome, "Battle decided");
        Some(Response::GameOver {
            outcome,
            tick: self.sim.get_tick(),
        })
    }
}

fn write_response<W: Write>(output: &mut W, response: &Response) -> io::Result<()> {
    output.write_all(response.to_json_line().as_bytes())?;
    output.flush()
}
