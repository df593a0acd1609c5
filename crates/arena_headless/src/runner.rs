//! Interactive headless runner.
//!
//! Reads JSON commands line by line and answers each with one or more
//! JSON response lines. The loop is generic over its input and output so
//! tests can drive it from memory.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing::{debug, info, warn};

use arena_core::battle::{Battle, TickReport};
use arena_core::catalog::{CardId, Catalog};
use arena_core::error::GameError;
use arena_core::math::Point;
use arena_core::rng::SeededRandom;

use crate::protocol::{Command, Response};
use crate::run_config::{RunConfig, RunConfigError};

/// Upper bound on ticks a single `tick` command may request.
pub const MAX_TICKS_PER_COMMAND: u32 = 100_000;

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Battle setup; its seed is used when `start` names none.
    pub run: RunConfig,
    /// Output state after every `place` as well as after ticks.
    pub auto_state_output: bool,
}

/// Headless runner for controller-driven battles.
#[derive(Debug)]
pub struct HeadlessRunner {
    config: HeadlessConfig,
    catalog: Arc<Catalog>,
    battle: Option<Battle>,
    quit: bool,
}

impl HeadlessRunner {
    /// Create a runner, loading the configured catalog.
    pub fn new(config: HeadlessConfig) -> Result<Self, RunConfigError> {
        let catalog = config.run.catalog()?;
        Ok(Self {
            config,
            catalog,
            battle: None,
            quit: false,
        })
    }

    /// Whether a `quit` command has been handled.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// The current battle, once started.
    #[must_use]
    pub fn battle(&self) -> Option<&Battle> {
        self.battle.as_ref()
    }

    /// Run against stdin and stdout until `quit` or end of input.
    pub fn run(mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_io(stdin.lock(), stdout.lock())
    }

    /// Run the command loop over arbitrary streams.
    pub fn run_io<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write_response(&mut output, &Response::ready())?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let responses = match Command::from_json(line) {
                Ok(cmd) => self.handle(cmd),
                Err(e) => {
                    warn!("Rejected command line: {}", e);
                    vec![Response::error(format!("Invalid command: {e}"), None)]
                }
            };
            for response in &responses {
                write_response(&mut output, response)?;
            }
            if self.quit {
                break;
            }
        }

        info!("Interactive session closed");
        Ok(())
    }

    /// Handle one command.
    pub fn handle(&mut self, cmd: Command) -> Vec<Response> {
        let name = cmd.name();
        debug!(cmd = name, "Handling command");

        match cmd {
            Command::Start { seed } => vec![self.start(seed.unwrap_or(self.config.run.seed))],
            Command::Place { card, x, z } => match self.place(CardId(card), Point::from_f64(x, z)) {
                Ok(responses) => responses,
                Err(e) => vec![Response::error(e.to_string(), Some(name))],
            },
            Command::Tick { count } => {
                if count > MAX_TICKS_PER_COMMAND {
                    return vec![Response::error(
                        format!("tick count {count} exceeds {MAX_TICKS_PER_COMMAND}"),
                        Some(name),
                    )];
                }
                self.step(name, |battle| (0..count).map(|_| battle.tick()).collect())
            }
            Command::Advance { ms } => self.step(name, |battle| battle.advance(ms)),
            Command::Query => match &self.battle {
                Some(battle) => vec![Response::state(&battle.snapshot(), Vec::new())],
                None => vec![not_running(name)],
            },
            Command::Hash => match &self.battle {
                Some(battle) => vec![Response::StateHash {
                    clock_ms: battle.clock_ms(),
                    hash: battle.state_hash(),
                }],
                None => vec![not_running(name)],
            },
            Command::Quit => {
                self.quit = true;
                vec![Response::Bye]
            }
        }
    }

    fn start(&mut self, seed: u64) -> Response {
        let battle = Battle::new(
            Arc::clone(&self.catalog),
            self.config.run.battle.clone(),
            Box::new(SeededRandom::from_seed(seed)),
        );
        match battle {
            Ok(battle) => {
                let response = Response::Started {
                    seed,
                    hand: battle.hand().iter().map(|c| c.0).collect(),
                    elixir: battle.elixir().to_num(),
                };
                self.battle = Some(battle);
                response
            }
            Err(e) => Response::error(e.to_string(), Some("start")),
        }
    }

    fn place(&mut self, card: CardId, position: Point) -> Result<Vec<Response>, GameError> {
        let battle = self.battle.as_mut().ok_or(GameError::BattleNotRunning)?;
        let unit = battle.place_card(card, position)?;

        let mut responses = vec![Response::Placed {
            unit: unit.0,
            card: card.0,
            elixir: battle.elixir().to_num(),
            hand: battle.hand().iter().map(|c| c.0).collect(),
        }];
        if self.config.auto_state_output {
            responses.push(Response::state(&battle.snapshot(), Vec::new()));
        }
        Ok(responses)
    }

    fn step<F>(&mut self, name: &str, run: F) -> Vec<Response>
    where
        F: FnOnce(&mut Battle) -> Vec<TickReport>,
    {
        let Some(battle) = self.battle.as_mut() else {
            return vec![not_running(name)];
        };

        let reports = run(battle);
        let outcome = reports.iter().find_map(|r| r.outcome);
        let events = reports.into_iter().flat_map(|r| r.events).collect();

        let mut responses = vec![Response::state(&battle.snapshot(), events)];
        if let Some(result) = outcome {
            responses.push(Response::GameOver { result });
        }
        responses
    }
}

fn not_running(cmd: &str) -> Response {
    Response::error(GameError::BattleNotRunning.to_string(), Some(cmd))
}

fn write_response<W: Write>(output: &mut W, response: &Response) -> io::Result<()> {
    output.write_all(response.to_json_line().as_bytes())?;
    output.flush()
}
