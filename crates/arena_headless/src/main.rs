//! Headless lane-battle runner.
//!
//! This binary runs battles without graphics. Results go to stdout as JSON;
//! logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Run a single battle and print its metrics
//! cargo run -p arena_headless -- run --seed 42 --strategy cheapest
//!
//! # Run a batch of seeded battles in parallel
//! cargo run -p arena_headless -- batch --count 1000 --output results/batch.json
//!
//! # Drive a battle with JSON lines on stdin
//! cargo run -p arena_headless -- interactive
//!
//! # Check a catalog file
//! cargo run -p arena_headless -- validate crates/arena_headless/data/standard_catalog.ron
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arena_headless::{
    batch::{default_output_path, run_batch, verify_determinism, BatchConfig},
    game_runner::run_game,
    run_config::{RunConfig, RunConfigError},
    runner::{HeadlessConfig, HeadlessRunner},
    strategies::PlayerStrategy,
    validate::validate_catalog,
};

#[derive(Parser)]
#[command(name = "arena_headless")]
#[command(about = "Headless lane-battle runner for strategy testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every battle-running subcommand.
#[derive(clap::Args, Debug, Clone)]
struct RunOptions {
    /// Run config RON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Battle seed (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Player strategy (overrides the config)
    #[arg(long, value_enum)]
    strategy: Option<PlayerStrategy>,

    /// Catalog RON file (overrides the config)
    #[arg(long)]
    catalog: Option<PathBuf>,
}

impl RunOptions {
    fn load(self) -> Result<RunConfig, RunConfigError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if self.catalog.is_some() {
            config.catalog_path = self.catalog;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one battle and print its metrics
    Run {
        #[command(flatten)]
        options: RunOptions,
    },

    /// Run a batch of seeded battles in parallel
    Batch {
        #[command(flatten)]
        options: RunOptions,

        /// Number of battles to run
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Maximum parallel battles (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Where to save the full results JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the full results to the default location
        #[arg(long, conflicts_with = "output")]
        save: bool,
    },

    /// Drive a battle with JSON commands on stdin
    Interactive {
        #[command(flatten)]
        options: RunOptions,

        /// Output state after every card play
        #[arg(long)]
        auto_state: bool,
    },

    /// Load and validate a catalog RON file
    Validate {
        /// Catalog file to check
        catalog: PathBuf,

        /// Run config whose rules the catalog must satisfy
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        #[command(flatten)]
        options: RunOptions,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for results)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run { options } => cmd_run(options),
        Commands::Batch {
            options,
            count,
            parallel,
            output,
            save,
        } => cmd_batch(options, count, parallel, output, save),
        Commands::Interactive {
            options,
            auto_state,
        } => cmd_interactive(options, auto_state),
        Commands::Validate { catalog, config } => cmd_validate(catalog, config),
        Commands::Verify { options, runs } => cmd_verify(options, runs),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run one battle
fn cmd_run(options: RunOptions) -> Result<ExitCode, CliError> {
    let config = options.load()?;
    let result = run_game(&config)?;
    print_json(&result.metrics)?;
    Ok(ExitCode::SUCCESS)
}

/// Run a batch of battles
fn cmd_batch(
    options: RunOptions,
    count: u32,
    parallel: u32,
    output: Option<PathBuf>,
    save: bool,
) -> Result<ExitCode, CliError> {
    let run = options.load()?;
    // Fail fast on a bad catalog instead of once per battle.
    run.catalog()?;

    let seed_start = run.seed;
    let config = BatchConfig::new(run, count)
        .with_seed(seed_start)
        .with_parallelism(parallel);

    let output = match output {
        Some(path) => Some(path),
        None if save => Some(default_output_path(&config)),
        None => None,
    };

    let results = run_batch(config);
    if let Some(path) = output {
        results.save(&path)?;
        tracing::info!("Results saved to {}", path.display());
    }
    print_json(&results.summary)?;

    if results.errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!("{} battles failed", results.errors.len());
        Ok(ExitCode::FAILURE)
    }
}

/// Run an interactive session over stdin/stdout
fn cmd_interactive(options: RunOptions, auto_state: bool) -> Result<ExitCode, CliError> {
    tracing::info!("Starting interactive session");

    let config = HeadlessConfig {
        run: options.load()?,
        auto_state_output: auto_state,
    };
    HeadlessRunner::new(config)?.run()?;
    Ok(ExitCode::SUCCESS)
}

/// Validate a catalog file
fn cmd_validate(catalog: PathBuf, config: Option<PathBuf>) -> Result<ExitCode, CliError> {
    let run = match config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let report = validate_catalog(&catalog, &run.battle)?;
    print_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Verify determinism for one seed
fn cmd_verify(options: RunOptions, runs: u32) -> Result<ExitCode, CliError> {
    let config = options.load()?;
    let deterministic = verify_determinism(&config, runs.max(1));
    print_json(&serde_json::json!({
        "seed": config.seed,
        "runs": runs,
        "deterministic": deterministic,
    }))?;
    Ok(if deterministic {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] RunConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}
