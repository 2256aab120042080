//! hexwork-selfplay - run civilian automation on a generated map.
//!
//! Prints a JSON summary of the run to stdout; progress goes to the log.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use hexwork_core::{load_rules, run_selfplay, MapGenConfig, RulesSource, SelfPlayConfig};

#[derive(Parser)]
#[command(name = "hexwork-selfplay")]
#[command(about = "Run automated civilians on a generated hex map", version)]
struct Cli {
    /// Map width in tiles
    #[arg(long, default_value_t = 32)]
    width: u32,

    /// Map height in tiles
    #[arg(long, default_value_t = 24)]
    height: u32,

    /// Map seed
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Number of turns to play
    #[arg(short, long, default_value_t = 20)]
    turns: u32,

    /// Rules file (YAML); the embedded rules are used when omitted
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Technology known from the start (repeatable)
    #[arg(long = "tech")]
    techs: Vec<String>,

    /// Starting cash
    #[arg(long, default_value_t = 500)]
    cash: i64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let source = match &cli.rules {
        Some(path) => RulesSource::Path(path.display().to_string()),
        None => RulesSource::Embedded,
    };
    let rules = load_rules(source).context("loading rules")?;

    let config = SelfPlayConfig {
        map: MapGenConfig {
            width: cli.width,
            height: cli.height,
            seed: cli.seed,
            ..MapGenConfig::default()
        },
        turns: cli.turns,
        starting_cash: cli.cash,
        techs: cli.techs,
        ..SelfPlayConfig::default()
    };
    tracing::info!(
        width = cli.width,
        height = cli.height,
        seed = cli.seed,
        turns = cli.turns,
        "starting self-play"
    );

    let result = run_selfplay(rules, &config);
    let summary = serde_json::to_string_pretty(&result).context("serializing summary")?;
    println!("{summary}");
    Ok(())
}
