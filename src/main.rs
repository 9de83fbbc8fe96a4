use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use spirit_of_nations::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Spirit of Nations map simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/test_map_1.yaml")]
    scenario: PathBuf,

    /// Override turn count (uses scenario default when omitted)
    #[arg(long)]
    turns: Option<u64>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final map state as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .with_context(|| format!("Invalid log level '{default_level}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;
    init_logging(&scenario.logging.level)?;

    let resources = scenario.resources();
    let grid = scenario
        .build_grid(&resources)
        .with_context(|| format!("Failed to build map for '{}'", scenario.name))?;
    let turns = scenario.turns(cli.turns);

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: cli.seed.unwrap_or(scenario.seed),
        layout: scenario.layout(),
    };
    let mut engine = EngineBuilder::new(settings, grid).build();

    engine.run_with_hook(turns, |summary| {
        tracing::info!(
            turn = %summary.turn,
            tick = summary.tick,
            objects = summary.objects,
            growth_density = summary.growth_density,
            "turn complete"
        );
    })?;

    if cli.json {
        let snapshot = serde_json::to_string_pretty(&engine.snapshot())?;
        println!("{snapshot}");
    } else {
        println!(
            "Scenario '{}' completed for {} turns. Now at {}.",
            scenario.name,
            turns,
            engine.current_turn()
        );
    }
    Ok(())
}
