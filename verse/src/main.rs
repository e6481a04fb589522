//! Command-line round driver for the verse arena.
//!
//! Loads a concept catalog, runs the configured agent population for a number
//! of rounds and logs every published winner:
//!
//! ```bash
//! cargo run -p verse -- --vocabulary verse/data/concepts.txt --rounds 50 --seed 7
//! ```

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verse_core::{RunReport, Simulation, SimulationConfig, Vocabulary};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let vocabulary = Vocabulary::load(&cli.vocabulary)
        .await
        .with_context(|| format!("loading vocabulary from {}", cli.vocabulary.display()))?;

    let config = match &cli.config {
        Some(path) => SimulationConfig::load(path)
            .await
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    let config = cli.apply(config);
    let rounds = config.rounds;

    let mut simulation = Simulation::new(config, &vocabulary)?;
    simulation.run(rounds)?;

    let history = simulation.history();
    println!();
    println!("=== Run complete ===");
    println!("Rounds: {}", simulation.round());
    println!("Relations published: {}", history.relations().len());
    println!("Compositions published: {}", history.compositions().len());
    if let Some(best) = history
        .compositions()
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
    {
        println!();
        println!("Best composition (round {}, score {:.3}):", best.round, best.score);
        println!("{}", best.artifact);
    }

    if let Some(path) = &cli.report {
        RunReport::new(&simulation)
            .save(path)
            .await
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!(path = %path.display(), "report saved");
    }

    Ok(())
}
