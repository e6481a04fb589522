use clap::Parser;
use std::path::PathBuf;
use verse_core::{ArenaConfig, SimulationConfig};

#[derive(Parser, Debug)]
#[command(
    name = "verse",
    about = "Run relation and composition agents through a creative arena",
    version
)]
pub struct Cli {
    /// Concept catalog: one concept per line, each word followed by its syllable count
    #[arg(long, value_name = "FILE")]
    pub vocabulary: PathBuf,

    /// JSON simulation config; flags below override it
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Rounds to run
    #[arg(short, long)]
    pub rounds: Option<usize>,

    /// Master seed for a reproducible run
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Number of relation agents
    #[arg(long, value_name = "N")]
    pub relation_agents: Option<usize>,

    /// Number of composition agents
    #[arg(long, value_name = "N")]
    pub composition_agents: Option<usize>,

    /// Relation winners published per round
    #[arg(short = 'k', long, value_name = "K")]
    pub winners: Option<usize>,

    /// Write a JSON report of everything published
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Log agent decisions and evictions
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Default log filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, mut config: SimulationConfig) -> SimulationConfig {
        if let Some(rounds) = self.rounds {
            config = config.with_rounds(rounds);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(count) = self.relation_agents {
            config = config.with_relation_agents(count);
        }
        if let Some(count) = self.composition_agents {
            config = config.with_composition_agents(count);
        }
        if let Some(winners) = self.winners {
            let arena = ArenaConfig {
                relation_winners: winners,
                ..config.arena.clone()
            };
            config = config.with_arena_config(arena);
        }
        config
    }
}
