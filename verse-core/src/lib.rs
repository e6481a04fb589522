//! Competing creative agents in a round-based arena.
//!
//! This crate provides:
//! - A bounded, bidirectionally indexed relation memory with random eviction
//! - Relation agents that invent and judge relations by novelty
//! - Composition agents that write 5-7-5 verses and judge them by guessing
//!   their topic
//! - An arena that collects candidates, averages votes, penalizes overly
//!   guessable verses and publishes winners to an append-only history
//! - A seeded round driver and JSON run reports
//!
//! # Quick Start
//!
//! ```ignore
//! use verse_core::{RunReport, Simulation, SimulationConfig, Vocabulary};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vocabulary = Vocabulary::load("concepts.txt").await?;
//!     let config = SimulationConfig::new().with_rounds(100).with_seed(7);
//!
//!     let mut simulation = Simulation::new(config, &vocabulary)?;
//!     simulation.run(100)?;
//!
//!     RunReport::new(&simulation).save("run.json").await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod arena;
pub mod artifact;
pub mod config;
pub mod error;
pub mod id;
pub mod memory;
pub mod report;
pub mod simulation;
pub mod testing;
pub mod vocabulary;

// Primary public API
pub use agent::{CompositionAgent, CreativeAgent, Evaluation, RelationAgent};
pub use arena::{Arena, ArenaPhase, History, Published, RoundOutcome};
pub use artifact::{Artifact, ArtifactKind, Composition, Relation, Token};
pub use config::{
    ArenaConfig, CompositionAgentConfig, CompositionVariant, LineWeights, NoveltyWeights,
    RelationAgentConfig, SimulationConfig,
};
pub use error::{Error, Result};
pub use id::{AgentId, CandidateId};
pub use memory::RelationMemory;
pub use report::RunReport;
pub use simulation::Simulation;
pub use testing::{ScriptedJudge, TestHarness};
pub use vocabulary::{Concept, FillerPool, Modifier, Vocabulary, Word};
