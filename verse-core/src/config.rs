//! Configuration for agents, the arena and whole simulation runs.
//!
//! Every struct deserializes from partial JSON: missing fields take their
//! defaults, so a config file only needs the values it changes.

use crate::error::{Error, Result};
use crate::vocabulary::Concept;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Weights of the four novelty terms a relation agent scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoveltyWeights {
    /// Relations sharing both concepts.
    pub shared: f64,
    /// Relations involving the first concept.
    pub first: f64,
    /// Relations involving the second concept.
    pub second: f64,
    /// Relations using the same modifier.
    pub modifier: f64,
}

impl NoveltyWeights {
    pub fn total(&self) -> f64 {
        self.shared + self.first + self.second + self.modifier
    }

    fn validate(&self) -> Result<()> {
        validate_weights(
            "novelty",
            &[self.shared, self.first, self.second, self.modifier],
        )
    }
}

impl Default for NoveltyWeights {
    fn default() -> Self {
        Self {
            shared: 1.0,
            first: 0.0,
            second: 0.0,
            modifier: 0.0,
        }
    }
}

/// Relative odds of drawing each token class while writing a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineWeights {
    pub concept: f64,
    pub modifier: f64,
    pub filler: f64,
}

impl LineWeights {
    fn validate(&self) -> Result<()> {
        validate_weights("line", &[self.concept, self.modifier, self.filler])
    }
}

impl Default for LineWeights {
    fn default() -> Self {
        Self {
            concept: 1.0,
            modifier: 1.0,
            filler: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationAgentConfig {
    pub memory_capacity: usize,
    /// Candidates generated per round before the best is kept.
    pub invent_tries: usize,
    pub weights: NoveltyWeights,
}

impl RelationAgentConfig {
    pub fn new() -> Self {
        Self {
            memory_capacity: 100,
            invent_tries: 10,
            weights: NoveltyWeights::default(),
        }
    }

    pub fn with_memory_capacity(mut self, capacity: usize) -> Self {
        self.memory_capacity = capacity;
        self
    }

    pub fn with_invent_tries(mut self, tries: usize) -> Self {
        self.invent_tries = tries;
        self
    }

    pub fn with_weights(mut self, weights: NoveltyWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.memory_capacity == 0 {
            return Err(Error::Config(
                "relation agent memory capacity must be positive".to_string(),
            ));
        }
        if self.invent_tries == 0 {
            return Err(Error::Config("invent tries must be positive".to_string()));
        }
        self.weights.validate()
    }
}

impl Default for RelationAgentConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a composition agent gets its knowledge of relations and topics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompositionVariant {
    /// A private bounded memory fed by published winners; topics come from it.
    #[default]
    Memory,
    /// The full live relation history; topics come from a fixed pool.
    ///
    /// An empty pool means the whole concept catalog.
    SharedHistory {
        #[serde(default)]
        topics: Vec<Concept>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionAgentConfig {
    pub memory_capacity: usize,
    pub guess_weight: f64,
    pub variety_weight: f64,
    pub line_weights: LineWeights,
    pub variant: CompositionVariant,
}

impl CompositionAgentConfig {
    pub fn new() -> Self {
        Self {
            memory_capacity: 500,
            guess_weight: 1.0,
            variety_weight: 1.0,
            line_weights: LineWeights::default(),
            variant: CompositionVariant::Memory,
        }
    }

    pub fn with_memory_capacity(mut self, capacity: usize) -> Self {
        self.memory_capacity = capacity;
        self
    }

    pub fn with_score_weights(mut self, guess: f64, variety: f64) -> Self {
        self.guess_weight = guess;
        self.variety_weight = variety;
        self
    }

    pub fn with_line_weights(mut self, weights: LineWeights) -> Self {
        self.line_weights = weights;
        self
    }

    pub fn with_variant(mut self, variant: CompositionVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.memory_capacity == 0 {
            return Err(Error::Config(
                "composition agent memory capacity must be positive".to_string(),
            ));
        }
        validate_weights("composition score", &[self.guess_weight, self.variety_weight])?;
        self.line_weights.validate()
    }
}

impl Default for CompositionAgentConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Relation winners published per round (K).
    pub relation_winners: usize,
    /// A composition guessed by more than this share of judges is halved.
    pub guess_penalty_ratio: f64,
}

impl ArenaConfig {
    pub fn new() -> Self {
        Self {
            relation_winners: 1,
            guess_penalty_ratio: 0.9,
        }
    }

    pub fn with_relation_winners(mut self, winners: usize) -> Self {
        self.relation_winners = winners;
        self
    }

    pub fn with_guess_penalty_ratio(mut self, ratio: f64) -> Self {
        self.guess_penalty_ratio = ratio;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.relation_winners == 0 {
            return Err(Error::Config(
                "at least one relation winner per round is required".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.guess_penalty_ratio) {
            return Err(Error::Config(format!(
                "guess penalty ratio {} is outside [0, 1]",
                self.guess_penalty_ratio
            )));
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for a complete run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub rounds: usize,
    /// Master seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub relation_agents: usize,
    pub composition_agents: usize,
    pub relation: RelationAgentConfig,
    pub composition: CompositionAgentConfig,
    pub arena: ArenaConfig,
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self {
            rounds: 500,
            seed: None,
            relation_agents: 20,
            composition_agents: 1,
            relation: RelationAgentConfig::new(),
            composition: CompositionAgentConfig::new(),
            arena: ArenaConfig::new(),
        }
    }

    /// Load a JSON config file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_relation_agents(mut self, count: usize) -> Self {
        self.relation_agents = count;
        self
    }

    pub fn with_composition_agents(mut self, count: usize) -> Self {
        self.composition_agents = count;
        self
    }

    pub fn with_relation_config(mut self, config: RelationAgentConfig) -> Self {
        self.relation = config;
        self
    }

    pub fn with_composition_config(mut self, config: CompositionAgentConfig) -> Self {
        self.composition = config;
        self
    }

    pub fn with_arena_config(mut self, config: ArenaConfig) -> Self {
        self.arena = config;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.relation.validate()?;
        self.composition.validate()?;
        self.arena.validate()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_weights(name: &str, weights: &[f64]) -> Result<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(Error::Config(format!(
            "{name} weights must be finite and non-negative"
        )));
    }
    if weights.iter().sum::<f64>() <= 0.0 {
        return Err(Error::Config(format!("{name} weights sum to zero")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.relation.memory_capacity, 100);
        assert_eq!(config.relation.invent_tries, 10);
        assert_eq!(config.relation.weights, NoveltyWeights::default());
        assert_eq!(config.composition.memory_capacity, 500);
        assert_eq!(config.composition.variant, CompositionVariant::Memory);
        assert_eq!(config.arena.relation_winners, 1);
        assert_eq!(config.arena.guess_penalty_ratio, 0.9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: SimulationConfig = serde_json::from_str(
            r#"{
                "rounds": 12,
                "seed": 7,
                "arena": { "relation_winners": 3 },
                "composition": { "variant": { "type": "shared_history" } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.rounds, 12);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.arena.relation_winners, 3);
        assert_eq!(config.arena.guess_penalty_ratio, 0.9);
        assert_eq!(config.relation_agents, 20);
        assert_eq!(
            config.composition.variant,
            CompositionVariant::SharedHistory { topics: Vec::new() }
        );
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let zero_winners = SimulationConfig::new()
            .with_arena_config(ArenaConfig::new().with_relation_winners(0));
        assert!(zero_winners.validate().is_err());

        let zero_capacity = SimulationConfig::new()
            .with_relation_config(RelationAgentConfig::new().with_memory_capacity(0));
        assert!(zero_capacity.validate().is_err());

        let negative_weight = SimulationConfig::new().with_relation_config(
            RelationAgentConfig::new().with_weights(NoveltyWeights {
                modifier: -1.0,
                ..NoveltyWeights::default()
            }),
        );
        assert!(negative_weight.validate().is_err());

        let all_zero = SimulationConfig::new().with_composition_config(
            CompositionAgentConfig::new().with_score_weights(0.0, 0.0),
        );
        assert!(all_zero.validate().is_err());

        let bad_ratio = SimulationConfig::new()
            .with_arena_config(ArenaConfig::new().with_guess_penalty_ratio(1.5));
        assert!(bad_ratio.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verse.json");
        tokio::fs::write(&path, r#"{ "rounds": 3, "relation_agents": 4 }"#)
            .await
            .unwrap();

        let config = SimulationConfig::load(&path).await.unwrap();
        assert_eq!(config.rounds, 3);
        assert_eq!(config.relation_agents, 4);
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verse.json");
        tokio::fs::write(&path, r#"{ "arena": { "relation_winners": 0 } }"#)
            .await
            .unwrap();

        assert!(matches!(
            SimulationConfig::load(&path).await,
            Err(Error::Config(_))
        ));
    }
}
