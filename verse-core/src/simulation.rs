//! Round driver: runs every agent once per round, then resolves the arena.

use crate::agent::{CompositionAgent, CreativeAgent, RelationAgent};
use crate::arena::{Arena, History, RoundOutcome};
use crate::artifact::ArtifactKind;
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::vocabulary::Vocabulary;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// A population of agents competing in one arena.
pub struct Simulation {
    config: SimulationConfig,
    arena: Arena,
    agents: Vec<Box<dyn CreativeAgent>>,
    round: usize,
}

impl Simulation {
    /// Build the configured agent population over `vocabulary`.
    ///
    /// Every agent gets its own seed drawn from the master seed, so a seeded
    /// run replays exactly.
    pub fn new(config: SimulationConfig, vocabulary: &Vocabulary) -> Result<Self> {
        config.validate()?;
        let mut master = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut agents: Vec<Box<dyn CreativeAgent>> =
            Vec::with_capacity(config.relation_agents + config.composition_agents);
        for _ in 0..config.relation_agents {
            agents.push(Box::new(RelationAgent::new(
                vocabulary.concepts().to_vec(),
                config.relation.clone(),
                master.gen(),
            )?));
        }
        for _ in 0..config.composition_agents {
            agents.push(Box::new(CompositionAgent::new(
                vocabulary,
                config.composition.clone(),
                master.gen(),
            )?));
        }

        info!(
            relation_agents = config.relation_agents,
            composition_agents = config.composition_agents,
            concepts = vocabulary.concepts().len(),
            seed = ?config.seed,
            "simulation ready"
        );
        Self::with_agents(config, agents)
    }

    /// Run an arena over a hand-built agent population.
    pub fn with_agents(config: SimulationConfig, agents: Vec<Box<dyn CreativeAgent>>) -> Result<Self> {
        config.validate()?;
        let arena = Arena::new(config.arena.clone())?;
        Ok(Self {
            config,
            arena,
            agents,
            round: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Rounds completed so far.
    pub fn round(&self) -> usize {
        self.round
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn history(&self) -> &History {
        self.arena.history()
    }

    pub fn agents(&self) -> &[Box<dyn CreativeAgent>] {
        &self.agents
    }

    /// Agents producing and judging `kind`.
    pub fn population(&self, kind: ArtifactKind) -> usize {
        self.agents.iter().filter(|a| a.kind() == kind).count()
    }

    /// Run one round.
    ///
    /// Every agent acts against the history as it stood at the start of the
    /// round before any candidate is submitted.
    pub fn step(&mut self) -> Result<RoundOutcome> {
        let round = self.round;
        let history = self.arena.history();
        let submissions: Vec<_> = self
            .agents
            .iter_mut()
            .filter_map(|agent| agent.act(history).map(|artifact| (agent.id(), artifact)))
            .collect();
        debug!(round, candidates = submissions.len(), "collected candidates");

        for (creator, artifact) in submissions {
            self.arena.submit(creator, artifact)?;
        }
        let outcome = self.arena.resolve(round, &self.agents);
        self.round += 1;
        Ok(outcome)
    }

    /// Run `rounds` rounds.
    pub fn run(&mut self, rounds: usize) -> Result<()> {
        for _ in 0..rounds {
            self.step()?;
        }
        info!(
            rounds = self.round,
            relations = self.history().relations().len(),
            compositions = self.history().compositions().len(),
            "run finished"
        );
        Ok(())
    }
}
