//! Relation agents: invent relations between concepts and score their novelty.

use super::{CreativeAgent, Evaluation};
use crate::arena::History;
use crate::artifact::{Artifact, ArtifactKind, Relation};
use crate::config::RelationAgentConfig;
use crate::error::Result;
use crate::id::AgentId;
use crate::memory::RelationMemory;
use crate::vocabulary::Concept;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Generates relations from the concept catalog and judges them by novelty
/// against a private memory.
pub struct RelationAgent {
    id: AgentId,
    concepts: Vec<Concept>,
    memory: RelationMemory,
    config: RelationAgentConfig,
    rng: StdRng,
}

impl RelationAgent {
    /// Create an agent over `concepts`, seeding its private random source.
    pub fn new(concepts: Vec<Concept>, config: RelationAgentConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let memory = RelationMemory::new(config.memory_capacity)?;
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(Self {
            id: AgentId::from_u128(rng.gen()),
            concepts,
            memory,
            config,
            rng,
        })
    }

    pub fn memory(&self) -> &RelationMemory {
        &self.memory
    }

    pub fn config(&self) -> &RelationAgentConfig {
        &self.config
    }

    /// Store a relation in this agent's memory.
    pub fn remember(&mut self, relation: Relation) -> Option<Relation> {
        self.memory.memorize(relation, &mut self.rng)
    }

    /// Find a relation between two distinct concepts sharing a modifier.
    ///
    /// Each shared modifier found is accepted on a coin flip, so repeated
    /// calls spread over the catalog instead of always returning the first
    /// match.
    pub fn generate(&mut self) -> Option<Relation> {
        let Self { concepts, rng, .. } = self;
        concepts.shuffle(rng);

        for first in concepts.iter() {
            for second in concepts.iter() {
                if first == second {
                    continue;
                }
                let mut modifiers = first.modifiers.to_vec();
                modifiers.shuffle(rng);
                for modifier in modifiers {
                    if second.has_modifier_text(&modifier.text) && rng.gen_bool(0.5) {
                        return Some(Relation::new(first.clone(), second.clone(), modifier));
                    }
                }
            }
        }
        None
    }

    /// Generate up to `invent_tries` candidates and keep the most novel.
    pub fn invent(&mut self) -> Option<(Relation, f64)> {
        let mut best: Option<(Relation, f64)> = None;
        for _ in 0..self.config.invent_tries {
            let Some(candidate) = self.generate() else {
                continue;
            };
            let score = self.novelty(&candidate);
            if best.as_ref().map_or(true, |(_, top)| score > *top) {
                best = Some((candidate, score));
            }
        }
        best
    }

    /// Weighted novelty of `relation` against this agent's memory, in [0, 1].
    pub fn novelty(&self, relation: &Relation) -> f64 {
        if self.memory.contains(relation) {
            return 0.0;
        }
        if self.memory.is_empty() {
            return 1.0;
        }

        let total = self.memory.count() as f64;
        let novel = |occurrences: usize| 1.0 - occurrences as f64 / total;

        let shared = self
            .memory
            .relations_between(&relation.first, &relation.second)
            .len();
        let first = self.memory.relations_of(&relation.first).count();
        let second = self.memory.relations_of(&relation.second).count();
        let modifier = self.memory.modifier_count(&relation.modifier);

        let weights = &self.config.weights;
        let weighted = weights.shared * novel(shared)
            + weights.first * novel(first)
            + weights.second * novel(second)
            + weights.modifier * novel(modifier);
        weighted / weights.total()
    }
}

impl CreativeAgent for RelationAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Relation
    }

    fn act(&mut self, history: &History) -> Option<Artifact> {
        for published in history.latest_relations() {
            self.memory.memorize(published.artifact.clone(), &mut self.rng);
        }

        let Some((relation, score)) = self.invent() else {
            debug!(agent = ?self.id, "no relation candidate this round");
            return None;
        };
        debug!(agent = ?self.id, %relation, score, "invented relation");
        self.memory.memorize(relation.clone(), &mut self.rng);
        Some(Artifact::Relation(relation))
    }

    fn evaluate(&self, artifact: &mut Artifact) -> Option<Evaluation> {
        match artifact {
            Artifact::Relation(relation) => Some(Evaluation::new(self.novelty(relation))),
            Artifact::Composition(_) => None,
        }
    }
}
