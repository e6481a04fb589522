//! Testing utilities for the verse arena.
//!
//! This module provides tools for unit and integration testing:
//! - Fixtures: a small overlapping vocabulary, one-syllable relations and a
//!   well-formed composition
//! - `ScriptedJudge` for deterministic arena votes without real agents
//! - `TestHarness` for seeded multi-round runs
//! - Assertion helpers for checking invariants

use crate::agent::{CreativeAgent, Evaluation};
use crate::arena::{History, RoundOutcome};
use crate::artifact::{Artifact, ArtifactKind, Composition, Relation, Token, LINE_SYLLABLES};
use crate::config::SimulationConfig;
use crate::id::AgentId;
use crate::memory::RelationMemory;
use crate::simulation::Simulation;
use crate::vocabulary::{Concept, Vocabulary, Word};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

/// Catalog used by [`sample_vocabulary`]. Most modifiers are shared by
/// several concepts so relation agents always find candidates.
pub const SAMPLE_CATALOG: &str = "\
# concept  modifiers
sea 1      blue 1 deep 1 restless 2 cold 1 endless 2
sky 1      blue 1 grey 1 endless 2 pale 1
stone 1    cold 1 grey 1 ancient 2 silent 2
fire 1     bright 1 restless 2 warm 1 golden 2
sun 1      bright 1 warm 1 golden 2 pale 1
owl 1      wise 1 grey 1 silent 2 ancient 2
moon 1     pale 1 silent 2 cold 1 bright 1
river 2    deep 1 restless 2 cold 1 endless 2
mountain 2 ancient 2 grey 1 silent 2 cold 1
meadow 2   golden 2 warm 1 wise 1 bright 1
";

/// A deterministic random source.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// The sample vocabulary with the built-in fillers.
pub fn sample_vocabulary() -> Vocabulary {
    match Vocabulary::parse(SAMPLE_CATALOG) {
        Ok(vocabulary) => vocabulary,
        Err(e) => panic!("sample catalog is invalid: {e}"),
    }
}

/// A relation between two one-syllable concepts via a one-syllable modifier.
pub fn relation(first: &str, second: &str, modifier: &str) -> Relation {
    Relation::new(
        Concept::new(first, 1),
        Concept::new(second, 1),
        Word::new(modifier, 1),
    )
}

/// A well-formed composition about `topic` made only of fillers.
pub fn composition(topic: &str) -> Composition {
    let fillers = ["is", "and", "ere", "such", "how", "grows", "finds"];
    let lines = LINE_SYLLABLES.map(|target| {
        (0..target as usize)
            .map(|i| Token::Filler(Word::new(fillers[i], 1)))
            .collect::<Vec<_>>()
    });
    Composition::new(Concept::new(topic, 1), lines, 0)
}

/// A judge that returns scripted scores.
///
/// Scores by artifact rendering fall back to a default. A guessing judge
/// also marks every composition it sees as guessed and framed.
pub struct ScriptedJudge {
    id: AgentId,
    kind: ArtifactKind,
    default_score: f64,
    scores: HashMap<String, f64>,
    guessing: bool,
    submission: Option<Artifact>,
}

impl ScriptedJudge {
    pub fn new(kind: ArtifactKind, default_score: f64) -> Self {
        Self {
            id: AgentId::new(),
            kind,
            default_score,
            scores: HashMap::new(),
            guessing: false,
            submission: None,
        }
    }

    /// Score the artifact rendering as `text` with `score`.
    pub fn with_score_for(mut self, text: impl Into<String>, score: f64) -> Self {
        self.scores.insert(text.into(), score);
        self
    }

    /// Guess the topic of every composition judged.
    pub fn guessing(mut self) -> Self {
        self.guessing = true;
        self
    }

    /// Submit `artifact` every round.
    pub fn submitting(mut self, artifact: impl Into<Artifact>) -> Self {
        self.submission = Some(artifact.into());
        self
    }
}

impl CreativeAgent for ScriptedJudge {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> ArtifactKind {
        self.kind
    }

    fn act(&mut self, _history: &History) -> Option<Artifact> {
        self.submission.clone()
    }

    fn evaluate(&self, artifact: &mut Artifact) -> Option<Evaluation> {
        if artifact.kind() != self.kind {
            return None;
        }
        let score = self
            .scores
            .get(&artifact.to_string())
            .copied()
            .unwrap_or(self.default_score);
        let mut framed = false;
        if let Artifact::Composition(composition) = artifact {
            if self.guessing {
                composition.guessed_by += 1;
                framed = true;
            }
        }
        Some(Evaluation::new(score).with_framing(framed))
    }
}

/// Test harness for seeded simulation runs over the sample vocabulary.
pub struct TestHarness {
    pub simulation: Simulation,
    pub outcomes: Vec<RoundOutcome>,
}

impl TestHarness {
    /// Small, fast, seeded run configuration.
    pub fn config(seed: u64) -> SimulationConfig {
        SimulationConfig::new()
            .with_seed(seed)
            .with_relation_agents(4)
            .with_composition_agents(2)
    }

    pub fn new(seed: u64) -> Self {
        Self::with_config(Self::config(seed))
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        match Simulation::new(config, &sample_vocabulary()) {
            Ok(simulation) => Self {
                simulation,
                outcomes: Vec::new(),
            },
            Err(e) => panic!("test harness config is invalid: {e}"),
        }
    }

    /// Run `rounds` rounds, keeping every outcome.
    pub fn run(&mut self, rounds: usize) -> &mut Self {
        for _ in 0..rounds {
            match self.simulation.step() {
                Ok(outcome) => self.outcomes.push(outcome),
                Err(e) => panic!("round {} failed: {e}", self.simulation.round()),
            }
        }
        self
    }

    pub fn history(&self) -> &History {
        self.simulation.history()
    }

    /// Published relations rendered as text, in publication order.
    pub fn relation_log(&self) -> Vec<String> {
        self.history()
            .relations()
            .iter()
            .map(|p| p.artifact.to_string())
            .collect()
    }

    /// Published compositions rendered as text, in publication order.
    pub fn composition_log(&self) -> Vec<String> {
        self.history()
            .compositions()
            .iter()
            .map(|p| p.artifact.to_string())
            .collect()
    }
}

/// Assert every line of a composition hits its syllable target.
#[track_caller]
pub fn assert_well_formed(composition: &Composition) {
    for (i, target) in LINE_SYLLABLES.iter().enumerate() {
        let actual = composition.line_syllables(i);
        assert_eq!(
            actual, *target,
            "Expected line {} to have {target} syllables, got {actual}:\n{composition}",
            i + 1
        );
    }
}

/// Assert the memory holds at most its capacity and both index directions agree.
#[track_caller]
pub fn assert_memory_consistent(memory: &RelationMemory) {
    assert!(
        memory.count() <= memory.capacity(),
        "Expected at most {} relations, got {}",
        memory.capacity(),
        memory.count()
    );
    for (a, partners) in memory.relation_lookup() {
        for (b, bucket) in partners {
            assert!(!bucket.is_empty(), "Expected no empty bucket at {a}/{b}");
            let mirror = memory.relations_between(b, a);
            for relation in bucket {
                assert!(
                    mirror.contains(relation),
                    "Expected {relation} to be indexed under {b}/{a} too"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_vocabulary() {
        let vocabulary = sample_vocabulary();
        assert_eq!(vocabulary.concepts().len(), 10);
        assert!(vocabulary.concepts().iter().all(|c| c.modifiers.len() >= 4));
    }

    #[test]
    fn test_composition_fixture_is_well_formed() {
        let composition = composition("sea");
        assert_well_formed(&composition);
        assert_eq!(composition.word_variety(), 7.0 / 17.0);
    }

    #[test]
    fn test_scripted_judge() {
        let judge = ScriptedJudge::new(ArtifactKind::Relation, 0.25)
            .with_score_for("sea is as blue as a sky", 0.75);

        let mut scored = Artifact::Relation(relation("sea", "sky", "blue"));
        assert_eq!(judge.evaluate(&mut scored).unwrap().score, 0.75);
        let mut fallback = Artifact::Relation(relation("owl", "moon", "pale"));
        assert_eq!(judge.evaluate(&mut fallback).unwrap().score, 0.25);
        let mut other = Artifact::Composition(composition("sea"));
        assert!(judge.evaluate(&mut other).is_none());
    }
}
