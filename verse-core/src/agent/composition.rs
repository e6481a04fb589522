//! Composition agents: write three-line verses about a topic and judge
//! others' verses by trying to guess what they are about.

use super::{CreativeAgent, Evaluation};
use crate::arena::History;
use crate::artifact::{Artifact, ArtifactKind, Composition, Relation, Token, LINE_SYLLABLES};
use crate::config::{CompositionAgentConfig, CompositionVariant, LineWeights};
use crate::error::Result;
use crate::id::AgentId;
use crate::memory::RelationMemory;
use crate::vocabulary::{Concept, FillerPool, Modifier, Vocabulary};
use indexmap::IndexMap;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Guesses a judge makes about a composition's topic.
const GUESSES: usize = 3;

/// Tiered guess score for the true topic at each guess rank, out of 10.
const GUESS_TIERS: [f64; GUESSES] = [10.0, 4.0, 1.0];

/// A normalized guess term above this counts as framing the topic.
const FRAMING_THRESHOLD: f64 = 0.6;

/// The breakdown of a composition judge's verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionEvaluation {
    /// Weighted sum of the guess and variety terms.
    pub score: f64,
    /// Tiered guess score normalized to [0, 1].
    pub guess: f64,
    pub variety: f64,
    /// The guess term exceeded the framing threshold.
    pub framed: bool,
    /// Top guesses, most likely first.
    pub guesses: Vec<Concept>,
}

/// Writes compositions from the relations it knows.
///
/// Two knowledge variants exist. `Memory` keeps a private bounded memory fed
/// by each round's published relations and draws topics from it.
/// `SharedHistory` mirrors the whole published relation history and draws
/// topics from a fixed pool.
pub struct CompositionAgent {
    id: AgentId,
    knowledge: RelationMemory,
    /// Topic pool, present only for the shared history variant.
    topics: Option<Vec<Concept>>,
    /// Published relations already mirrored from the history.
    mirrored: usize,
    fillers: FillerPool,
    config: CompositionAgentConfig,
    rng: StdRng,
}

impl CompositionAgent {
    pub fn new(vocabulary: &Vocabulary, config: CompositionAgentConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let (knowledge, topics) = match &config.variant {
            CompositionVariant::Memory => (RelationMemory::new(config.memory_capacity)?, None),
            CompositionVariant::SharedHistory { topics } if topics.is_empty() => {
                (RelationMemory::unbounded(), Some(vocabulary.concepts().to_vec()))
            }
            CompositionVariant::SharedHistory { topics } => {
                (RelationMemory::unbounded(), Some(topics.clone()))
            }
        };
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(Self {
            id: AgentId::from_u128(rng.gen()),
            knowledge,
            topics,
            mirrored: 0,
            fillers: vocabulary.fillers().clone(),
            config,
            rng,
        })
    }

    /// Relations this agent writes from and judges against.
    pub fn knowledge(&self) -> &RelationMemory {
        &self.knowledge
    }

    pub fn config(&self) -> &CompositionAgentConfig {
        &self.config
    }

    /// Store a relation in this agent's knowledge.
    pub fn remember(&mut self, relation: Relation) -> Option<Relation> {
        self.knowledge.memorize(relation, &mut self.rng)
    }

    /// Concepts linked to `topic` and the modifiers of those links.
    ///
    /// The count of known relations about the topic comes third.
    pub fn applicable(&self, topic: &Concept) -> (Vec<Concept>, Vec<Modifier>, usize) {
        let Some(partners) = self.knowledge.partners(topic) else {
            return (Vec::new(), Vec::new(), 0);
        };
        let concepts: Vec<Concept> = partners.keys().cloned().collect();
        let modifiers: Vec<Modifier> = partners
            .values()
            .flatten()
            .map(|relation| relation.modifier.clone())
            .collect();
        let relations = modifiers.len();
        (concepts, modifiers, relations)
    }

    /// Pick a topic and write a composition about it.
    ///
    /// Returns `None` when no topic is available or nothing is known about
    /// the chosen one.
    pub fn generate(&mut self) -> Option<Composition> {
        let topic = self.choose_topic()?;
        let (concepts, modifiers, relations_used) = self.applicable(&topic);
        if concepts.is_empty() {
            debug!(agent = ?self.id, %topic, "nothing known about topic");
            return None;
        }

        let weights = self.config.line_weights;
        let lines = LINE_SYLLABLES.map(|target| {
            write_line(
                target,
                &concepts,
                &modifiers,
                &self.fillers,
                &weights,
                &mut self.rng,
            )
        });
        Some(Composition::new(topic, lines, relations_used))
    }

    /// Rank likely topics of `composition` from the relations attached to
    /// the concepts it mentions.
    ///
    /// Every relation touching a mentioned concept votes for its partner
    /// concept, with one extra vote per modifier or filler token equal to
    /// the relation's modifier. Ties keep the order partners were first met.
    pub fn guess_topics(&self, composition: &Composition) -> Vec<Concept> {
        let mut anchors: Vec<&Concept> = Vec::new();
        for token in composition.tokens() {
            if let Token::Concept(concept) = token {
                if self.knowledge.knows(concept) && !anchors.contains(&concept) {
                    anchors.push(concept);
                }
            }
        }

        let mut votes: IndexMap<&Concept, usize> = IndexMap::new();
        for anchor in anchors {
            for relation in self.knowledge.relations_of(anchor) {
                let Some(partner) = relation.partner_of(anchor) else {
                    continue;
                };
                let echoes = composition
                    .tokens()
                    .filter(|token| token.is_word(&relation.modifier))
                    .count();
                *votes.entry(partner).or_insert(0) += 1 + echoes;
            }
        }

        let mut ranked: Vec<(&Concept, usize)> = votes.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(GUESSES)
            .map(|(concept, _)| concept.clone())
            .collect()
    }

    /// Score a composition on how guessable its topic is and how varied its
    /// words are.
    ///
    /// Guessing the topic first bumps the composition's guessed-by counter.
    pub fn judge(&self, composition: &mut Composition) -> CompositionEvaluation {
        let variety = composition.word_variety();
        let guesses = self.guess_topics(composition);
        let rank = guesses.iter().position(|g| *g == composition.topic);
        if rank == Some(0) {
            composition.guessed_by += 1;
        }

        let guess = rank.map_or(0.0, |r| GUESS_TIERS[r]) / 10.0;
        let score = self.config.guess_weight * guess + self.config.variety_weight * variety;
        CompositionEvaluation {
            score,
            guess,
            variety,
            framed: guess > FRAMING_THRESHOLD,
            guesses,
        }
    }

    fn choose_topic(&mut self) -> Option<Concept> {
        match &self.topics {
            Some(pool) => pool.choose(&mut self.rng).cloned(),
            None => {
                let known = self.knowledge.relation_lookup();
                if known.is_empty() {
                    return None;
                }
                let (topic, _) = known.get_index(self.rng.gen_range(0..known.len()))?;
                Some(topic.clone())
            }
        }
    }

    fn absorb(&mut self, history: &History) {
        if self.topics.is_some() {
            let unseen = history.relations().get(self.mirrored..).unwrap_or(&[]);
            for published in unseen {
                self.knowledge
                    .memorize(published.artifact.clone(), &mut self.rng);
            }
            self.mirrored = history.relations().len();
        } else {
            for published in history.latest_relations() {
                self.knowledge
                    .memorize(published.artifact.clone(), &mut self.rng);
            }
        }
    }
}

impl CreativeAgent for CompositionAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Composition
    }

    fn act(&mut self, history: &History) -> Option<Artifact> {
        self.absorb(history);
        self.generate().map(Artifact::Composition)
    }

    fn evaluate(&self, artifact: &mut Artifact) -> Option<Evaluation> {
        match artifact {
            Artifact::Composition(composition) => {
                let verdict = self.judge(composition);
                Some(Evaluation::new(verdict.score).with_framing(verdict.framed))
            }
            Artifact::Relation(_) => None,
        }
    }
}

/// Write one line of exactly `target` syllables.
///
/// Tokens are drawn from the concept, modifier and filler classes by
/// `weights` until the line reaches or passes the target. An overshooting
/// last token is dropped, then single fillers pad the line to the target.
/// A class with an empty pool is never drawn.
pub fn write_line<R: Rng + ?Sized>(
    target: u32,
    concepts: &[Concept],
    modifiers: &[Modifier],
    fillers: &FillerPool,
    weights: &LineWeights,
    rng: &mut R,
) -> Vec<Token> {
    let mut line = Vec::new();
    let mut syllables = 0;

    let class_weights = [
        if concepts.is_empty() { 0.0 } else { weights.concept },
        if modifiers.is_empty() { 0.0 } else { weights.modifier },
        weights.filler,
    ];
    if let Ok(classes) = WeightedIndex::new(class_weights) {
        while syllables < target {
            let token = match classes.sample(rng) {
                0 => Token::Concept(concepts[rng.gen_range(0..concepts.len())].clone()),
                1 => Token::Modifier(modifiers[rng.gen_range(0..modifiers.len())].clone()),
                _ => Token::Filler(fillers.choose(rng).clone()),
            };
            syllables += token.syllables();
            line.push(token);
        }
        if syllables > target {
            if let Some(last) = line.pop() {
                syllables -= last.syllables();
            }
        }
    }

    while syllables < target {
        let filler = fillers.choose_fitting(target - syllables, rng);
        syllables += filler.syllables;
        line.push(Token::Filler(filler.clone()));
    }
    line
}
