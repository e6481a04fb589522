//! The arena: collects candidates, gathers votes and publishes winners.
//!
//! Each round moves through four phases:
//!
//! ```text
//! Collecting -> Resolving -> Published -> Cleared -> Collecting ...
//! ```
//!
//! Candidates are accepted only while collecting. Resolution partitions them
//! by their artifact kind, lets every judge of the matching kind score every
//! candidate of that kind, and publishes winners to the append-only history.
//! Candidates are dropped at the end of every resolution whether or not
//! anything won.

use crate::agent::CreativeAgent;
use crate::artifact::{Artifact, ArtifactKind, Composition, Relation};
use crate::config::ArenaConfig;
use crate::error::{ArenaError, Result};
use crate::id::{AgentId, CandidateId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Where the arena is in the round protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArenaPhase {
    Collecting,
    Resolving,
    Published,
    Cleared,
}

impl fmt::Display for ArenaPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaPhase::Collecting => write!(f, "collecting"),
            ArenaPhase::Resolving => write!(f, "resolving"),
            ArenaPhase::Published => write!(f, "published"),
            ArenaPhase::Cleared => write!(f, "cleared"),
        }
    }
}

/// A winning artifact with the round it won and its aggregate score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Published<T> {
    pub round: usize,
    pub score: f64,
    pub artifact: T,
}

/// Append-only record of published winners, per artifact kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    relations: Vec<Published<Relation>>,
    compositions: Vec<Published<Composition>>,
    /// Most recently resolved round.
    last_round: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relations(&self) -> &[Published<Relation>] {
        &self.relations
    }

    pub fn compositions(&self) -> &[Published<Composition>] {
        &self.compositions
    }

    pub fn last_round(&self) -> Option<usize> {
        self.last_round
    }

    /// Relations published by the most recent resolution.
    pub fn latest_relations(&self) -> &[Published<Relation>] {
        let Some(round) = self.last_round else {
            return &[];
        };
        let start = self
            .relations
            .iter()
            .rposition(|published| published.round != round)
            .map_or(0, |i| i + 1);
        &self.relations[start..]
    }

    pub(crate) fn publish_relation(&mut self, round: usize, score: f64, relation: Relation) {
        self.relations.push(Published {
            round,
            score,
            artifact: relation,
        });
        self.close_round(round);
    }

    pub(crate) fn publish_composition(&mut self, round: usize, score: f64, composition: Composition) {
        self.compositions.push(Published {
            round,
            score,
            artifact: composition,
        });
        self.close_round(round);
    }

    pub(crate) fn close_round(&mut self, round: usize) {
        self.last_round = Some(round);
    }
}

/// A submitted artifact awaiting resolution.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: CandidateId,
    pub creator: AgentId,
    pub artifact: Artifact,
}

/// A candidate's final standing after voting.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub candidate: CandidateId,
    pub creator: AgentId,
    pub kind: ArtifactKind,
    /// Mean judge score, after any penalty.
    pub score: f64,
    /// Judges that recognised what the artifact is about.
    pub framed_by: usize,
    pub penalized: bool,
}

/// What one resolution did.
#[derive(Debug, Clone, Default)]
pub struct RoundOutcome {
    pub round: usize,
    /// Scored candidates in submission order. Kinds skipped for lack of
    /// judges are absent.
    pub standings: Vec<Standing>,
    pub relation_winners: Vec<Published<Relation>>,
    pub composition_winner: Option<Published<Composition>>,
}

impl RoundOutcome {
    pub fn standing(&self, candidate: CandidateId) -> Option<&Standing> {
        self.standings.iter().find(|s| s.candidate == candidate)
    }

    pub fn published_anything(&self) -> bool {
        !self.relation_winners.is_empty() || self.composition_winner.is_some()
    }
}

/// Round coordinator owning the candidate pool and the history.
pub struct Arena {
    config: ArenaConfig,
    phase: ArenaPhase,
    candidates: Vec<Candidate>,
    history: History,
}

impl Arena {
    pub fn new(config: ArenaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            phase: ArenaPhase::Collecting,
            candidates: Vec::new(),
            history: History::new(),
        })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn phase(&self) -> ArenaPhase {
        self.phase
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Add a candidate for the current round.
    pub fn submit(
        &mut self,
        creator: AgentId,
        artifact: Artifact,
    ) -> std::result::Result<CandidateId, ArenaError> {
        if self.phase != ArenaPhase::Collecting {
            return Err(ArenaError::NotCollecting { phase: self.phase });
        }
        let id = CandidateId::new();
        self.candidates.push(Candidate {
            id,
            creator,
            artifact,
        });
        Ok(id)
    }

    /// Resolve the current round against `judges` and return to collecting.
    ///
    /// Judges are matched to candidates by kind. A kind with candidates but
    /// no judges publishes nothing this round.
    pub fn resolve(&mut self, round: usize, judges: &[Box<dyn CreativeAgent>]) -> RoundOutcome {
        self.phase = ArenaPhase::Resolving;
        let (mut relations, mut compositions): (Vec<Candidate>, Vec<Candidate>) =
            std::mem::take(&mut self.candidates)
                .into_iter()
                .partition(|c| c.artifact.kind() == ArtifactKind::Relation);

        let mut outcome = RoundOutcome {
            round,
            ..RoundOutcome::default()
        };

        let relation_votes = collect_votes(ArtifactKind::Relation, &mut relations, judges);
        let mut composition_votes =
            collect_votes(ArtifactKind::Composition, &mut compositions, judges);

        if let Some(votes) = composition_votes.as_mut() {
            let panel = panel_size(ArtifactKind::Composition, judges);
            for (candidate, vote) in compositions.iter().zip(votes.iter_mut()) {
                if let Artifact::Composition(composition) = &candidate.artifact {
                    if too_guessable(composition, panel, self.config.guess_penalty_ratio) {
                        vote.score /= 2.0;
                        vote.penalized = true;
                    }
                }
            }
        }

        self.phase = ArenaPhase::Published;

        if let Some(votes) = relation_votes {
            outcome
                .standings
                .extend(standings(ArtifactKind::Relation, &relations, &votes));
            let k = self.config.relation_winners;
            if relations.len() >= k {
                for (candidate, score) in top(relations, &votes, k) {
                    if let Artifact::Relation(relation) = candidate.artifact {
                        info!(round, score, "{relation}");
                        self.history
                            .publish_relation(round, score, relation.clone());
                        outcome.relation_winners.push(Published {
                            round,
                            score,
                            artifact: relation,
                        });
                    }
                }
            } else {
                debug!(round, candidates = relations.len(), k, "too few relation candidates");
            }
        }

        if let Some(votes) = composition_votes {
            outcome
                .standings
                .extend(standings(ArtifactKind::Composition, &compositions, &votes));
            if let Some((candidate, score)) = top(compositions, &votes, 1).into_iter().next() {
                if let Artifact::Composition(composition) = candidate.artifact {
                    info!(round, score, "{composition}\n{}", composition.metadata());
                    self.history
                        .publish_composition(round, score, composition.clone());
                    outcome.composition_winner = Some(Published {
                        round,
                        score,
                        artifact: composition,
                    });
                }
            }
        }

        self.history.close_round(round);
        self.phase = ArenaPhase::Cleared;
        debug!(round, phase = %self.phase, "round resolved");
        self.phase = ArenaPhase::Collecting;
        outcome
    }
}

/// One candidate's aggregated votes.
#[derive(Debug, Clone, Copy)]
struct Vote {
    score: f64,
    framed_by: usize,
    penalized: bool,
}

fn panel_size(kind: ArtifactKind, judges: &[Box<dyn CreativeAgent>]) -> usize {
    judges.iter().filter(|judge| judge.kind() == kind).count()
}

/// Mean score of each candidate over every judge of `kind`.
///
/// `None` when candidates exist but no judge can score them.
fn collect_votes(
    kind: ArtifactKind,
    candidates: &mut [Candidate],
    judges: &[Box<dyn CreativeAgent>],
) -> Option<Vec<Vote>> {
    let panel: Vec<&dyn CreativeAgent> = judges
        .iter()
        .filter(|judge| judge.kind() == kind)
        .map(|judge| &**judge)
        .collect();
    if panel.is_empty() {
        if !candidates.is_empty() {
            warn!(%kind, candidates = candidates.len(), "no judges for candidates, skipping");
            return None;
        }
        return Some(Vec::new());
    }

    let votes = candidates
        .iter_mut()
        .map(|candidate| {
            let mut scores = Vec::with_capacity(panel.len());
            let mut framed_by = 0;
            for judge in &panel {
                if let Some(evaluation) = judge.evaluate(&mut candidate.artifact) {
                    scores.push(evaluation.score);
                    framed_by += usize::from(evaluation.framed);
                }
            }
            Vote {
                score: mean(&mut scores),
                framed_by,
                penalized: false,
            }
        })
        .collect();
    Some(votes)
}

/// Arithmetic mean, summed in value order so the result does not depend on
/// vote order.
fn mean(scores: &mut [f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.sort_by(f64::total_cmp);
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn too_guessable(composition: &Composition, panel: usize, ratio: f64) -> bool {
    composition.guessed_by as f64 > ratio * panel as f64
}

fn standings(kind: ArtifactKind, candidates: &[Candidate], votes: &[Vote]) -> Vec<Standing> {
    candidates
        .iter()
        .zip(votes)
        .map(|(candidate, vote)| Standing {
            candidate: candidate.id,
            creator: candidate.creator,
            kind,
            score: vote.score,
            framed_by: vote.framed_by,
            penalized: vote.penalized,
        })
        .collect()
}

/// The `n` best candidates, best first; ties keep submission order.
fn top(candidates: Vec<Candidate>, votes: &[Vote], n: usize) -> Vec<(Candidate, f64)> {
    let mut ranked: Vec<(Candidate, f64)> = candidates
        .into_iter()
        .zip(votes.iter().map(|vote| vote.score))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{composition, relation, ScriptedJudge};

    fn judges(kind: ArtifactKind, scores: &[f64]) -> Vec<Box<dyn CreativeAgent>> {
        scores
            .iter()
            .map(|score| Box::new(ScriptedJudge::new(kind, *score)) as Box<dyn CreativeAgent>)
            .collect()
    }

    fn arena(k: usize) -> Arena {
        Arena::new(ArenaConfig::new().with_relation_winners(k)).unwrap()
    }

    #[test]
    fn test_mean_is_order_independent() {
        let mut a = [0.2, 0.4, 0.6];
        let mut b = [0.6, 0.2, 0.4];
        let mut c = [0.4, 0.6, 0.2];
        assert!((mean(&mut a) - 0.4).abs() < 1e-12);
        assert_eq!(mean(&mut a).to_bits(), mean(&mut b).to_bits());
        assert_eq!(mean(&mut b).to_bits(), mean(&mut c).to_bits());
        assert_eq!(mean(&mut []), 0.0);
    }

    #[test]
    fn test_three_judges_average() {
        for order in [[0.2, 0.4, 0.6], [0.6, 0.4, 0.2], [0.4, 0.2, 0.6]] {
            let mut arena = arena(1);
            let id = arena
                .submit(AgentId::nil(), relation("sea", "sky", "blue").into())
                .unwrap();
            let outcome = arena.resolve(0, &judges(ArtifactKind::Relation, &order));
            let standing = outcome.standing(id).unwrap();
            assert!((standing.score - 0.4).abs() < 1e-12);
            assert_eq!(outcome.relation_winners.len(), 1);
        }
    }

    #[test]
    fn test_relation_winners_need_k_candidates() {
        let mut arena = arena(2);
        arena
            .submit(AgentId::nil(), relation("sea", "sky", "blue").into())
            .unwrap();
        let outcome = arena.resolve(0, &judges(ArtifactKind::Relation, &[0.5]));
        assert!(outcome.relation_winners.is_empty());
        assert!(arena.history().relations().is_empty());
        assert!(arena.candidates().is_empty());

        for (a, b) in [("sea", "sky"), ("owl", "moon"), ("fire", "sun")] {
            arena.submit(AgentId::nil(), relation(a, b, "pale").into()).unwrap();
        }
        let outcome = arena.resolve(1, &judges(ArtifactKind::Relation, &[0.5]));
        assert_eq!(outcome.relation_winners.len(), 2);
        assert_eq!(arena.history().relations().len(), 2);
        assert_eq!(arena.history().latest_relations().len(), 2);
    }

    #[test]
    fn test_best_relation_wins_and_ties_keep_order() {
        let judge = ScriptedJudge::new(ArtifactKind::Relation, 0.1)
            .with_score_for("owl is as pale as a moon", 0.9)
            .with_score_for("fire is as bright as a sun", 0.9);
        let panel: Vec<Box<dyn CreativeAgent>> = vec![Box::new(judge)];

        let mut arena = arena(1);
        for r in [
            relation("sea", "sky", "blue"),
            relation("owl", "moon", "pale"),
            relation("fire", "sun", "bright"),
        ] {
            arena.submit(AgentId::nil(), r.into()).unwrap();
        }
        let outcome = arena.resolve(0, &panel);
        assert_eq!(
            outcome.relation_winners[0].artifact.to_string(),
            "owl is as pale as a moon"
        );
        assert_eq!(outcome.relation_winners[0].score, 0.9);
    }

    #[test]
    fn test_guess_penalty_threshold() {
        assert!(too_guessable(&guessed(5), 5, 0.9));
        assert!(!too_guessable(&guessed(4), 5, 0.9));
        assert!(!too_guessable(&guessed(0), 0, 0.9));
    }

    fn guessed(n: usize) -> Composition {
        let mut composition = composition("sea");
        composition.guessed_by = n;
        composition
    }

    #[test]
    fn test_penalty_halves_guessable_composition() {
        let panel: Vec<Box<dyn CreativeAgent>> = (0..5)
            .map(|_| {
                Box::new(ScriptedJudge::new(ArtifactKind::Composition, 0.8).guessing())
                    as Box<dyn CreativeAgent>
            })
            .collect();

        let mut arena = arena(1);
        let id = arena
            .submit(AgentId::nil(), composition("sea").into())
            .unwrap();
        let outcome = arena.resolve(0, &panel);
        let standing = outcome.standing(id).unwrap();
        assert!(standing.penalized);
        assert!((standing.score - 0.4).abs() < 1e-12);
        assert_eq!(standing.framed_by, 5);

        let winner = outcome.composition_winner.unwrap();
        assert_eq!(winner.artifact.guessed_by, 5);
        assert_eq!(arena.history().compositions().len(), 1);
    }

    #[test]
    fn test_no_penalty_below_threshold() {
        let mut panel = judges(ArtifactKind::Composition, &[0.8, 0.8, 0.8, 0.8]);
        panel.push(Box::new(
            ScriptedJudge::new(ArtifactKind::Composition, 0.8).guessing(),
        ));

        let mut arena = arena(1);
        let id = arena
            .submit(AgentId::nil(), composition("sea").into())
            .unwrap();
        let outcome = arena.resolve(0, &panel);
        let standing = outcome.standing(id).unwrap();
        assert!(!standing.penalized);
        assert!((standing.score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_kinds_are_judged_separately() {
        let mut panel = judges(ArtifactKind::Relation, &[0.3]);
        panel.extend(judges(ArtifactKind::Composition, &[0.7]));

        let mut arena = arena(1);
        let r = arena
            .submit(AgentId::nil(), relation("sea", "sky", "blue").into())
            .unwrap();
        let c = arena
            .submit(AgentId::nil(), composition("sea").into())
            .unwrap();
        let outcome = arena.resolve(3, &panel);

        assert_eq!(outcome.standing(r).unwrap().score, 0.3);
        assert_eq!(outcome.standing(c).unwrap().score, 0.7);
        assert_eq!(outcome.relation_winners[0].round, 3);
        assert!(outcome.composition_winner.is_some());
    }

    #[test]
    fn test_kind_without_judges_is_skipped() {
        let mut arena = arena(1);
        arena
            .submit(AgentId::nil(), composition("sea").into())
            .unwrap();
        arena
            .submit(AgentId::nil(), relation("sea", "sky", "blue").into())
            .unwrap();
        let outcome = arena.resolve(0, &judges(ArtifactKind::Relation, &[0.5]));

        assert!(outcome.composition_winner.is_none());
        assert_eq!(outcome.standings.len(), 1);
        assert_eq!(outcome.relation_winners.len(), 1);
        assert!(arena.candidates().is_empty());
    }

    #[test]
    fn test_empty_round_clears_and_reopens() {
        let mut arena = arena(1);
        let outcome = arena.resolve(0, &[]);
        assert!(!outcome.published_anything());
        assert_eq!(arena.phase(), ArenaPhase::Collecting);
        assert_eq!(arena.history().last_round(), Some(0));
        assert!(arena
            .submit(AgentId::nil(), relation("sea", "sky", "blue").into())
            .is_ok());
    }

    #[test]
    fn test_latest_relations_empty_after_quiet_round() {
        let mut arena = arena(1);
        arena
            .submit(AgentId::nil(), relation("sea", "sky", "blue").into())
            .unwrap();
        let panel = judges(ArtifactKind::Relation, &[0.5]);
        arena.resolve(0, &panel);
        assert_eq!(arena.history().latest_relations().len(), 1);

        arena.resolve(1, &panel);
        assert!(arena.history().latest_relations().is_empty());
        assert_eq!(arena.history().relations().len(), 1);
    }

    struct PanickingJudge;

    impl CreativeAgent for PanickingJudge {
        fn id(&self) -> AgentId {
            AgentId::nil()
        }

        fn kind(&self) -> ArtifactKind {
            ArtifactKind::Relation
        }

        fn act(&mut self, _history: &History) -> Option<Artifact> {
            None
        }

        fn evaluate(&self, _artifact: &mut Artifact) -> Option<crate::agent::Evaluation> {
            panic!("judge failed");
        }
    }

    #[test]
    fn test_submit_rejected_outside_collecting() {
        let mut arena = arena(1);
        arena
            .submit(AgentId::nil(), relation("sea", "sky", "blue").into())
            .unwrap();
        let panel: Vec<Box<dyn CreativeAgent>> = vec![Box::new(PanickingJudge)];
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            arena.resolve(0, &panel);
        }));
        assert!(result.is_err());

        assert_eq!(arena.phase(), ArenaPhase::Resolving);
        let err = arena
            .submit(AgentId::nil(), relation("owl", "moon", "pale").into())
            .unwrap_err();
        assert!(matches!(
            err,
            ArenaError::NotCollecting {
                phase: ArenaPhase::Resolving
            }
        ));
    }
}
