//! Creative agents: generators that also act as judges.
//!
//! An agent produces artifacts of one kind and judges artifacts of that same
//! kind. The round driver calls [`CreativeAgent::act`] once per round; the
//! arena calls [`CreativeAgent::evaluate`] while resolving.

mod composition;
mod relation;

pub use composition::{write_line, CompositionAgent, CompositionEvaluation};
pub use relation::RelationAgent;

use crate::arena::History;
use crate::artifact::{Artifact, ArtifactKind};
use crate::id::AgentId;
use serde::{Deserialize, Serialize};

/// Core agent trait shared by generators and judges
pub trait CreativeAgent: Send {
    /// Get the agent's unique identifier
    fn id(&self) -> AgentId;

    /// The artifact kind this agent produces and judges
    fn kind(&self) -> ArtifactKind;

    /// Take this round's turn: read the published history, maybe produce a candidate.
    ///
    /// `None` is a normal outcome when nothing worth submitting was found.
    fn act(&mut self, history: &History) -> Option<Artifact>;

    /// Score an artifact of this agent's kind.
    ///
    /// Returns `None` for an artifact of the other kind. Judging may record
    /// side effects on the artifact itself (a composition's guessed-by count).
    fn evaluate(&self, artifact: &mut Artifact) -> Option<Evaluation>;
}

/// A judge's verdict on one artifact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    /// Whether the judge recognised what the artifact is about.
    pub framed: bool,
}

impl Evaluation {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            framed: false,
        }
    }

    pub fn with_framing(mut self, framed: bool) -> Self {
        self.framed = framed;
        self
    }
}
