//! Artifacts produced by creative agents.
//!
//! Every candidate carries an explicit kind tag; the arena partitions and
//! routes candidates on that tag alone.

mod composition;
mod relation;

pub use composition::{Composition, Token, LINE_SYLLABLES};
pub use relation::Relation;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two artifact kinds an arena round handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Relation,
    Composition,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Relation => write!(f, "relation"),
            ArtifactKind::Composition => write!(f, "composition"),
        }
    }
}

/// A tagged artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "artifact", rename_all = "snake_case")]
pub enum Artifact {
    Relation(Relation),
    Composition(Composition),
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Relation(_) => ArtifactKind::Relation,
            Artifact::Composition(_) => ArtifactKind::Composition,
        }
    }
}

impl From<Relation> for Artifact {
    fn from(relation: Relation) -> Self {
        Artifact::Relation(relation)
    }
}

impl From<Composition> for Artifact {
    fn from(composition: Composition) -> Self {
        Artifact::Composition(composition)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Relation(r) => write!(f, "{r}"),
            Artifact::Composition(c) => write!(f, "{c}"),
        }
    }
}
