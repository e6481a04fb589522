//! Relation facts: two concepts linked by a shared modifier.

use crate::vocabulary::{Concept, Modifier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An unordered pair of concepts plus the modifier they share.
///
/// `Relation::new(a, b, m) == Relation::new(b, a, m)`; hashing agrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub first: Concept,
    pub second: Concept,
    pub modifier: Modifier,
}

impl Relation {
    pub fn new(first: Concept, second: Concept, modifier: Modifier) -> Self {
        Self {
            first,
            second,
            modifier,
        }
    }

    /// The concept paired with `anchor`, if `anchor` is part of this relation.
    pub fn partner_of(&self, anchor: &Concept) -> Option<&Concept> {
        if &self.first == anchor {
            Some(&self.second)
        } else if &self.second == anchor {
            Some(&self.first)
        } else {
            None
        }
    }

    fn ordered_texts(&self) -> (&str, &str) {
        let (a, b) = (&*self.first.text, &*self.second.text);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        let same_pair = (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first);
        same_pair && self.modifier == other.modifier
    }
}

impl Eq for Relation {}

impl Hash for Relation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordered_texts().hash(state);
        self.modifier.hash(state);
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let article = match self.second.text.chars().next() {
            Some(c) if matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u') => "an",
            _ => "a",
        };
        write!(
            f,
            "{} is as {} as {} {}",
            self.first, self.modifier, article, self.second
        )
    }
}
