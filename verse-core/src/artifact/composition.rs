//! Three-line compositions anchored on a topic concept.

use crate::vocabulary::{Concept, Modifier, Word};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Syllable target of each line, in order.
pub const LINE_SYLLABLES: [u32; 3] = [5, 7, 5];

/// One word placed in a composition line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", content = "word", rename_all = "snake_case")]
pub enum Token {
    Concept(Concept),
    Modifier(Modifier),
    Filler(Word),
}

impl Token {
    pub fn text(&self) -> &str {
        match self {
            Token::Concept(c) => &c.text,
            Token::Modifier(w) | Token::Filler(w) => &w.text,
        }
    }

    pub fn syllables(&self) -> u32 {
        match self {
            Token::Concept(c) => c.syllables,
            Token::Modifier(w) | Token::Filler(w) => w.syllables,
        }
    }

    /// Whether this is a modifier or filler equal to `word` (text and syllables).
    pub fn is_word(&self, word: &Word) -> bool {
        match self {
            Token::Modifier(w) | Token::Filler(w) => w == word,
            Token::Concept(_) => false,
        }
    }
}

/// A topic-anchored, fixed-syllable verse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composition {
    pub topic: Concept,
    pub lines: [Vec<Token>; 3],
    /// How many judges ranked the true topic first.
    pub guessed_by: usize,
    /// How many relations the author knew about the topic when writing.
    pub relations_used: usize,
}

impl Composition {
    pub fn new(topic: Concept, lines: [Vec<Token>; 3], relations_used: usize) -> Self {
        Self {
            topic,
            lines,
            guessed_by: 0,
            relations_used,
        }
    }

    /// All tokens, line by line.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.lines.iter().flatten()
    }

    pub fn token_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    pub fn line_syllables(&self, index: usize) -> u32 {
        self.lines[index].iter().map(Token::syllables).sum()
    }

    /// Whether every line hits its syllable target exactly.
    pub fn is_well_formed(&self) -> bool {
        (0..3).all(|i| self.line_syllables(i) == LINE_SYLLABLES[i])
    }

    /// Distinct tokens over total tokens, in [0, 1].
    pub fn word_variety(&self) -> f64 {
        let total = self.token_count();
        if total == 0 {
            return 0.0;
        }
        let distinct: HashSet<(&str, u32)> =
            self.tokens().map(|t| (t.text(), t.syllables())).collect();
        distinct.len() as f64 / total as f64
    }

    /// The metadata lines logged alongside a published composition.
    pub fn metadata(&self) -> String {
        format!(
            "Guessed by {}\n{} relations used",
            self.guessed_by, self.relations_used
        )
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.topic.text.to_uppercase())?;
        for line in &self.lines {
            let words: Vec<&str> = line.iter().map(Token::text).collect();
            write!(f, "\n{}", words.join(" "))?;
        }
        Ok(())
    }
}
