//! Concept and modifier catalogs.
//!
//! The vocabulary is loaded once and never changes afterwards. Catalog files
//! hold one concept per line followed by the modifiers that describe it, each
//! word followed by its syllable count:
//!
//! ```text
//! sea 1 blue 1 endless 2 restless 2
//! mountain 2 tall 1 ancient 2
//! ```

use crate::error::{Result, VocabularyError, VocabularyResult};
use lazy_static::lazy_static;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

lazy_static! {
    /// Built-in filler words, all single-syllable.
    pub static ref DEFAULT_FILLERS: Vec<Word> = [
        "is", "and", "ere", "such", "how", "grows", "finds", "leaves", "looms", "rises", "yo",
    ]
    .iter()
    .map(|text| Word::new(*text, 1))
    .collect();
}

/// A token with a syllable count.
///
/// Modifiers and fillers are plain words: two words are equal when both the
/// text and the syllable count match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word {
    pub text: Arc<str>,
    pub syllables: u32,
}

/// A word describing a concept.
pub type Modifier = Word;

impl Word {
    pub fn new(text: impl AsRef<str>, syllables: u32) -> Self {
        Self {
            text: Arc::from(text.as_ref()),
            syllables,
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A concept and the modifiers linked to it in the catalog.
///
/// Identity is textual: two concepts with the same text are equal whatever
/// their syllable counts or modifier lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    pub text: Arc<str>,
    pub syllables: u32,
    pub modifiers: Arc<[Modifier]>,
}

impl Concept {
    /// Create a concept with no linked modifiers.
    pub fn new(text: impl AsRef<str>, syllables: u32) -> Self {
        Self {
            text: Arc::from(text.as_ref()),
            syllables,
            modifiers: Arc::from(Vec::new()),
        }
    }

    /// Set the linked modifiers.
    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = Arc::from(modifiers);
        self
    }

    /// Whether a modifier with the same text is linked to this concept.
    pub fn has_modifier_text(&self, text: &str) -> bool {
        self.modifiers.iter().any(|m| &*m.text == text)
    }

    /// Render the catalog line for this concept.
    pub fn catalog_line(&self) -> String {
        let mut line = format!("{} {}", self.text, self.syllables);
        for modifier in self.modifiers.iter() {
            line.push_str(&format!(" {} {}", modifier.text, modifier.syllables));
        }
        line
    }
}

impl PartialEq for Concept {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Concept {}

impl Hash for Concept {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Filler words used to pad composition lines.
///
/// Always holds at least one single-syllable word, which is what lets line
/// completion hit its syllable target exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Word>", into = "Vec<Word>")]
pub struct FillerPool {
    words: Vec<Word>,
}

impl FillerPool {
    pub fn new(words: Vec<Word>) -> VocabularyResult<Self> {
        if let Some(silent) = words.iter().find(|w| w.syllables == 0) {
            return Err(VocabularyError::InvalidSyllables {
                word: silent.text.to_string(),
                value: "0".to_string(),
            });
        }
        if !words.iter().any(|w| w.syllables == 1) {
            return Err(VocabularyError::NoSingleSyllableFiller);
        }
        Ok(Self { words })
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Pick any filler uniformly.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &Word {
        // words is never empty: construction requires a single-syllable word
        &self.words[rng.gen_range(0..self.words.len())]
    }

    /// Pick uniformly among fillers no longer than `remaining` syllables.
    ///
    /// Single-syllable fillers always qualify, so a word is returned even
    /// when `remaining` is zero.
    pub fn choose_fitting<R: Rng + ?Sized>(&self, remaining: u32, rng: &mut R) -> &Word {
        let limit = remaining.max(1);
        let fitting: Vec<&Word> = self.words.iter().filter(|w| w.syllables <= limit).collect();
        fitting[rng.gen_range(0..fitting.len())]
    }
}

impl Default for FillerPool {
    fn default() -> Self {
        Self {
            words: DEFAULT_FILLERS.clone(),
        }
    }
}

impl TryFrom<Vec<Word>> for FillerPool {
    type Error = VocabularyError;

    fn try_from(words: Vec<Word>) -> VocabularyResult<Self> {
        Self::new(words)
    }
}

impl From<FillerPool> for Vec<Word> {
    fn from(pool: FillerPool) -> Self {
        pool.words
    }
}

/// The immutable concept catalog plus filler pool.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    concepts: Vec<Concept>,
    fillers: FillerPool,
}

impl Vocabulary {
    pub fn new(concepts: Vec<Concept>, fillers: FillerPool) -> VocabularyResult<Self> {
        if concepts.is_empty() {
            return Err(VocabularyError::NoConcepts);
        }
        for concept in &concepts {
            let words = std::iter::once((&concept.text, concept.syllables))
                .chain(concept.modifiers.iter().map(|m| (&m.text, m.syllables)));
            for (text, syllables) in words {
                if syllables == 0 {
                    return Err(VocabularyError::InvalidSyllables {
                        word: text.to_string(),
                        value: "0".to_string(),
                    });
                }
            }
        }
        Ok(Self { concepts, fillers })
    }

    /// Parse a catalog, using the built-in filler pool.
    pub fn parse(text: &str) -> VocabularyResult<Self> {
        let mut concepts = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            concepts.push(parse_concept_line(line, index + 1)?);
        }
        Self::new(concepts, FillerPool::default())
    }

    /// Load a catalog file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path).await?;
        Ok(Self::parse(&text)?)
    }

    /// Replace the filler pool.
    pub fn with_fillers(mut self, fillers: FillerPool) -> Self {
        self.fillers = fillers;
        self
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn fillers(&self) -> &FillerPool {
        &self.fillers
    }
}

fn parse_concept_line(line: &str, line_number: usize) -> VocabularyResult<Concept> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() % 2 != 0 {
        return Err(VocabularyError::MalformedLine {
            line: line_number,
            reason: format!("word '{}' has no syllable count", parts[parts.len() - 1]),
        });
    }

    let mut words = parts
        .chunks(2)
        .map(|pair| parse_word(pair[0], pair[1]));

    let head = words.next().ok_or_else(|| VocabularyError::MalformedLine {
        line: line_number,
        reason: "empty line".to_string(),
    })??;
    let modifiers = words.collect::<VocabularyResult<Vec<_>>>()?;

    Ok(Concept::new(&*head.text, head.syllables).with_modifiers(modifiers))
}

fn parse_word(text: &str, syllables: &str) -> VocabularyResult<Word> {
    match syllables.parse::<u32>() {
        Ok(count) if count > 0 => Ok(Word::new(text, count)),
        _ => Err(VocabularyError::InvalidSyllables {
            word: text.to_string(),
            value: syllables.to_string(),
        }),
    }
}
