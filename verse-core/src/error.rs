//! Error types for the verse arena.
//!
//! Uses thiserror for ergonomic error definition. Contract violations such as
//! forgetting a relation that was never memorized are panics, not variants here.

use crate::arena::ArenaPhase;

/// Main error type for the crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Memory-related error
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    /// Vocabulary-related error
    #[error("Vocabulary error: {0}")]
    Vocabulary(#[from] VocabularyError),

    /// Arena-related error
    #[error("Arena error: {0}")]
    Arena(#[from] ArenaError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Relation memory errors
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// A memory must be able to hold at least one relation
    #[error("Memory capacity must be positive")]
    ZeroCapacity,
}

/// Vocabulary loading errors
#[derive(Debug, thiserror::Error)]
pub enum VocabularyError {
    /// A catalog line could not be parsed
    #[error("Malformed vocabulary line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    /// Syllable counts must be positive integers
    #[error("Invalid syllable count {value:?} for word '{word}'")]
    InvalidSyllables { word: String, value: String },

    /// The concept catalog is empty
    #[error("Vocabulary contains no concepts")]
    NoConcepts,

    /// Line completion needs at least one single-syllable filler
    #[error("Filler pool has no single-syllable word")]
    NoSingleSyllableFiller,
}

/// Round protocol errors
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// Candidates are only accepted while the arena is collecting
    #[error("Arena is not collecting candidates (phase: {phase:?})")]
    NotCollecting { phase: ArenaPhase },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for memory operations
pub type MemoryResult<T> = std::result::Result<T, MemoryError>;

/// Result type for vocabulary operations
pub type VocabularyResult<T> = std::result::Result<T, VocabularyError>;
