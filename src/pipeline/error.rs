//! Error types for the claims pipeline.
//!
//! Detection and reference-extraction failures are recoverable by design:
//! callers map them to "language unknown" / "dependent with no references"
//! rather than propagating them as fatal.

use thiserror::Error;

/// Language detection failure. Never fatal — callers fall back to
/// [`crate::pipeline::types::Language::Other`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    #[error("text too short for reliable detection ({length} chars, need {minimum})")]
    TooShort { length: usize, minimum: usize },

    #[error("no classifiable language signal in text")]
    NoSignal,
}

/// Reference extraction failure on a claim already typed as dependent.
///
/// The claim keeps its `dependent` type with an empty reference list —
/// partial information is preferable to data loss.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("dependency phrase found but no claim numbers could be parsed")]
    NoNumbersFound,

    #[error("claim number out of range: {0}")]
    NumberOutOfRange(String),
}
