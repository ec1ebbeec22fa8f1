//! Claim extraction pipeline.
//!
//! Stateless stages over one spreadsheet cell of raw claim text:
//! text cleanup, claim segmentation, language detection, claim-type
//! classification, reference extraction, and confidence scoring.
//! [`runner`] composes them; [`aggregate`] folds cell outcomes into the
//! run-level result consumed by the task layer.

pub mod aggregate;
pub mod classify;
pub mod confidence;
pub mod error;
pub mod language;
pub mod preprocess;
pub mod runner;
pub mod segment;
pub mod types;

pub use aggregate::ResultAggregator;
pub use classify::{resolve_references, ClaimTypeClassifier};
pub use error::{DetectError, ReferenceError};
pub use runner::{CellOutcome, CellRunError, CellRunner, PipelineCellRunner};
pub use segment::{ClaimSegment, ClaimSegmenter, SegmentTier, Segmentation};
pub use types::{
    ClaimRecord, ClaimRef, ClaimType, IssueKind, IssueSeverity, Language, ProcessingIssue,
    RunResult, RunSummary,
};
