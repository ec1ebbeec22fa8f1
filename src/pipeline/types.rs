//! Core types for the claims extraction pipeline.
//!
//! These types model the full lifecycle:
//! Cell text → Segmentation → Language → Classification → ClaimRecord → RunResult.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════
// Claim type
// ═══════════════════════════════════════════

/// Whether a claim stands alone or narrows another claim by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Independent,
    Dependent,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Independent => "independent",
            Self::Dependent => "dependent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "independent" => Some(Self::Independent),
            "dependent" => Some(Self::Dependent),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClaimType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// Language
// ═══════════════════════════════════════════

/// Dominant language of a claim span.
///
/// `Other` is the "unknown" value callers fall back to when detection
/// reports too little signal — it is never a detection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Zh,
    En,
    Ja,
    De,
    Fr,
    Ko,
    Other,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
            Self::Ja => "ja",
            Self::De => "de",
            Self::Fr => "fr",
            Self::Ko => "ko",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "zh" => Some(Self::Zh),
            "en" => Some(Self::En),
            "ja" => Some(Self::Ja),
            "de" => Some(Self::De),
            "fr" => Some(Self::Fr),
            "ko" => Some(Self::Ko),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn all() -> &'static [Language] {
        &[
            Self::Zh,
            Self::En,
            Self::Ja,
            Self::De,
            Self::Fr,
            Self::Ko,
            Self::Other,
        ]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// Claim references
// ═══════════════════════════════════════════

/// A raw reference extracted from a dependency phrase, before resolution.
///
/// `Previous` and `All` are idioms ("any preceding claim", "any of the above
/// claims") that can only be resolved once the full sibling number set of the
/// cell is known. They never reach a [`ClaimRecord`] — resolution turns every
/// variant into concrete integers first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimRef {
    /// An explicit claim number.
    Literal(u32),
    /// Every sibling claim numbered strictly below the referencing claim.
    Previous,
    /// Every sibling claim in the segmented set.
    All,
}

// ═══════════════════════════════════════════
// Claim record
// ═══════════════════════════════════════════

/// One classified claim. Created once per extracted segment, never mutated.
///
/// Invariants (enforced by [`ClaimRecord::new`]):
/// - `referenced_claims` is sorted, deduplicated and never contains
///   `claim_number` itself;
/// - an independent claim has no references;
/// - `confidence_score` is clamped to [0.0, 1.0].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub claim_number: u32,
    pub claim_type: ClaimType,
    pub claim_text: String,
    pub language: Language,
    pub referenced_claims: Vec<u32>,
    /// Full original cell text the claim came from, kept for audit/debug.
    pub original_text: String,
    pub confidence_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patent_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
}

impl ClaimRecord {
    /// Build a record, normalizing the reference list and clamping the score.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        claim_number: u32,
        claim_type: ClaimType,
        claim_text: String,
        language: Language,
        referenced_claims: Vec<u32>,
        original_text: String,
        confidence_score: f32,
        patent_number: Option<String>,
        row_index: Option<usize>,
    ) -> Self {
        let mut refs = match claim_type {
            ClaimType::Independent => Vec::new(),
            ClaimType::Dependent => referenced_claims,
        };
        refs.retain(|&n| n != claim_number);
        refs.sort_unstable();
        refs.dedup();

        Self {
            claim_number,
            claim_type,
            claim_text,
            language,
            referenced_claims: refs,
            original_text,
            confidence_score: confidence_score.clamp(0.0, 1.0),
            patent_number,
            row_index,
        }
    }

    /// Placeholder record for an empty cell.
    ///
    /// Emitted instead of zero records so that downstream tabular exports
    /// keep one output row per input row.
    pub fn placeholder(row_index: usize, patent_number: Option<String>) -> Self {
        Self {
            claim_number: 0,
            claim_type: ClaimType::Independent,
            claim_text: String::new(),
            language: Language::Other,
            referenced_claims: Vec::new(),
            original_text: String::new(),
            confidence_score: 0.0,
            patent_number,
            row_index: Some(row_index),
        }
    }
}

// ═══════════════════════════════════════════
// Processing issues
// ═══════════════════════════════════════════

/// Scope of a processing issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Affects the whole file/run (missing file, invalid column or sheet).
    File,
    /// Isolated to a single cell.
    Cell,
}

/// Severity of a processing issue.
///
/// `Critical` aborts the run before any cell is processed; `Error` and
/// `Warning` accumulate in the result and never abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Warning,
    Error,
    Critical,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One non-fatal or fatal problem recorded during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingIssue {
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    /// Cell index for cell-level issues; `None` for file-level issues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_index: Option<usize>,
    pub message: String,
    pub suggested_action: String,
}

impl ProcessingIssue {
    pub fn file_critical(message: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::File,
            severity: IssueSeverity::Critical,
            cell_index: None,
            message: message.into(),
            suggested_action: action.into(),
        }
    }

    pub fn cell_error(
        cell_index: usize,
        message: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            kind: IssueKind::Cell,
            severity: IssueSeverity::Error,
            cell_index: Some(cell_index),
            message: message.into(),
            suggested_action: action.into(),
        }
    }

    pub fn cell_warning(
        cell_index: usize,
        message: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            kind: IssueKind::Cell,
            severity: IssueSeverity::Warning,
            cell_index: Some(cell_index),
            message: message.into(),
            suggested_action: action.into(),
        }
    }
}

// ═══════════════════════════════════════════
// Run result
// ═══════════════════════════════════════════

/// Aggregate result over a whole task run.
///
/// Created empty at task start, mutated incrementally through
/// [`crate::pipeline::aggregate::ResultAggregator`], immutable once the task
/// reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub cells_processed: u32,
    pub claims_extracted: u32,
    pub independent_count: u32,
    pub dependent_count: u32,
    /// Claim count per language code, deterministic iteration order.
    pub language_distribution: BTreeMap<String, u32>,
    pub issues: Vec<ProcessingIssue>,
    pub claims: Vec<ClaimRecord>,
}

impl RunResult {
    pub fn empty() -> Self {
        Self {
            cells_processed: 0,
            claims_extracted: 0,
            independent_count: 0,
            dependent_count: 0,
            language_distribution: BTreeMap::new(),
            issues: Vec::new(),
            claims: Vec::new(),
        }
    }

    /// Lightweight view for polling: totals without the claim list.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            cells_processed: self.cells_processed,
            claims_extracted: self.claims_extracted,
            independent_count: self.independent_count,
            dependent_count: self.dependent_count,
            language_distribution: self.language_distribution.clone(),
            issue_count: self.issues.len() as u32,
        }
    }
}

/// Totals-only view of a [`RunResult`], exposed by the poll endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub cells_processed: u32,
    pub claims_extracted: u32,
    pub independent_count: u32,
    pub dependent_count: u32,
    pub language_distribution: BTreeMap<String, u32>,
    pub issue_count: u32,
}
