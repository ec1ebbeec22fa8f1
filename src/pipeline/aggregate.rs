//! Incremental builder for the run-level result.
//!
//! Created empty at task start, fed one claim/issue at a time as cells are
//! processed, and frozen into a [`RunResult`] when the task reaches a
//! terminal state. Resumed tasks seed the aggregator from a recovery
//! snapshot before the first new cell.

use std::collections::BTreeMap;

use super::types::{ClaimRecord, ProcessingIssue, RunResult};

/// Accumulates per-cell outcomes into a [`RunResult`].
#[derive(Debug)]
pub struct ResultAggregator {
    result: RunResult,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self {
            result: RunResult::empty(),
        }
    }

    /// Restore accumulated state from a recovery snapshot.
    ///
    /// Totals are recomputed from the claim list; the language histogram is
    /// taken from the snapshot as-is (it was derived from the same list).
    pub fn seed(
        &mut self,
        claims: Vec<ClaimRecord>,
        issues: Vec<ProcessingIssue>,
        language_distribution: BTreeMap<String, u32>,
        cells_done: usize,
    ) {
        let mut result = RunResult::empty();
        result.cells_processed = cells_done as u32;
        result.language_distribution = language_distribution;
        result.issues = issues;
        for claim in &claims {
            if claim.claim_number > 0 {
                result.claims_extracted += 1;
                match claim.claim_type {
                    super::types::ClaimType::Independent => result.independent_count += 1,
                    super::types::ClaimType::Dependent => result.dependent_count += 1,
                }
            }
        }
        result.claims = claims;
        self.result = result;
    }

    /// Append one claim record, updating totals and the language histogram.
    ///
    /// Placeholder records (claim number 0, emitted for empty cells to keep
    /// row alignment) are appended to the claim list but excluded from the
    /// extraction totals and the histogram.
    pub fn record_claim(&mut self, claim: ClaimRecord) {
        if claim.claim_number > 0 {
            self.result.claims_extracted += 1;
            match claim.claim_type {
                super::types::ClaimType::Independent => self.result.independent_count += 1,
                super::types::ClaimType::Dependent => self.result.dependent_count += 1,
            }
            *self
                .result
                .language_distribution
                .entry(claim.language.as_str().to_string())
                .or_insert(0) += 1;
        }
        self.result.claims.push(claim);
    }

    pub fn record_issue(&mut self, issue: ProcessingIssue) {
        self.result.issues.push(issue);
    }

    pub fn note_cell_done(&mut self) {
        self.result.cells_processed += 1;
    }

    // Snapshot views used by checkpointing.

    pub fn claims(&self) -> &[ClaimRecord] {
        &self.result.claims
    }

    pub fn issues(&self) -> &[ProcessingIssue] {
        &self.result.issues
    }

    pub fn language_distribution(&self) -> &BTreeMap<String, u32> {
        &self.result.language_distribution
    }

    /// Freeze into the final, immutable result.
    pub fn finish(self) -> RunResult {
        self.result
    }
}
