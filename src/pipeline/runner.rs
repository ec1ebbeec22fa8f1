//! Per-cell pipeline composition.
//!
//! One cell flows through: preprocess → segment → per segment: normalize →
//! detect language → classify type → extract + resolve references → score →
//! [`ClaimRecord`]. The whole cell is a unit of failure isolation: the
//! orchestrator treats a `CellRunError` as a cell-level issue and moves on
//! to the next cell.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use thiserror::Error;

use crate::config::ScoreWeights;

use super::classify::{resolve_references, ClaimTypeClassifier};
use super::confidence;
use super::language;
use super::preprocess::preprocess;
use super::segment::{ClaimSegmenter, SegmentTier};
use super::types::{ClaimRecord, ClaimType, Language, ProcessingIssue};

/// A cell could not be processed. Isolated by the orchestrator; never
/// aborts the run.
#[derive(Error, Debug, Clone)]
#[error("cell processing failed: {0}")]
pub struct CellRunError(pub String);

/// Everything one cell produced.
#[derive(Debug, Clone)]
pub struct CellOutcome {
    pub claims: Vec<ClaimRecord>,
    pub issues: Vec<ProcessingIssue>,
}

/// Processes one raw cell into claim records.
///
/// Seam for the orchestrator: the production implementation is
/// [`PipelineCellRunner`]; tests inject failing or canned runners.
pub trait CellRunner: Send + Sync {
    fn run_cell(
        &self,
        index: usize,
        raw: &str,
        patent_number: Option<&str>,
    ) -> Result<CellOutcome, CellRunError>;
}

/// Production cell runner wiring the full pipeline together.
pub struct PipelineCellRunner {
    segmenter: ClaimSegmenter,
    classifier: ClaimTypeClassifier,
    weights: ScoreWeights,
}

impl Default for PipelineCellRunner {
    fn default() -> Self {
        Self::new(ScoreWeights::default())
    }
}

impl PipelineCellRunner {
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            segmenter: ClaimSegmenter::new(),
            classifier: ClaimTypeClassifier::new(),
            weights,
        }
    }
}

impl CellRunner for PipelineCellRunner {
    fn run_cell(
        &self,
        index: usize,
        raw: &str,
        patent_number: Option<&str>,
    ) -> Result<CellOutcome, CellRunError> {
        let patent = patent_number
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let text = preprocess(raw);
        if text.is_empty() {
            // One placeholder record per empty cell keeps row alignment
            // for downstream tabular exports.
            return Ok(CellOutcome {
                claims: vec![ClaimRecord::placeholder(index, patent)],
                issues: Vec::new(),
            });
        }

        let segmentation = self.segmenter.segment(&text);
        let mut issues = Vec::new();

        match segmentation.tier {
            SegmentTier::Salvage => {
                issues.push(ProcessingIssue::cell_warning(
                    index,
                    "no claim-numbering pattern matched; whole cell treated as claim 1",
                    "check the cell for unusual numbering or OCR damage",
                ));
            }
            SegmentTier::None => {
                issues.push(ProcessingIssue::cell_warning(
                    index,
                    "non-empty text contains no claim numbering and no digits",
                    "verify the selected column holds claim text",
                ));
                return Ok(CellOutcome {
                    claims: vec![ClaimRecord::placeholder(index, patent)],
                    issues,
                });
            }
            _ => {}
        }

        // Sibling number sets per language block, for reference resolution.
        let mut block_numbers: BTreeMap<usize, BTreeSet<u32>> = BTreeMap::new();
        for segment in &segmentation.segments {
            block_numbers
                .entry(segment.block)
                .or_default()
                .insert(segment.number);
        }

        let mut claims = Vec::with_capacity(segmentation.segments.len());
        for segment in &segmentation.segments {
            let body = self.segmenter.normalize(&segment.text);

            let lang = match language::detect(&body) {
                Ok(lang) => lang,
                Err(e) => {
                    tracing::debug!(
                        cell = index,
                        claim = segment.number,
                        reason = %e,
                        "language detection fell back to unknown"
                    );
                    Language::Other
                }
            };

            let claim_type = self.classifier.classify_type(&body, lang);

            let referenced = if claim_type == ClaimType::Dependent {
                match self.classifier.extract_references(&body, lang) {
                    Ok(refs) => {
                        let empty = BTreeSet::new();
                        let siblings = block_numbers.get(&segment.block).unwrap_or(&empty);
                        resolve_references(segment.number, &refs, siblings)
                    }
                    Err(e) => {
                        // Keep the dependent type with no references;
                        // partial information beats dropping the claim.
                        tracing::debug!(
                            cell = index,
                            claim = segment.number,
                            reason = %e,
                            "reference extraction failed on dependent claim"
                        );
                        Vec::new()
                    }
                }
            } else {
                Vec::new()
            };

            let confidence = confidence::score(&body, claim_type, &referenced, &self.weights);

            claims.push(ClaimRecord::new(
                segment.number,
                claim_type,
                body,
                lang,
                referenced,
                raw.to_string(),
                confidence,
                patent.clone(),
                Some(index),
            ));
        }

        Ok(CellOutcome { claims, issues })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> PipelineCellRunner {
        PipelineCellRunner::default()
    }

    #[test]
    fn two_english_claims_classified_and_linked() {
        let cell = "1. A widget comprising a base.\n2. The widget of claim 1, wherein the base is round.";
        let outcome = runner().run_cell(0, cell, None).unwrap();

        assert_eq!(outcome.claims.len(), 2);
        let first = &outcome.claims[0];
        assert_eq!(first.claim_number, 1);
        assert_eq!(first.claim_type, ClaimType::Independent);
        assert_eq!(first.language, Language::En);
        assert!(first.referenced_claims.is_empty());

        let second = &outcome.claims[1];
        assert_eq!(second.claim_number, 2);
        assert_eq!(second.claim_type, ClaimType::Dependent);
        assert_eq!(second.referenced_claims, vec![1]);
        assert_eq!(second.original_text, cell);
    }

    #[test]
    fn bilingual_cell_resolved_per_block() {
        let cell = "1. 一种部件，包括底座和安装在底座上的杠杆机构。\n\
                    2. 根据权利要求1所述的部件，其中底座为圆形。\n\
                    3. 根据权利要求1至2中任一项所述的部件，其中杠杆为金属制。\n\
                    1. A widget comprising a base and a lever mounted on the base.\n\
                    2. The widget of claim 1, wherein the base is round.\n\
                    3. The widget of any one of claims 1 to 2, wherein the lever is metal.";
        let outcome = runner().run_cell(0, cell, None).unwrap();

        assert_eq!(outcome.claims.len(), 6);
        let zh: Vec<_> = outcome
            .claims
            .iter()
            .filter(|c| c.language == Language::Zh)
            .collect();
        let en: Vec<_> = outcome
            .claims
            .iter()
            .filter(|c| c.language == Language::En)
            .collect();
        assert_eq!(zh.len(), 3);
        assert_eq!(en.len(), 3);

        // Each block resolves references within its own number set
        assert_eq!(zh[1].referenced_claims, vec![1]);
        assert_eq!(zh[2].referenced_claims, vec![1, 2]);
        assert_eq!(en[1].referenced_claims, vec![1]);
        assert_eq!(en[2].referenced_claims, vec![1, 2]);
    }

    #[test]
    fn preceding_claim_idiom_resolves_against_siblings() {
        let cell = "1. A widget comprising a base.\n\
                    2. The widget of claim 1 with a lever.\n\
                    3. The widget of claim 2 with a spring.\n\
                    4. The widget of claim 3 with a dial.\n\
                    5. The widget of any preceding claim, wherein the base is metal.";
        let outcome = runner().run_cell(0, cell, None).unwrap();

        let fifth = outcome
            .claims
            .iter()
            .find(|c| c.claim_number == 5)
            .expect("claim 5 present");
        assert_eq!(fifth.claim_type, ClaimType::Dependent);
        assert_eq!(fifth.referenced_claims, vec![1, 2, 3, 4]);
    }

    #[test]
    fn measurement_after_preceding_idiom_does_not_become_a_reference() {
        let cell = "1. A widget comprising a base.\n\
                    2. The widget of claim 1 with a lever.\n\
                    3. The widget of claim 2 with a spring.\n\
                    4. The widget of claim 3 with a dial.\n\
                    5. The widget of any preceding claim, wherein the diameter is 10 mm.";
        let outcome = runner().run_cell(0, cell, None).unwrap();

        let fifth = outcome
            .claims
            .iter()
            .find(|c| c.claim_number == 5)
            .expect("claim 5 present");
        assert_eq!(fifth.referenced_claims, vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_cell_yields_single_placeholder() {
        let outcome = runner().run_cell(3, "   \n  ", Some("US999")).unwrap();
        assert_eq!(outcome.claims.len(), 1);
        let p = &outcome.claims[0];
        assert_eq!(p.claim_number, 0);
        assert_eq!(p.confidence_score, 0.0);
        assert_eq!(p.language, Language::Other);
        assert_eq!(p.row_index, Some(3));
        assert_eq!(p.patent_number.as_deref(), Some("US999"));
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn salvage_cell_gets_warning_issue() {
        let outcome = runner()
            .run_cell(0, "a widget with 4 legs and no numbering", None)
            .unwrap();
        assert_eq!(outcome.claims.len(), 1);
        assert_eq!(outcome.claims[0].claim_number, 1);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(
            outcome.issues[0].severity,
            crate::pipeline::types::IssueSeverity::Warning
        );
    }

    #[test]
    fn digitless_cell_gets_placeholder_and_warning() {
        let outcome = runner().run_cell(2, "no digits in this text", None).unwrap();
        assert_eq!(outcome.claims.len(), 1);
        assert_eq!(outcome.claims[0].claim_number, 0);
        assert_eq!(outcome.issues.len(), 1);
    }

    #[test]
    fn failed_reference_extraction_keeps_dependent_type() {
        // Dependency phrase present but the number is garbled away
        let cell = "1. A widget comprising a base.\n2. The widget of claim , wherein broken.";
        let outcome = runner().run_cell(0, cell, None).unwrap();
        let second = &outcome.claims[1];
        assert_eq!(second.claim_type, ClaimType::Dependent);
        assert!(second.referenced_claims.is_empty());
    }

    #[test]
    fn kana_free_japanese_claim_detected_as_ja() {
        let cell = "1. 装置全体構成。底座円形。金属製部品。\n2. 請求項１記載装置。底座直径拡大。";
        let outcome = runner().run_cell(0, cell, None).unwrap();
        let second = &outcome.claims[1];
        assert_eq!(second.language, Language::Ja);
        assert_eq!(second.claim_type, ClaimType::Dependent);
        assert_eq!(second.referenced_claims, vec![1]);
    }

    #[test]
    fn records_stamped_with_row_and_patent() {
        let outcome = runner()
            .run_cell(7, "1. A widget comprising a base.", Some("EP0001"))
            .unwrap();
        assert_eq!(outcome.claims[0].row_index, Some(7));
        assert_eq!(outcome.claims[0].patent_number.as_deref(), Some("EP0001"));
    }
}
