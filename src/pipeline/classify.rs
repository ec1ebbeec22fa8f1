//! Independent/dependent classification and reference extraction.
//!
//! Classification is a closed per-language keyword table for the
//! "according to claim(s) N" idiom family — deterministic and explainable,
//! not a learned model. Reference extraction parses the numbers following
//! the dependency phrase into [`ClaimRef`] variants; the two wildcard idioms
//! ("any preceding claim", "any of the above claims") take precedence over
//! literal parsing and stay symbolic until [`resolve_references`] turns them
//! into concrete integers against the full sibling number set of the claim's
//! language block.

use std::collections::BTreeSet;

use regex::Regex;

use super::error::ReferenceError;
use super::segment::fold_digits;
use super::types::{ClaimRef, ClaimType, Language};

/// Dependency phrases per language. Presence of any phrase ⇒ dependent.
const EN_DEPENDENCY: &[&str] = &[
    "according to claim",
    "according to any",
    "as claimed in claim",
    "as claimed in any",
    "of claim",
    "of claims",
    "of any preceding claim",
    "of any one of claims",
    "of any of claims",
    "in claim",
    "as in claim",
    "as defined in claim",
];

const ZH_DEPENDENCY: &[&str] = &[
    "根据权利要求",
    "如权利要求",
    "按照权利要求",
    "依据权利要求",
    "根據權利要求",
    "如權利要求",
    "权利要求所述",
    "如前述权利要求",
];

const JA_DEPENDENCY: &[&str] = &["請求項"];

const DE_DEPENDENCY: &[&str] = &[
    "nach anspruch",
    "gemäß anspruch",
    "nach einem der ansprüche",
    "gemäß einem der ansprüche",
    "nach einem der vorhergehenden ansprüche",
];

const FR_DEPENDENCY: &[&str] = &[
    "selon la revendication",
    "selon l'une des revendications",
    "selon l'une quelconque des revendications",
    "selon les revendications",
];

const KO_DEPENDENCY: &[&str] = &["항에 있어서", "항에 기재된", "항에 따른"];

/// "Any preceding claim" idiom family ⇒ [`ClaimRef::Previous`].
const PREVIOUS_IDIOMS: &[&str] = &[
    "any preceding claim",
    "any of the preceding claims",
    "any one of the preceding claims",
    "the preceding claim",
    "einem der vorhergehenden ansprüche",
    "la revendication précédente",
    "l'une quelconque des revendications précédentes",
    "前述权利要求中任一",
    "前述权利要求之一",
    "先行するいずれかの請求項",
    "前記請求項のいずれか",
];

/// "Any of the above claims" idiom family ⇒ [`ClaimRef::All`].
const ALL_IDIOMS: &[&str] = &[
    "any of the above claims",
    "any one of the above claims",
    "any of the claims above",
    "any of the aforementioned claims",
    "上述任一权利要求",
    "上述权利要求中的任一项",
    "上記請求項のいずれか",
];

/// After a dependency phrase, numbers further away than this many characters
/// belong to the claim body (measurements, quantities), not the reference.
const REFERENCE_WINDOW_CHARS: usize = 60;

/// Classifies segmented claims and extracts their references.
pub struct ClaimTypeClassifier {
    /// `N`, optionally `N <range-sep> M` — ranges expand to every number.
    number_or_range: Regex,
}

impl Default for ClaimTypeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimTypeClassifier {
    pub fn new() -> Self {
        Self {
            number_or_range: Regex::new(
                r"(\d{1,3})(?:\s*(?:-|–|~|〜|至|から|\bbis\b|\bto\b|\bthrough\b|\bà\b)\s*(\d{1,3}))?",
            )
            .expect("static pattern"),
        }
    }

    /// Decide independent vs dependent from the per-language keyword table.
    ///
    /// For `Language::Other` every table is consulted — an undetected
    /// language must not hide an obvious dependency phrase.
    pub fn classify_type(&self, text: &str, language: Language) -> ClaimType {
        let lower = text.to_lowercase();
        let tables: &[&[&str]] = match language {
            Language::En => &[EN_DEPENDENCY],
            Language::Zh => &[ZH_DEPENDENCY],
            Language::Ja => &[JA_DEPENDENCY],
            Language::De => &[DE_DEPENDENCY],
            Language::Fr => &[FR_DEPENDENCY],
            Language::Ko => &[KO_DEPENDENCY],
            Language::Other => &[
                EN_DEPENDENCY,
                ZH_DEPENDENCY,
                JA_DEPENDENCY,
                DE_DEPENDENCY,
                FR_DEPENDENCY,
                KO_DEPENDENCY,
            ],
        };

        for table in tables {
            if table.iter().any(|phrase| lower.contains(phrase)) {
                return ClaimType::Dependent;
            }
        }
        ClaimType::Independent
    }

    /// Extract raw references from a claim already typed as dependent.
    ///
    /// The wildcard idiom families are checked before literal parsing: a
    /// body measurement after "any preceding claim" ("... wherein the
    /// diameter is 10 mm") must not shadow the idiom. Literal numbers and
    /// ranges are parsed only when no wildcard idiom is present.
    pub fn extract_references(
        &self,
        text: &str,
        language: Language,
    ) -> Result<Vec<ClaimRef>, ReferenceError> {
        let lower = fold_digits(&text.to_lowercase());

        if PREVIOUS_IDIOMS.iter().any(|idiom| lower.contains(idiom)) {
            return Ok(vec![ClaimRef::Previous]);
        }
        if ALL_IDIOMS.iter().any(|idiom| lower.contains(idiom)) {
            return Ok(vec![ClaimRef::All]);
        }

        let window = match self.reference_window(&lower, language) {
            Some(w) => w,
            None => return Err(ReferenceError::NoNumbersFound),
        };

        let literals = self.parse_numbers(&window)?;
        if !literals.is_empty() {
            return Ok(literals);
        }

        Err(ReferenceError::NoNumbersFound)
    }

    /// Text right after the first dependency-phrase hit, bounded so body
    /// numbers ("diameter of 10 mm") are not mistaken for references.
    fn reference_window(&self, lower: &str, language: Language) -> Option<String> {
        let tables: &[&[&str]] = match language {
            Language::En => &[EN_DEPENDENCY],
            Language::Zh => &[ZH_DEPENDENCY],
            Language::Ja => &[JA_DEPENDENCY],
            Language::De => &[DE_DEPENDENCY],
            Language::Fr => &[FR_DEPENDENCY],
            Language::Ko => &[KO_DEPENDENCY],
            Language::Other => &[
                EN_DEPENDENCY,
                ZH_DEPENDENCY,
                JA_DEPENDENCY,
                DE_DEPENDENCY,
                FR_DEPENDENCY,
                KO_DEPENDENCY,
            ],
        };

        let mut earliest: Option<usize> = None;
        for table in tables {
            for phrase in *table {
                if let Some(pos) = lower.find(phrase) {
                    let end = pos + phrase.len();
                    earliest = Some(earliest.map_or(end, |e| e.min(end)));
                }
            }
        }

        earliest.map(|start| {
            lower[start..]
                .chars()
                .take(REFERENCE_WINDOW_CHARS)
                .collect()
        })
    }

    /// Parse explicit numbers and ranges from a reference window.
    fn parse_numbers(&self, window: &str) -> Result<Vec<ClaimRef>, ReferenceError> {
        let mut refs = Vec::new();
        for caps in self.number_or_range.captures_iter(window) {
            let start: u32 = caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .ok_or_else(|| ReferenceError::NumberOutOfRange(window.to_string()))?;

            match caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) {
                Some(end) if end >= start => {
                    for n in start..=end {
                        refs.push(ClaimRef::Literal(n));
                    }
                }
                Some(_) | None => refs.push(ClaimRef::Literal(start)),
            }
        }
        refs.retain(|r| !matches!(r, ClaimRef::Literal(0)));
        Ok(refs)
    }
}

/// Resolve raw references to a concrete, sorted, deduplicated integer list.
///
/// Needs the full sibling number set of the claim's language block, which is
/// only known one layer above the classifier:
/// - `Previous` ⇒ every sibling strictly below `claim_number`;
/// - `All` ⇒ every sibling (minus the claim itself);
/// - `Literal(n)` ⇒ `n` as parsed.
pub fn resolve_references(
    claim_number: u32,
    refs: &[ClaimRef],
    siblings: &BTreeSet<u32>,
) -> Vec<u32> {
    let mut resolved = BTreeSet::new();
    for r in refs {
        match r {
            ClaimRef::Literal(n) => {
                resolved.insert(*n);
            }
            ClaimRef::Previous => {
                resolved.extend(siblings.iter().copied().filter(|&n| n < claim_number));
            }
            ClaimRef::All => {
                resolved.extend(siblings.iter().copied());
            }
        }
    }
    resolved.remove(&claim_number);
    resolved.into_iter().collect()
}
