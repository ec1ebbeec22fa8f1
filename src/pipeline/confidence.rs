//! Confidence scoring for one extracted claim.
//!
//! Pure additive heuristic: base score plus independently capped bonuses,
//! clamped to [0, 1]. Exists to let downstream consumers rank and filter
//! low-trust extractions, not to be statistically calibrated.

use crate::config::ScoreWeights;

use super::types::ClaimType;

/// Sentence-terminal punctuation across the supported languages.
const TERMINAL_PUNCTUATION: &[char] = &['.', '。', '．', '!', '！', '?', '？', ';', '；', '…'];

/// Score one claim. The result is always within [0.0, 1.0].
pub fn score(
    text: &str,
    claim_type: ClaimType,
    referenced_claims: &[u32],
    weights: &ScoreWeights,
) -> f32 {
    let mut total = weights.base;

    if text.chars().count() >= weights.min_length {
        total += weights.length_bonus;
    }

    let consistent = match claim_type {
        ClaimType::Dependent => !referenced_claims.is_empty(),
        ClaimType::Independent => referenced_claims.is_empty(),
    };
    if consistent {
        total += weights.consistency_bonus;
    }

    if text
        .trim_end()
        .chars()
        .last()
        .is_some_and(|c| TERMINAL_PUNCTUATION.contains(&c))
    {
        total += weights.terminal_bonus;
    }

    total.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w() -> ScoreWeights {
        ScoreWeights::default()
    }

    #[test]
    fn full_marks_for_clean_dependent_claim() {
        let s = score(
            "The widget of claim 1, wherein the base is round.",
            ClaimType::Dependent,
            &[1],
            &w(),
        );
        assert!((s - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn base_only_for_short_inconsistent_fragment() {
        // Short, dependent without references, no terminal punctuation
        let s = score("of claim", ClaimType::Dependent, &[], &w());
        assert!((s - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn length_bonus_requires_threshold() {
        let short = score("tiny claim", ClaimType::Independent, &[], &w());
        let long = score(
            "a claim body easily longer than the minimum threshold",
            ClaimType::Independent,
            &[],
            &w(),
        );
        assert!(long > short);
    }

    #[test]
    fn consistency_bonus_for_independent_without_refs() {
        let consistent = score("An apparatus.", ClaimType::Independent, &[], &w());
        let inconsistent = score("An apparatus.", ClaimType::Independent, &[1], &w());
        assert!(consistent > inconsistent);
    }

    #[test]
    fn cjk_terminal_punctuation_counts() {
        let s = score(
            "根据权利要求1所述的部件，其中底座为圆形。",
            ClaimType::Dependent,
            &[1],
            &w(),
        );
        assert!((s - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn score_never_exceeds_one() {
        let heavy = ScoreWeights {
            base: 0.9,
            length_bonus: 0.9,
            consistency_bonus: 0.9,
            terminal_bonus: 0.9,
            min_length: 1,
        };
        let s = score("A widget comprising a base.", ClaimType::Independent, &[], &heavy);
        assert!(s <= 1.0);
    }

    #[test]
    fn score_never_negative() {
        let odd = ScoreWeights {
            base: -2.0,
            ..ScoreWeights::default()
        };
        let s = score("x", ClaimType::Independent, &[], &odd);
        assert!(s >= 0.0);
    }
}
