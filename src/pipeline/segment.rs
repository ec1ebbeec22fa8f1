//! Claim segmentation — splits a preprocessed cell into numbered spans.
//!
//! A single cell commonly holds two or more full language versions of the
//! same claim set, concatenated and each independently numbered 1..k. The
//! segmenter therefore never assumes numbers are unique or monotonically
//! increasing: a number dropping back to 1 marks the start of a new language
//! block. Every span is still emitted individually with its own number —
//! the restart is a parsing signal, not a merge instruction.
//!
//! Three tiers, each an explicit empty-result check (no error-driven
//! fallback):
//! 1. line-anchored numbering tokens (`1.`, `1、`, `1：`, `1）`, …)
//! 2. loose: digit + separator anywhere, then digit + colon
//! 3. salvage: text containing at least one digit becomes a single claim
//!    numbered 1 — non-empty text is never silently dropped.

use regex::Regex;

/// One span attributed to a claim number, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSegment {
    pub number: u32,
    pub text: String,
    /// Language-block ordinal within the cell. Increments every time the
    /// numbering sequence restarts at 1. Reference resolution uses the
    /// sibling numbers of the claim's own block only.
    pub block: usize,
}

/// Which tier produced the segments. `Salvage` cells get a warning issue
/// from the orchestration layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentTier {
    Primary,
    Loose,
    Colon,
    Salvage,
    /// Nothing matched and the text holds no digit at all.
    None,
}

/// Segmentation output: spans in discovery order plus the tier that found them.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub segments: Vec<ClaimSegment>,
    pub tier: SegmentTier,
}

impl Segmentation {
    fn empty() -> Self {
        Self {
            segments: Vec::new(),
            tier: SegmentTier::None,
        }
    }
}

/// Splits preprocessed text into numbered claim spans. Never fails.
pub struct ClaimSegmenter {
    /// `N.` / `N、` / `N：` / `N）` at line start.
    primary: Regex,
    /// Dot/enumeration/paren tokens, anywhere in the text.
    loose: Regex,
    /// Digit + colon, anywhere.
    colon: Regex,
    /// Leading numbering prefix, stripped by [`normalize`].
    prefix: Regex,
}

impl Default for ClaimSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimSegmenter {
    pub fn new() -> Self {
        Self {
            primary: Regex::new(r"(?m)^\s*([0-9０-９]{1,3})\s*[.、．:：)）]\s*")
                .expect("static pattern"),
            loose: Regex::new(r"([0-9０-９]{1,3})\s*[.、．)）]\s*").expect("static pattern"),
            colon: Regex::new(r"([0-9０-９]{1,3})\s*[:：]\s*").expect("static pattern"),
            prefix: Regex::new(r"^\s*[0-9０-９]{1,3}\s*[.、．:：)）]\s*").expect("static pattern"),
        }
    }

    /// Segment text into claim spans, reporting which tier matched.
    ///
    /// Returns an empty segment list (tier `None`) only for input that holds
    /// no digit at all — the caller decides whether that is an error.
    pub fn segment(&self, text: &str) -> Segmentation {
        if text.trim().is_empty() {
            return Segmentation::empty();
        }

        for (pattern, tier) in [
            (&self.primary, SegmentTier::Primary),
            (&self.loose, SegmentTier::Loose),
            (&self.colon, SegmentTier::Colon),
        ] {
            let segments = self.split_at_tokens(text, pattern);
            if !segments.is_empty() {
                return Segmentation { segments, tier };
            }
        }

        // Last-resort salvage: one claim, numbered 1.
        if text.chars().any(|c| c.is_ascii_digit() || is_fullwidth_digit(c)) {
            let body = text.trim().to_string();
            if !body.is_empty() {
                return Segmentation {
                    segments: vec![ClaimSegment {
                        number: 1,
                        text: body,
                        block: 0,
                    }],
                    tier: SegmentTier::Salvage,
                };
            }
        }

        Segmentation::empty()
    }

    /// Split text at every numbering-token match, keying each span by the
    /// leading number and capturing everything up to the next token.
    fn split_at_tokens(&self, text: &str, pattern: &Regex) -> Vec<ClaimSegment> {
        struct Token {
            number: u32,
            body_start: usize,
            token_start: usize,
        }

        let mut tokens = Vec::new();
        for caps in pattern.captures_iter(text) {
            let whole = caps.get(0);
            let digits = caps.get(1);
            let (Some(whole), Some(digits)) = (whole, digits) else {
                continue;
            };
            let Some(number) = parse_claim_number(digits.as_str()) else {
                continue;
            };
            if number == 0 {
                continue;
            }
            tokens.push(Token {
                number,
                body_start: whole.end(),
                token_start: whole.start(),
            });
        }

        let mut segments: Vec<ClaimSegment> = Vec::new();
        let mut block = 0usize;
        let mut prev_number: Option<u32> = None;

        for (i, token) in tokens.iter().enumerate() {
            let body_end = tokens
                .get(i + 1)
                .map(|next| next.token_start)
                .unwrap_or(text.len());
            let body = text[token.body_start..body_end].trim();
            if body.is_empty() {
                continue;
            }

            // Sequence restart: the numbering dropped back to 1 after an
            // earlier claim — a new language block begins here.
            if token.number == 1 && prev_number.is_some() {
                block += 1;
                tracing::debug!(block, "claim numbering restarted, new language block");
            }
            prev_number = Some(token.number);

            segments.push(ClaimSegment {
                number: token.number,
                text: body.to_string(),
                block,
            });
        }

        segments
    }

    /// Strip a leading numbering prefix and outer whitespace from a span.
    ///
    /// Idempotent: strips repeatedly until a fixed point, so applying it to
    /// its own output changes nothing.
    pub fn normalize(&self, span: &str) -> String {
        let mut current = span.trim().to_string();
        loop {
            let stripped = self.prefix.replace(&current, "").trim().to_string();
            if stripped == current {
                return current;
            }
            current = stripped;
        }
    }
}

/// Parse a claim number, accepting fullwidth digits (`１２３`).
fn parse_claim_number(digits: &str) -> Option<u32> {
    let ascii: String = digits.chars().map(fold_digit).collect();
    ascii.parse::<u32>().ok()
}

fn fold_digit(c: char) -> char {
    if is_fullwidth_digit(c) {
        char::from_u32(c as u32 - 0xFF10 + '0' as u32).unwrap_or(c)
    } else {
        c
    }
}

fn is_fullwidth_digit(c: char) -> bool {
    ('\u{FF10}'..='\u{FF19}').contains(&c)
}

/// Fold fullwidth digits to ASCII across a whole string.
pub(crate) fn fold_digits(text: &str) -> String {
    text.chars().map(fold_digit).collect()
}
