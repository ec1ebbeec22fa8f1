//! Language detection for claim spans.
//!
//! CJK ideographs are shared between Chinese and Japanese, so a generic
//! statistical detector silently misclassifies Japanese patent claims as
//! Chinese. The fix is a script-priority override: Hiragana/Katakana code
//! points or Japanese-only patent boilerplate (`請求項…に記載の`) force `ja`
//! unconditionally, and pure-ideograph text with zero kana and zero Japanese
//! tokens is `zh` no matter how uncertain keyword scoring is.
//!
//! A cheap CJK-ratio pre-check short-circuits obviously-CJK text before the
//! latin keyword scorer runs.

use super::error::DetectError;
use super::types::Language;

/// Below this many non-whitespace characters detection is unreliable.
const MIN_DETECT_CHARS: usize = 10;

/// Share of CJK code points above which the text takes the CJK path
/// without consulting the latin keyword scorer.
const CJK_RATIO_THRESHOLD: f32 = 0.25;

/// Japanese-only patent boilerplate. These forms never occur in Chinese
/// claims (which use 权利要求/權利要求), so any hit forces `ja` even when
/// the span happens to contain no kana at all.
const JAPANESE_BOILERPLATE: &[&str] = &[
    "請求項",
    "に記載の",
    "のいずれか",
    "を特徴とする",
];

/// English stopwords and claim-boilerplate terms rarely found in the other
/// latin languages.
const ENGLISH_INDICATORS: &[&str] = &[
    "the ", " of ", " and ", " with ", " for ", " are ", " is ",
    "wherein", "comprising", "according to claim", "claim ", "claims ",
    "said ", "a method", "an apparatus", "a device", "a widget",
    "characterized in that", "configured to",
];

/// German stopwords and claim-boilerplate terms.
const GERMAN_INDICATORS: &[&str] = &[
    "der ", "die ", "das ", "und ", "mit ", "nach ", "einer ", "eines ",
    "anspruch", "ansprüche", "dadurch gekennzeichnet", "wobei ",
    "vorrichtung", "verfahren", "gemäß ",
];

/// French stopwords and claim-boilerplate terms.
const FRENCH_INDICATORS: &[&str] = &[
    "le ", "la ", "les ", "des ", "une ", "dans ", "pour ", "selon ",
    "revendication", "caractérisé en ce que", "caractérisée", "ladite ",
    "ledit ", "procédé", "dispositif", "comprenant",
];

/// Detect the dominant language of a claim span.
///
/// Fails only for too-short input or input with no classifiable signal;
/// callers handle both as "language unknown", never as fatal.
pub fn detect(text: &str) -> Result<Language, DetectError> {
    let length = text.chars().filter(|c| !c.is_whitespace()).count();
    if length < MIN_DETECT_CHARS {
        return Err(DetectError::TooShort {
            length,
            minimum: MIN_DETECT_CHARS,
        });
    }

    // Script-priority override: kana or Japanese-only boilerplate wins
    // over everything else, including the CJK ratio and keyword scores.
    let counts = ScriptCounts::of(text);
    if counts.kana > 0 || contains_japanese_boilerplate(text) {
        return Ok(Language::Ja);
    }

    // Fast pre-check: obviously-CJK text never reaches the latin scorer.
    if counts.cjk_ratio(length) >= CJK_RATIO_THRESHOLD {
        if counts.hangul > 0 && counts.hangul >= counts.han {
            return Ok(Language::Ko);
        }
        if counts.han > 0 {
            return Ok(Language::Zh);
        }
        return Ok(Language::Ko);
    }

    detect_latin(text)
}

/// Keyword-frequency scoring for the latin-script languages.
fn detect_latin(text: &str) -> Result<Language, DetectError> {
    let lower = text.to_lowercase();

    let en = count_indicators(&lower, ENGLISH_INDICATORS);
    let de = count_indicators(&lower, GERMAN_INDICATORS) + german_char_signal(&lower);
    let fr = count_indicators(&lower, FRENCH_INDICATORS) + french_char_signal(&lower);

    if en == 0 && de == 0 && fr == 0 {
        return Err(DetectError::NoSignal);
    }

    if de > en && de >= fr {
        Ok(Language::De)
    } else if fr > en && fr > de {
        Ok(Language::Fr)
    } else {
        Ok(Language::En)
    }
}

/// Count how many indicator patterns appear in the text.
fn count_indicators(lower_text: &str, indicators: &[&str]) -> u32 {
    let mut score = 0u32;
    for &indicator in indicators {
        score += lower_text.matches(indicator).count() as u32;
    }
    score
}

/// Umlauts and ß are a strong German signal. Each 2 occurrences = 1 point.
fn german_char_signal(lower_text: &str) -> u32 {
    let count = lower_text
        .chars()
        .filter(|c| matches!(c, 'ä' | 'ö' | 'ü' | 'ß'))
        .count() as u32;
    count / 2
}

/// French diacritics, weighted the same way as the German signal.
fn french_char_signal(lower_text: &str) -> u32 {
    let count = lower_text
        .chars()
        .filter(|c| {
            matches!(
                c,
                'é' | 'è' | 'ê' | 'ë' | 'ç' | 'ù' | 'û' | 'î' | 'ï' | 'ô' | 'à' | 'â' | 'œ'
            )
        })
        .count() as u32;
    count / 2
}

fn contains_japanese_boilerplate(text: &str) -> bool {
    JAPANESE_BOILERPLATE.iter().any(|token| text.contains(token))
}

/// Per-script code point counts for one span.
#[derive(Debug, Default)]
struct ScriptCounts {
    han: usize,
    kana: usize,
    hangul: usize,
}

impl ScriptCounts {
    fn of(text: &str) -> Self {
        let mut counts = Self::default();
        for c in text.chars() {
            if is_han(c) {
                counts.han += 1;
            } else if is_kana(c) {
                counts.kana += 1;
            } else if is_hangul(c) {
                counts.hangul += 1;
            }
        }
        counts
    }

    fn cjk_ratio(&self, non_whitespace_total: usize) -> f32 {
        if non_whitespace_total == 0 {
            return 0.0;
        }
        (self.han + self.kana + self.hangul) as f32 / non_whitespace_total as f32
    }
}

/// CJK Unified Ideographs (+ Extension A). Shared between zh and ja.
fn is_han(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

/// Hiragana, Katakana and halfwidth Katakana — unique to Japanese.
fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' | '\u{FF66}'..='\u{FF9D}')
}

/// Hangul syllables and jamo — unique to Korean.
fn is_hangul(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_short_input_fails_softly() {
        assert!(matches!(detect("短い"), Err(DetectError::TooShort { .. })));
        assert!(matches!(detect(""), Err(DetectError::TooShort { .. })));
    }

    #[test]
    fn detects_english_claim() {
        let text = "A widget comprising a base and a lever, wherein the base is round.";
        assert_eq!(detect(text), Ok(Language::En));
    }

    #[test]
    fn detects_chinese_claim() {
        let text = "一种部件，包括底座和杠杆，其特征在于底座为圆形。";
        assert_eq!(detect(text), Ok(Language::Zh));
    }

    #[test]
    fn detects_japanese_by_kana() {
        let text = "ベースとレバーとを備える部品であって、ベースが円形である。";
        assert_eq!(detect(text), Ok(Language::Ja));
    }

    #[test]
    fn kana_free_japanese_boilerplate_is_ja_not_zh() {
        // Zero Hiragana/Katakana — only the ja-only claim-reference idiom.
        // Without the boilerplate override this span reads as pure CJK
        // and would be misclassified as Chinese.
        let text = "請求項１記載装置。底座円形。部品構成要素全部金属製。";
        assert_eq!(detect(text), Ok(Language::Ja));
    }

    #[test]
    fn mixed_han_and_kana_is_japanese() {
        let text = "請求項1に記載の装置であって、前記底座が円形である装置。";
        assert_eq!(detect(text), Ok(Language::Ja));
    }

    #[test]
    fn detects_korean_claim() {
        let text = "베이스와 레버를 포함하는 부품으로서 베이스는 원형이다.";
        assert_eq!(detect(text), Ok(Language::Ko));
    }

    #[test]
    fn detects_german_claim() {
        let text = "Vorrichtung nach Anspruch 1, dadurch gekennzeichnet, dass die Basis rund ist.";
        assert_eq!(detect(text), Ok(Language::De));
    }

    #[test]
    fn detects_french_claim() {
        let text = "Dispositif selon la revendication 1, caractérisé en ce que la base est ronde.";
        assert_eq!(detect(text), Ok(Language::Fr));
    }

    #[test]
    fn no_signal_reported_for_numbers_only() {
        assert_eq!(detect("1234567890 42 99 100 200"), Err(DetectError::NoSignal));
    }

    #[test]
    fn cjk_ratio_short_circuits_latin_scoring() {
        // Mostly ideographs with a trailing latin unit — still Chinese.
        let text = "根据权利要求1所述的部件，其中底座的直径为10 mm。";
        assert_eq!(detect(text), Ok(Language::Zh));
    }

    #[test]
    fn script_counts_distinguish_blocks() {
        let counts = ScriptCounts::of("漢字かなカナ한글");
        assert_eq!(counts.han, 2);
        assert_eq!(counts.kana, 4);
        assert_eq!(counts.hangul, 2);
    }
}
