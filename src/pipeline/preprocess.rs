//! Raw cell text normalization.
//!
//! First pipeline stage: unifies line endings, collapses blank lines and
//! repairs a small fixed table of mojibake sequences that show up when
//! UTF-8 spreadsheet exports get re-encoded through Windows-1252.
//!
//! Pure and deterministic — empty or whitespace-only input yields an empty
//! string, and no input ever fails.

/// Known mis-encoded punctuation sequences and their repairs.
///
/// Closed table on purpose: each entry is a re-encoding artifact observed in
/// real claim cells, not a general-purpose transcoder.
const MOJIBAKE_REPAIRS: &[(&str, &str)] = &[
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "–"),
    ("â€”", "—"),
    ("â€¦", "…"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ã¼", "ü"),
    ("Ã¶", "ö"),
    ("Ã¤", "ä"),
    ("ÃŸ", "ß"),
    ("Ã ", "à"),
    ("Â°", "°"),
    ("Â ", " "),
];

/// Normalize raw cell text for segmentation.
///
/// Steps, in order: mojibake repair, `\r\n`/`\r` → `\n`, per-line trim,
/// blank-line removal, outer trim.
pub fn preprocess(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let mut text = raw.to_string();
    for (broken, fixed) in MOJIBAKE_REPAIRS {
        if text.contains(broken) {
            text = text.replace(broken, fixed);
        }
    }

    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let lines: Vec<&str> = unified
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines.join("\n")
}
