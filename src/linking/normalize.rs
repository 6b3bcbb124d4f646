//! Text canonicalization for comparison.
//!
//! Normalized text is only ever used for scoring; adapters send the caller's
//! original spelling to the providers.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Characters replaced by a space. Parentheses and brackets are not in this
/// set: "(Live)" or "[Remastered]" distinguish recordings.
const SEPARATORS: &[char] = &[
    '.', ',', ';', ':', '!', '?', '"', '-', '\u{2010}', '\u{2013}', '\u{2014}', '_', '/', '\\', '*',
    '~', '#', '|', '+', '=', '<', '>', '\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}', '\u{2026}',
];

/// Characters dropped without leaving a gap ("Don't" -> "dont").
const APOSTROPHES: &[char] = &['\'', '`', '\u{2018}', '\u{2019}', '\u{00B4}'];

/// Canonicalize free text: fold case, strip diacritics, drop punctuation,
/// collapse whitespace.
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());

    // Lowercase on both sides of NFKD: compatibility forms can decompose to
    // capitals, and some capitals lowercase to a base plus combining mark.
    let decomposed = text.chars().flat_map(char::to_lowercase).nfkd();

    for c in decomposed.filter(|c| !is_combining_mark(*c)) {
        if APOSTROPHES.contains(&c) {
            continue;
        }
        if c == '&' {
            folded.push_str(" and ");
        } else if SEPARATORS.contains(&c) || c.is_whitespace() {
            folded.push(' ');
        } else {
            folded.extend(c.to_lowercase());
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize an optional field; absent input maps to an empty string.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

/// Canonical form of an opaque registry id (MBIDs are case-insensitive UUIDs).
pub fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Canonical form of a recording code: ISRCs are often written with
/// hyphens or spaces ("GB-UM7-10-29604").
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}
