//! Search input sanitization, validation and intent detection.
//!
//! All functions here are pure. [`sanitize`] is idempotent and its output
//! never contains `<`, `>` or C0/C1 control characters.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use properti_core::defaults::{
    LOCATION_ABBREVIATIONS, LONG_TERM_WARNING_LENGTH, MAX_TERM_LENGTH, MIN_TERM_LENGTH,
};
use properti_core::SearchIntent;

static LOCATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(jl|jalan|kaliurang|malioboro|ugm|sleman|yogyakarta|jogja|bantul)\b")
        .expect("valid regex")
});

static PROPERTY_TYPE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(rumah|kost|apartemen|tanah|ruko|villa|gedung)\b").expect("valid regex")
});

static PRICE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(juta|milyar|miliar|jt|m)\b").expect("valid regex"));

/// Listing codes such as `R8.01`, `K9.02`, `T53` or `KAL001`.
static EXACT_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z]{1,3}\d{1,4}(\.\d{1,4})?$").expect("valid regex"));

/// Letters, digits, underscore, whitespace and basic punctuation.
static ALLOWED_CHARS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\s.,\-()&]+$").expect("valid regex"));

pub const WARNING_EMPTY: &str = "Search term is empty or invalid";
pub const WARNING_TOO_SHORT: &str = "Search term is too short";
pub const WARNING_TOO_LONG: &str = "Search term is too long";
pub const WARNING_INVALID_CHARS: &str = "Search term contains invalid characters";

pub const SUGGESTION_ALLOWED_CHARS: &str =
    "Use only letters, numbers, spaces, and basic punctuation";
pub const SUGGESTION_EXACT_CODE: &str =
    "Searching by property code - this will find exact matches only";
pub const SUGGESTION_ADD_CONTEXT: &str =
    "Try adding location (e.g., \"jogja\", \"sleman\") or property type (e.g., \"rumah\", \"kost\")";

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// False only when the sanitized term is empty.
    pub is_valid: bool,
    pub sanitized_term: String,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}')
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Normalize a raw search term.
///
/// Trims, strips `<`/`>` and control characters, caps the length, removes
/// diacritics (NFD then drop U+0300..U+036F) and collapses whitespace runs.
///
/// ```
/// use properti_search::sanitizer::sanitize;
///
/// assert_eq!(sanitize("  <b>Condongcatur</b>   é "), "bCondongcatur/b e");
/// ```
pub fn sanitize(raw: &str) -> String {
    let stripped: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '<' && *c != '>' && !is_stripped_control(*c))
        .collect();

    let decomposed: String = truncate_chars(&stripped, MAX_TERM_LENGTH)
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let collapsed = decomposed.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, MAX_TERM_LENGTH).trim().to_string()
}

/// Sanitize and assess a raw term. Never fails; only an empty result is invalid.
pub fn validate(raw: &str) -> ValidationResult {
    let sanitized = sanitize(raw);
    if sanitized.is_empty() {
        return ValidationResult {
            is_valid: false,
            sanitized_term: sanitized,
            warnings: vec![WARNING_EMPTY.to_string()],
            suggestions: Vec::new(),
        };
    }

    let mut warnings = Vec::new();
    let mut suggestions = Vec::new();
    let length = sanitized.chars().count();

    if length < MIN_TERM_LENGTH {
        warnings.push(WARNING_TOO_SHORT.to_string());
    }
    if length > LONG_TERM_WARNING_LENGTH {
        warnings.push(WARNING_TOO_LONG.to_string());
    }
    if !ALLOWED_CHARS_PATTERN.is_match(&sanitized) {
        warnings.push(WARNING_INVALID_CHARS.to_string());
        suggestions.push(SUGGESTION_ALLOWED_CHARS.to_string());
    }

    let intent = detect_intent(&sanitized);
    if intent.is_exact_code {
        suggestions.push(SUGGESTION_EXACT_CODE.to_string());
    }
    if !intent.has_location && !intent.has_property_type {
        suggestions.push(SUGGESTION_ADD_CONTEXT.to_string());
    }

    ValidationResult {
        is_valid: true,
        sanitized_term: sanitized,
        warnings,
        suggestions,
    }
}

/// Classify a term by location, property type, price unit and listing code.
pub fn detect_intent(term: &str) -> SearchIntent {
    SearchIntent {
        has_location: LOCATION_PATTERN.is_match(term),
        has_property_type: PROPERTY_TYPE_PATTERN.is_match(term),
        has_price: PRICE_PATTERN.is_match(term),
        is_exact_code: is_exact_code(term),
    }
}

/// Whether the whole trimmed term is a listing code.
pub fn is_exact_code(term: &str) -> bool {
    EXACT_CODE_PATTERN.is_match(term.trim())
}

/// Keep words of two or more characters, and known location abbreviations.
pub fn should_include_word(word: &str) -> bool {
    match word.chars().count() {
        0 => false,
        n if n >= 2 => true,
        _ => LOCATION_ABBREVIATIONS.contains(&word.to_lowercase().as_str()),
    }
}

/// Split a term into lowercase words kept by [`should_include_word`], in order.
pub fn split_terms(term: &str) -> Vec<String> {
    term.split_whitespace()
        .filter(|w| should_include_word(w))
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_markup_and_controls() {
        let out = sanitize("<script>alert(1)</script>\u{0007} rumah\u{009B}");
        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert!(!out.chars().any(is_stripped_control));
        assert_eq!(out, "scriptalert(1)/script rumah");
    }

    #[test]
    fn test_sanitize_removes_diacritics() {
        assert_eq!(sanitize("Condongcatur é"), "Condongcatur e");
        assert_eq!(sanitize("Pondok Ñgaglik"), "Pondok Ngaglik");
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize("  rumah \t\n  sleman  "), "rumah sleman");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "Condongcatur é",
            "  a\u{0001} ",
            "x\u{0009}\u{0009}y",
            "<<rumah>>",
            &"é".repeat(250),
            &format!("{} é", "a".repeat(198)),
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "a".repeat(500);
        assert_eq!(sanitize(&long).chars().count(), MAX_TERM_LENGTH);
    }

    #[test]
    fn test_sanitize_control_chars_only_is_empty() {
        assert_eq!(sanitize("\u{0000}\u{001F}\u{007F}"), "");
        assert_eq!(sanitize("<>"), "");
    }

    #[test]
    fn test_validate_empty() {
        let result = validate("   ");
        assert!(!result.is_valid);
        assert_eq!(result.warnings, vec![WARNING_EMPTY.to_string()]);
        assert!(result.sanitized_term.is_empty());
    }

    #[test]
    fn test_validate_flags_without_rejecting() {
        let short = validate("a");
        assert!(short.is_valid);
        assert!(short.warnings.contains(&WARNING_TOO_SHORT.to_string()));

        let long = validate(&"rumah ".repeat(30));
        assert!(long.is_valid);
        assert!(long.warnings.contains(&WARNING_TOO_LONG.to_string()));

        let odd = validate("rumah @ sleman!");
        assert!(odd.is_valid);
        assert!(odd.warnings.contains(&WARNING_INVALID_CHARS.to_string()));
        assert!(odd.suggestions.contains(&SUGGESTION_ALLOWED_CHARS.to_string()));
    }

    #[test]
    fn test_validate_suggestions() {
        let code = validate("R8.01");
        assert!(code.suggestions.contains(&SUGGESTION_EXACT_CODE.to_string()));
        assert!(code.suggestions.contains(&SUGGESTION_ADD_CONTEXT.to_string()));

        let contextual = validate("rumah sleman");
        assert!(contextual.warnings.is_empty());
        assert!(contextual.suggestions.is_empty());
    }

    #[test]
    fn test_detect_intent_all_flags() {
        let intent = detect_intent("rumah sleman 500 juta");
        assert!(intent.has_property_type);
        assert!(intent.has_location);
        assert!(intent.has_price);
        assert!(!intent.is_exact_code);
    }

    #[test]
    fn test_detect_intent_is_word_bounded() {
        let intent = detect_intent("rumahku di slemanan");
        assert!(!intent.has_property_type);
        assert!(!intent.has_location);

        assert!(detect_intent("harga 2 M").has_price);
        assert!(!detect_intent("minimalis").has_price);
        assert!(detect_intent("KOST Bantul").has_location);
    }

    #[test]
    fn test_exact_code_formats() {
        for code in ["R8.01", "K9.02", "T53", "KAL001", "r8.01", " V12 "] {
            assert!(is_exact_code(code), "{code} should be a code");
        }
        for not_code in ["rumah", "R8.", "ABCD1", "R12345", "8R", "R8.01 sleman"] {
            assert!(!is_exact_code(not_code), "{not_code} should not be a code");
        }
    }

    #[test]
    fn test_should_include_word() {
        assert!(should_include_word("km"));
        assert!(should_include_word("rumah"));
        assert!(!should_include_word("a"));
        assert!(!should_include_word(""));
    }

    #[test]
    fn test_split_terms() {
        assert_eq!(
            split_terms("Rumah  Jl Kaliurang a KM 5"),
            vec!["rumah", "jl", "kaliurang", "km"]
        );
        assert!(split_terms("   ").is_empty());
    }
}
