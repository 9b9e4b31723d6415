//! Centralized default constants for properti-search.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// SANITIZER
// =============================================================================

/// Maximum characters kept from a raw search term.
pub const MAX_TERM_LENGTH: usize = 200;

/// Terms shorter than this are flagged (not rejected) by validation.
pub const MIN_TERM_LENGTH: usize = 2;

/// Terms longer than this are flagged (not rejected) by validation.
pub const LONG_TERM_WARNING_LENGTH: usize = 100;

/// One-character (and short) location abbreviations kept by term splitting.
pub const LOCATION_ABBREVIATIONS: &[&str] = &[
    "jl", "km", "rt", "rw", "no", "lt", "lb", "gg", "ds", "kp", "dk", "du", "tm",
];

// =============================================================================
// STRATEGY SELECTION
// =============================================================================

/// The full-text strategy is attempted when the sanitized term is longer
/// than this many characters (or carries a location/type signal).
pub const FTS_MIN_TERM_LENGTH: usize = 3;

/// PostgreSQL text search configuration for the listings `search_vector`.
pub const TEXT_SEARCH_CONFIG: &str = "indonesian";

/// Default per-call datastore timeout in milliseconds.
pub const QUERY_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for search results.
pub const PAGE_LIMIT_SEARCH: i64 = 20;

/// Upper bound on a caller-supplied page size.
pub const PAGE_LIMIT_MAX: i64 = 100;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

// =============================================================================
// ANALYTICS
// =============================================================================

/// Number of search events kept in the analytics history.
pub const HISTORY_CAPACITY: usize = 100;

/// Number of entries kept in the popular-terms list.
pub const POPULAR_CAPACITY: usize = 20;

/// Popular terms returned for an empty suggestion prefix.
pub const SUGGESTIONS_EMPTY_PREFIX: usize = 5;

/// History matches included in suggestions.
pub const SUGGESTIONS_FROM_HISTORY: usize = 3;

/// Popular-term matches appended after history matches.
pub const SUGGESTIONS_FROM_POPULAR: usize = 2;

/// Popular terms included in aggregate stats.
pub const STATS_TOP_POPULAR: usize = 10;

/// Source tag used when a caller does not identify itself.
pub const DEFAULT_SOURCE: &str = "api";

/// Seed list for the popular-terms list when nothing has been persisted.
pub const DEFAULT_POPULAR_SEARCHES: &[&str] = &[
    "rumah jogja",
    "tanah sleman",
    "apartemen yogyakarta",
    "ruko malioboro",
    "kost ugm",
    "villa jogja",
    "tanah bantul",
    "rumah jl kaliurang",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_ordering() {
        assert!(PAGE_LIMIT_SEARCH <= PAGE_LIMIT_MAX);
        assert_eq!(PAGE_OFFSET, 0);
    }

    #[test]
    fn test_term_length_bounds() {
        assert!(MIN_TERM_LENGTH < LONG_TERM_WARNING_LENGTH);
        assert!(LONG_TERM_WARNING_LENGTH < MAX_TERM_LENGTH);
    }

    #[test]
    fn test_suggestion_budget_fits_popular_list() {
        assert!(SUGGESTIONS_EMPTY_PREFIX <= POPULAR_CAPACITY);
        assert!(DEFAULT_POPULAR_SEARCHES.len() <= POPULAR_CAPACITY);
        assert!(STATS_TOP_POPULAR <= POPULAR_CAPACITY);
    }

    #[test]
    fn test_location_abbreviations_are_lowercase() {
        for abbr in LOCATION_ABBREVIATIONS {
            assert_eq!(*abbr, abbr.to_lowercase());
        }
    }
}
