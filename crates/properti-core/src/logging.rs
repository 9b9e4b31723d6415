//! Structured logging schema and field name constants for properti-search.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same field names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (records, conditions) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "search", "db", "analytics", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "engine", "pipeline", "listing_store", "pool", "recorder"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "search", "execute", "track", "persist"
pub const OPERATION: &str = "op";

/// Caller source tag attached to a search.
pub const SOURCE: &str = "source";

// ─── Search fields ─────────────────────────────────────────────────────────

/// Sanitized search term.
pub const QUERY: &str = "query";

/// Strategy tier ("fts", "hybrid", "fallback").
pub const STRATEGY: &str = "strategy";

/// Pipeline state of a strategy after it ran.
pub const STRATEGY_STATE: &str = "strategy_state";

/// Number of OR-combined pattern conditions in a hybrid/fallback query.
pub const CONDITION_COUNT: &str = "condition_count";

/// Text search configuration used by the full-text strategy.
pub const TEXT_SEARCH_CONFIG: &str = "text_search_config";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or query.
pub const RESULT_COUNT: &str = "result_count";

/// Exact total row count matching a query (before pagination).
pub const TOTAL_COUNT: &str = "total_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_snake_case() {
        for field in [
            SUBSYSTEM,
            COMPONENT,
            SOURCE,
            QUERY,
            STRATEGY,
            STRATEGY_STATE,
            CONDITION_COUNT,
            TEXT_SEARCH_CONFIG,
            DURATION_MS,
            RESULT_COUNT,
            TOTAL_COUNT,
            POOL_SIZE,
            POOL_IDLE,
            SUCCESS,
            ERROR_MSG,
            SLOW,
        ] {
            assert!(
                field.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "field {field} should be snake_case"
            );
        }
        assert_eq!(OPERATION, "op");
    }
}
