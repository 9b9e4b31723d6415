//! Search request, response and analytics types.
//!
//! `SearchOptions` deserializes from the caller-facing field names
//! (`sortBy`, `includeSold`, `filters.minPrice`, ...) so it can be accepted
//! directly from a JSON request body.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::models::ListingRecord;

// =============================================================================
// OPTIONS
// =============================================================================

/// Result ordering requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Datastore rank for full-text results, newest first otherwise.
    #[default]
    Relevance,
    /// Newest listings first.
    Date,
    /// Cheapest first, unpriced listings last.
    Price,
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relevance" => Ok(Self::Relevance),
            "date" => Ok(Self::Date),
            "price" => Ok(Self::Price),
            other => Err(format!("unknown sort mode: {other}")),
        }
    }
}

/// Structured listing filters shared by every strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jenis_properti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Inclusive lower price bound.
    #[serde(
        default,
        rename = "minPrice",
        alias = "min_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_price: Option<i64>,
    /// Inclusive upper price bound.
    #[serde(
        default,
        rename = "maxPrice",
        alias = "max_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_price: Option<i64>,
}

impl ListingFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property_type(mut self, jenis: impl Into<String>) -> Self {
        self.jenis_properti = Some(jenis.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.jenis_properti.is_none()
            && self.status.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }
}

/// Caller options for a single search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Page size (default 20).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Page offset (default 0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(default)]
    pub filters: ListingFilters,
    #[serde(default)]
    pub sort_by: SortMode,
    /// Include sold listings (excluded unless explicitly true).
    #[serde(default)]
    pub include_sold: bool,
    /// Per-call datastore timeout overriding the engine default.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_filters(mut self, filters: ListingFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort_by: SortMode) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_include_sold(mut self, include: bool) -> Self {
        self.include_sold = include;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A user-initiated search: raw text, options and the caller's source tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub raw: String,
    #[serde(default)]
    pub options: SearchOptions,
    pub source: String,
}

impl SearchQuery {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            options: SearchOptions::default(),
            source: defaults::DEFAULT_SOURCE.to_string(),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

// =============================================================================
// INTENT
// =============================================================================

/// Coarse classification of a search term. Flags are independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIntent {
    pub has_location: bool,
    pub has_property_type: bool,
    pub has_price: bool,
    pub is_exact_code: bool,
}

// =============================================================================
// STRATEGY & RESPONSE
// =============================================================================

/// Strategy tier that produced a result set, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategyKind {
    Fts,
    Hybrid,
    Fallback,
}

impl SearchStrategyKind {
    /// All strategies in fallthrough order.
    pub const ORDERED: [SearchStrategyKind; 3] = [Self::Fts, Self::Hybrid, Self::Fallback];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fts => "fts",
            Self::Hybrid => "hybrid",
            Self::Fallback => "fallback",
        }
    }

    /// Position in the fallthrough order (0 = strongest).
    pub fn index(&self) -> usize {
        match self {
            Self::Fts => 0,
            Self::Hybrid => 1,
            Self::Fallback => 2,
        }
    }
}

impl fmt::Display for SearchStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analytics entry recorded once per search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnalyticsEvent {
    pub term: String,
    pub source: String,
    pub result_count: usize,
    pub duration_ms: u64,
    /// Winning strategy; `None` when no strategy completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<SearchStrategyKind>,
    /// Tiers that reached the datastore, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempted: Vec<SearchStrategyKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<ListingFilters>,
    pub timestamp: DateTime<Utc>,
    /// False for invalid, cancelled or failed searches.
    #[serde(default = "default_true")]
    pub completed: bool,
}

fn default_true() -> bool {
    true
}

impl SearchAnalyticsEvent {
    pub fn new(term: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            source: source.into(),
            result_count: 0,
            duration_ms: 0,
            strategy: None,
            attempted: Vec::new(),
            filters: None,
            timestamp: Utc::now(),
            completed: true,
        }
    }

    pub fn with_result_count(mut self, count: usize) -> Self {
        self.result_count = count;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    pub fn with_strategy(mut self, strategy: SearchStrategyKind) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_attempted(mut self, attempted: Vec<SearchStrategyKind>) -> Self {
        self.attempted = attempted;
        self
    }

    pub fn with_filters(mut self, filters: Option<ListingFilters>) -> Self {
        self.filters = filters;
        self
    }

    pub fn incomplete(mut self) -> Self {
        self.completed = false;
        self
    }
}

/// Successful search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<ListingRecord>,
    pub total_count: i64,
    pub strategy: SearchStrategyKind,
    pub analytics: SearchAnalyticsEvent,
}

/// Aggregate metrics over the analytics history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub total_searches: usize,
    /// Mean result count, rounded to two decimals.
    pub average_results: f64,
    /// Mean duration in milliseconds, rounded.
    pub average_duration_ms: u64,
    pub source_breakdown: BTreeMap<String, usize>,
    pub strategy_breakdown: BTreeMap<SearchStrategyKind, usize>,
    /// Percentage of searches with at least one result, two decimals.
    pub success_rate: f64,
    pub popular_searches: Vec<String>,
}
