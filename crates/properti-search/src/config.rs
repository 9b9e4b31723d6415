//! Engine and analytics configuration.
//!
//! Every knob has a default from [`properti_core::defaults`] and can be
//! overridden through environment variables, so a deployment can tune the
//! full-text gate or timeouts without a rebuild.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use properti_core::defaults;
use properti_core::SearchIntent;

/// Policy deciding whether the full-text tier is attempted for a term.
///
/// The tier runs when the sanitized term is longer than `min_length`
/// characters, or when `use_intent` is set and the term carries a location,
/// property-type or exact-code signal.
///
/// # Example
/// ```
/// use properti_search::config::FtsActivation;
/// use properti_core::SearchIntent;
///
/// let policy = FtsActivation::default();
/// assert!(policy.should_attempt("rumah", &SearchIntent::default()));
/// assert!(!policy.should_attempt("abc", &SearchIntent::default()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtsActivation {
    pub min_length: usize,
    pub use_intent: bool,
}

impl Default for FtsActivation {
    fn default() -> Self {
        Self {
            min_length: defaults::FTS_MIN_TERM_LENGTH,
            use_intent: true,
        }
    }
}

impl FtsActivation {
    /// Never attempt the full-text tier.
    pub fn disabled() -> Self {
        Self {
            min_length: usize::MAX,
            use_intent: false,
        }
    }

    pub fn should_attempt(&self, term: &str, intent: &SearchIntent) -> bool {
        if term.chars().count() > self.min_length {
            return true;
        }
        self.use_intent
            && (intent.has_location || intent.has_property_type || intent.is_exact_code)
    }
}

/// Search engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEngineConfig {
    /// PostgreSQL text search configuration used by the full-text tier.
    pub text_search_config: String,
    pub fts_activation: FtsActivation,
    /// Per-call datastore timeout when the caller sets none.
    pub query_timeout: Duration,
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for SearchEngineConfig {
    fn default() -> Self {
        Self {
            text_search_config: defaults::TEXT_SEARCH_CONFIG.to_string(),
            fts_activation: FtsActivation::default(),
            query_timeout: Duration::from_millis(defaults::QUERY_TIMEOUT_MS),
            default_limit: defaults::PAGE_LIMIT_SEARCH,
            max_limit: defaults::PAGE_LIMIT_MAX,
        }
    }
}

impl SearchEngineConfig {
    /// Constructs the configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SEARCH_TEXT_CONFIG` (default: "indonesian")
    /// - `SEARCH_FTS_MIN_LENGTH` (default: 3)
    /// - `SEARCH_FTS_USE_INTENT` (default: true)
    /// - `SEARCH_QUERY_TIMEOUT_MS` (default: 5000)
    /// - `SEARCH_DEFAULT_LIMIT` (default: 20)
    /// - `SEARCH_MAX_LIMIT` (default: 100)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_limit = parse_env("SEARCH_MAX_LIMIT", defaults.max_limit).max(1);
        Self {
            text_search_config: env::var("SEARCH_TEXT_CONFIG")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.text_search_config),
            fts_activation: FtsActivation {
                min_length: parse_env("SEARCH_FTS_MIN_LENGTH", defaults.fts_activation.min_length),
                use_intent: parse_bool_env(
                    "SEARCH_FTS_USE_INTENT",
                    defaults.fts_activation.use_intent,
                ),
            },
            query_timeout: Duration::from_millis(parse_env(
                "SEARCH_QUERY_TIMEOUT_MS",
                defaults::QUERY_TIMEOUT_MS,
            )),
            default_limit: parse_env("SEARCH_DEFAULT_LIMIT", defaults.default_limit)
                .clamp(1, max_limit),
            max_limit,
        }
    }

    pub fn with_text_search_config(mut self, config: impl Into<String>) -> Self {
        self.text_search_config = config.into();
        self
    }

    pub fn with_fts_activation(mut self, activation: FtsActivation) -> Self {
        self.fts_activation = activation;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_limits(mut self, default_limit: i64, max_limit: i64) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }
}

/// Analytics recorder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsConfig {
    pub history_capacity: usize,
    pub popular_capacity: usize,
    /// Seed the popular list with the default searches when nothing was loaded.
    pub seed_popular: bool,
    /// JSON file used for persistence; `None` keeps analytics in memory only.
    pub file: Option<PathBuf>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            history_capacity: defaults::HISTORY_CAPACITY,
            popular_capacity: defaults::POPULAR_CAPACITY,
            seed_popular: true,
            file: None,
        }
    }
}

impl AnalyticsConfig {
    /// Constructs the configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SEARCH_HISTORY_CAPACITY` (default: 100)
    /// - `SEARCH_POPULAR_CAPACITY` (default: 20)
    /// - `SEARCH_ANALYTICS_FILE` (default: unset, in-memory only)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            history_capacity: parse_env("SEARCH_HISTORY_CAPACITY", defaults.history_capacity),
            popular_capacity: parse_env("SEARCH_POPULAR_CAPACITY", defaults.popular_capacity),
            seed_popular: defaults.seed_popular,
            file: env::var("SEARCH_ANALYTICS_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn with_capacities(mut self, history: usize, popular: usize) -> Self {
        self.history_capacity = history;
        self.popular_capacity = popular;
        self
    }

    pub fn with_seed_popular(mut self, seed: bool) -> Self {
        self.seed_popular = seed;
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses a boolean environment variable with a default fallback.
///
/// Recognizes "true", "1", "yes", "on" (case-insensitive) as true.
/// Any other value or missing variable returns the default.
fn parse_bool_env(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|val| match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}
