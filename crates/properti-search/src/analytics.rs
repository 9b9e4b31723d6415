//! Search analytics recorder.
//!
//! [`SearchAnalytics`] keeps a capped, newest-first history of search events
//! and a recency-promoted list of popular terms, and derives suggestions and
//! aggregate stats from them. It is an injected service: create one, share
//! it behind an `Arc`, and hand it to every engine that should record into
//! it.
//!
//! Persistence goes through an [`AnalyticsStore`]. Failures to persist are
//! logged and reported on the returned [`TrackReceipt`]; they never fail the
//! tracking call itself.

use std::collections::{BTreeMap, VecDeque};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use properti_core::defaults::{
    DEFAULT_POPULAR_SEARCHES, STATS_TOP_POPULAR, SUGGESTIONS_EMPTY_PREFIX,
    SUGGESTIONS_FROM_HISTORY, SUGGESTIONS_FROM_POPULAR,
};
use properti_core::{
    Error, ListingFilters, Result, SearchAnalyticsEvent, SearchStats,
};

use crate::config::AnalyticsConfig;

// =============================================================================
// TYPES
// =============================================================================

/// One entry of the popular-terms list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularTermEntry {
    pub term: String,
    pub count: u64,
    pub last_used: DateTime<Utc>,
}

impl PopularTermEntry {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            count: 1,
            last_used: Utc::now(),
        }
    }
}

/// Persisted analytics state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    #[serde(default)]
    pub history: Vec<SearchAnalyticsEvent>,
    #[serde(default)]
    pub popular: Vec<PopularTermEntry>,
}

/// Full analytics dump for offline inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsExport {
    pub search_history: Vec<SearchAnalyticsEvent>,
    pub popular_searches: Vec<PopularTermEntry>,
    pub stats: SearchStats,
    pub export_date: DateTime<Utc>,
}

/// A persistence failure that was absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistenceWarning {
    /// Store operation that failed ("load", "save" or "clear").
    pub operation: &'static str,
    pub store: &'static str,
    pub message: String,
}

/// Result of recording analytics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackReceipt {
    pub persistence_warning: Option<PersistenceWarning>,
}

impl TrackReceipt {
    pub fn is_persisted(&self) -> bool {
        self.persistence_warning.is_none()
    }
}

// =============================================================================
// STORES
// =============================================================================

/// Backing store for analytics state.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// Previously saved state, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<AnalyticsSnapshot>>;

    async fn save(&self, snapshot: &AnalyticsSnapshot) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

#[async_trait]
impl AnalyticsStore for NoopStore {
    async fn load(&self) -> Result<Option<AnalyticsSnapshot>> {
        Ok(None)
    }

    async fn save(&self, _snapshot: &AnalyticsSnapshot) -> Result<()> {
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Stores the snapshot as one JSON document.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write never leaves a truncated document behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl AnalyticsStore for JsonFileStore {
    async fn load(&self) -> Result<Option<AnalyticsSnapshot>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, snapshot: &AnalyticsSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "json_file"
    }
}

// =============================================================================
// RECORDER
// =============================================================================

#[derive(Debug, Default)]
struct AnalyticsState {
    /// Newest first.
    history: VecDeque<SearchAnalyticsEvent>,
    /// Most recently used first.
    popular: Vec<PopularTermEntry>,
}

impl AnalyticsState {
    fn snapshot(&self) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            history: self.history.iter().cloned().collect(),
            popular: self.popular.clone(),
        }
    }

    fn seed_popular(&mut self) {
        let now = Utc::now();
        self.popular = DEFAULT_POPULAR_SEARCHES
            .iter()
            .map(|term| PopularTermEntry {
                term: (*term).to_string(),
                count: 0,
                last_used: now,
            })
            .collect();
    }

    fn promote(&mut self, term: &str, at: DateTime<Utc>, capacity: usize) {
        let term = term.trim();
        if term.is_empty() {
            return;
        }
        let lower = term.to_lowercase();
        let entry = match self
            .popular
            .iter()
            .position(|e| e.term.to_lowercase() == lower)
        {
            Some(idx) => {
                let mut entry = self.popular.remove(idx);
                entry.count += 1;
                entry.last_used = at;
                entry
            }
            None => PopularTermEntry {
                term: term.to_string(),
                count: 1,
                last_used: at,
            },
        };
        self.popular.insert(0, entry);
        self.popular.truncate(capacity);
    }

    fn stats(&self) -> SearchStats {
        let popular_searches: Vec<String> = self
            .popular
            .iter()
            .take(STATS_TOP_POPULAR)
            .map(|e| e.term.clone())
            .collect();

        let total = self.history.len();
        if total == 0 {
            return SearchStats {
                popular_searches,
                ..Default::default()
            };
        }

        let mut source_breakdown = BTreeMap::new();
        let mut strategy_breakdown = BTreeMap::new();
        let mut result_sum = 0usize;
        let mut duration_sum = 0u64;
        let mut successful = 0usize;
        for event in &self.history {
            *source_breakdown.entry(event.source.clone()).or_insert(0) += 1;
            if let Some(strategy) = event.strategy {
                *strategy_breakdown.entry(strategy).or_insert(0) += 1;
            }
            result_sum += event.result_count;
            duration_sum += event.duration_ms;
            if event.result_count > 0 {
                successful += 1;
            }
        }

        let total_f = total as f64;
        SearchStats {
            total_searches: total,
            average_results: round2(result_sum as f64 / total_f),
            average_duration_ms: (duration_sum as f64 / total_f).round() as u64,
            source_breakdown,
            strategy_breakdown,
            success_rate: round2(successful as f64 / total_f * 100.0),
            popular_searches,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Search analytics recorder shared across engines.
pub struct SearchAnalytics {
    config: AnalyticsConfig,
    state: RwLock<AnalyticsState>,
    store: Arc<dyn AnalyticsStore>,
}

impl std::fmt::Debug for SearchAnalytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchAnalytics")
            .field("config", &self.config)
            .field("store", &self.store.name())
            .finish()
    }
}

impl Default for SearchAnalytics {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

impl SearchAnalytics {
    /// In-memory recorder.
    pub fn new(config: AnalyticsConfig) -> Self {
        Self::with_store(config, Arc::new(NoopStore))
    }

    /// Recorder persisting to `store`, starting empty (see [`Self::load`]).
    pub fn with_store(config: AnalyticsConfig, store: Arc<dyn AnalyticsStore>) -> Self {
        let mut state = AnalyticsState::default();
        if config.seed_popular {
            state.seed_popular();
        }
        Self {
            config,
            state: RwLock::new(state),
            store,
        }
    }

    /// Recorder restored from `store`.
    ///
    /// A failed load starts empty and is reported, not returned as an error.
    pub async fn load(
        config: AnalyticsConfig,
        store: Arc<dyn AnalyticsStore>,
    ) -> (Self, Option<PersistenceWarning>) {
        let recorder = Self::with_store(config, store);
        let warning = match recorder.store.load().await {
            Ok(Some(snapshot)) => {
                recorder.restore(snapshot).await;
                None
            }
            Ok(None) => None,
            Err(e) => Some(recorder.persistence_warning("load", &e)),
        };
        (recorder, warning)
    }

    /// Recorder for `config`: JSON-file backed when `config.file` is set.
    pub async fn from_config(config: AnalyticsConfig) -> (Self, Option<PersistenceWarning>) {
        let store: Arc<dyn AnalyticsStore> = match &config.file {
            Some(path) => Arc::new(JsonFileStore::new(path.clone())),
            None => Arc::new(NoopStore),
        };
        Self::load(config, store).await
    }

    async fn restore(&self, snapshot: AnalyticsSnapshot) {
        let mut state = self.state.write().await;
        state.history = snapshot
            .history
            .into_iter()
            .take(self.config.history_capacity)
            .collect();
        if !snapshot.popular.is_empty() || !self.config.seed_popular {
            state.popular = snapshot.popular;
            state.popular.truncate(self.config.popular_capacity);
        }
        debug!(
            subsystem = "search",
            component = "analytics",
            op = "load",
            history = state.history.len(),
            popular = state.popular.len(),
            "Analytics restored"
        );
    }

    fn persistence_warning(&self, operation: &'static str, error: &Error) -> PersistenceWarning {
        warn!(
            subsystem = "search",
            component = "analytics",
            op = operation,
            store = self.store.name(),
            error = %error,
            "Analytics persistence failed, continuing in memory"
        );
        PersistenceWarning {
            operation,
            store: self.store.name(),
            message: error.to_string(),
        }
    }

    /// Record one search event.
    pub async fn track(&self, event: SearchAnalyticsEvent) -> TrackReceipt {
        let mut state = self.state.write().await;

        state.promote(&event.term, event.timestamp, self.config.popular_capacity);
        state.history.push_front(event);
        state.history.truncate(self.config.history_capacity);

        let snapshot = state.snapshot();
        let persistence_warning = match self.store.save(&snapshot).await {
            Ok(()) => None,
            Err(e) => Some(self.persistence_warning("save", &e)),
        };
        TrackReceipt {
            persistence_warning,
        }
    }

    /// Record a search made outside the engine.
    pub async fn track_search(
        &self,
        term: &str,
        source: &str,
        result_count: usize,
        duration: Duration,
        filters: Option<ListingFilters>,
    ) -> TrackReceipt {
        let event = SearchAnalyticsEvent::new(term.trim(), source)
            .with_result_count(result_count)
            .with_duration(duration)
            .with_filters(filters);
        self.track(event).await
    }

    /// Suggestions for a partial term: recent matching searches, then
    /// matching popular terms.
    pub async fn suggestions(&self, partial: &str) -> Vec<String> {
        let state = self.state.read().await;
        let needle = partial.trim().to_lowercase();

        if needle.is_empty() {
            return state
                .popular
                .iter()
                .take(SUGGESTIONS_EMPTY_PREFIX)
                .map(|e| e.term.clone())
                .collect();
        }

        let mut history_matches: Vec<String> = Vec::new();
        for event in &state.history {
            if history_matches.len() == SUGGESTIONS_FROM_HISTORY {
                break;
            }
            if event.term.to_lowercase().contains(&needle) && !history_matches.contains(&event.term)
            {
                history_matches.push(event.term.clone());
            }
        }

        let popular_matches = state
            .popular
            .iter()
            .filter(|e| e.term.to_lowercase().contains(&needle))
            .take(SUGGESTIONS_FROM_POPULAR)
            .map(|e| e.term.clone());

        history_matches.extend(popular_matches);
        history_matches
    }

    pub async fn stats(&self) -> SearchStats {
        self.state.read().await.stats()
    }

    /// Events, newest first.
    pub async fn history(&self) -> Vec<SearchAnalyticsEvent> {
        self.state.read().await.history.iter().cloned().collect()
    }

    /// Popular entries, most recently used first.
    pub async fn popular(&self) -> Vec<PopularTermEntry> {
        self.state.read().await.popular.clone()
    }

    pub async fn popular_terms(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .popular
            .iter()
            .map(|e| e.term.clone())
            .collect()
    }

    /// Drop all history and popular terms, in memory and in the store.
    pub async fn clear(&self) -> TrackReceipt {
        let mut state = self.state.write().await;
        state.history.clear();
        state.popular.clear();

        let persistence_warning = match self.store.clear().await {
            Ok(()) => None,
            Err(e) => Some(self.persistence_warning("clear", &e)),
        };
        TrackReceipt {
            persistence_warning,
        }
    }

    pub async fn export(&self) -> AnalyticsExport {
        let state = self.state.read().await;
        AnalyticsExport {
            search_history: state.history.iter().cloned().collect(),
            popular_searches: state.popular.clone(),
            stats: state.stats(),
            export_date: Utc::now(),
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }
}
