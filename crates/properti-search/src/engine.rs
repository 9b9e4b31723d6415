//! Property search engine.
//!
//! Runs the sanitizer, walks the strategy pipeline (full-text, hybrid,
//! fallback) against a [`ListingStore`], and records exactly one analytics
//! event per call, whether the search succeeded, was rejected, cancelled or
//! failed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn, Span};

use properti_core::{
    Error, ListingFilters, ListingPage, ListingQuery, ListingStore, Result, SearchAnalyticsEvent,
    SearchOptions, SearchQuery, SearchResponse, SearchStrategyKind,
};

use crate::analytics::SearchAnalytics;
use crate::assembler::ResultAssembler;
use crate::config::SearchEngineConfig;
use crate::pipeline::{Step, StrategyPipeline, StrategyState};
use crate::sanitizer::{detect_intent, sanitize, validate};

/// Hybrid property search engine over a listing store.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use properti_search::{SearchAnalytics, SearchEngine, SearchOptions};
///
/// let analytics = Arc::new(SearchAnalytics::default());
/// let engine = SearchEngine::new(store).with_analytics(analytics.clone());
///
/// let response = engine.search("rumah sleman", SearchOptions::default()).await?;
/// println!("{} via {}", response.total_count, response.strategy);
/// ```
pub struct SearchEngine<S> {
    store: S,
    config: SearchEngineConfig,
    assembler: ResultAssembler,
    analytics: Arc<SearchAnalytics>,
}

impl<S: ListingStore> SearchEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, SearchEngineConfig::default())
    }

    pub fn with_config(store: S, config: SearchEngineConfig) -> Self {
        Self {
            store,
            assembler: ResultAssembler::new(&config),
            config,
            analytics: Arc::new(SearchAnalytics::default()),
        }
    }

    /// Record into a shared analytics recorder.
    pub fn with_analytics(mut self, analytics: Arc<SearchAnalytics>) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn analytics(&self) -> &Arc<SearchAnalytics> {
        &self.analytics
    }

    pub fn config(&self) -> &SearchEngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Search with the default source tag.
    pub async fn search(&self, term: &str, options: SearchOptions) -> Result<SearchResponse> {
        self.execute(SearchQuery::new(term).with_options(options)).await
    }

    /// Search that stops early once `token` is cancelled.
    pub async fn search_with_cancel(
        &self,
        term: &str,
        options: SearchOptions,
        token: CancellationToken,
    ) -> Result<SearchResponse> {
        self.execute_with_cancel(SearchQuery::new(term).with_options(options), &token)
            .await
    }

    pub async fn execute(&self, query: SearchQuery) -> Result<SearchResponse> {
        self.execute_with_cancel(query, &CancellationToken::new()).await
    }

    #[instrument(skip(self, query, token), fields(
        subsystem = "search",
        component = "search_engine",
        op = "search",
        query = tracing::field::Empty,
        source = %query.source,
    ))]
    pub async fn execute_with_cancel(
        &self,
        query: SearchQuery,
        token: &CancellationToken,
    ) -> Result<SearchResponse> {
        let start = Instant::now();
        let SearchQuery {
            raw,
            options,
            source,
        } = query;
        let filters = (!options.filters.is_empty()).then(|| options.filters.clone());

        if let Err(e) = self.assembler.validate_options(&options) {
            self.record_incomplete(&sanitize(&raw), &source, filters, &[], start)
                .await;
            return Err(e);
        }

        let validation = validate(&raw);
        Span::current().record("query", validation.sanitized_term.as_str());
        if !validation.is_valid {
            self.record_incomplete(&validation.sanitized_term, &source, filters, &[], start)
                .await;
            return Err(Error::InvalidInput(validation.warnings.join(", ")));
        }
        if !validation.warnings.is_empty() {
            debug!(warnings = ?validation.warnings, "Search term accepted with warnings");
        }

        let term = validation.sanitized_term;
        let intent = detect_intent(&term);
        let attempt_fts = self.config.fts_activation.should_attempt(&term, &intent);
        let timeout = options.timeout.unwrap_or(self.config.query_timeout);
        debug!(
            ?intent,
            attempt_fts,
            timeout_ms = timeout.as_millis() as u64,
            "Search strategy gate evaluated"
        );

        let mut pipeline = StrategyPipeline::new(attempt_fts);
        let mut page = ListingPage::empty();
        let mut last_error: Option<Error> = None;

        let strategy = loop {
            match pipeline.next_step() {
                Step::Run(kind) => {
                    if token.is_cancelled() {
                        return self
                            .cancelled(&term, &source, filters, &pipeline, start)
                            .await;
                    }

                    let listing_query = self.assembler.build(kind, &term, &intent, &options);
                    match self.run_strategy(&listing_query, timeout, token).await {
                        Ok(result) => {
                            let state = if result.is_empty() {
                                StrategyState::Empty
                            } else {
                                StrategyState::Success
                            };
                            debug!(
                                strategy = %kind,
                                strategy_state = ?state,
                                result_count = result.records.len(),
                                "Strategy complete"
                            );
                            pipeline.record(kind, state);
                            page = result;
                        }
                        Err(Error::Cancelled) => {
                            pipeline.record(kind, StrategyState::Failed);
                            return self
                                .cancelled(&term, &source, filters, &pipeline, start)
                                .await;
                        }
                        Err(e) if e.is_strategy_error() => {
                            warn!(
                                strategy = %kind,
                                error = %e,
                                "Search strategy failed, falling through"
                            );
                            pipeline.record(kind, StrategyState::Failed);
                            last_error = Some(e);
                        }
                        Err(e) => {
                            pipeline.record(kind, StrategyState::Failed);
                            error!(
                                strategy = %kind,
                                error = %e,
                                "Search strategy failed with a non-datastore error"
                            );
                            self.record_incomplete(
                                &term,
                                &source,
                                filters,
                                &pipeline.attempted(),
                                start,
                            )
                            .await;
                            return Err(e);
                        }
                    }
                }
                Step::Finish(kind) => break kind,
                Step::Fail => {
                    let reason = last_error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "no strategy could run".to_string());
                    error!(
                        error = %reason,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "All search strategies failed"
                    );
                    self.record_incomplete(&term, &source, filters, &pipeline.attempted(), start)
                        .await;
                    return Err(Error::SearchUnavailable(reason));
                }
            }
        };

        let event = SearchAnalyticsEvent::new(term, source)
            .with_result_count(page.records.len())
            .with_duration(start.elapsed())
            .with_strategy(strategy)
            .with_attempted(pipeline.attempted())
            .with_filters(filters);
        self.analytics.track(event.clone()).await;

        info!(
            strategy = %strategy,
            result_count = page.records.len(),
            total_count = page.total_count,
            duration_ms = event.duration_ms,
            "Property search completed"
        );

        Ok(SearchResponse {
            results: page.records,
            total_count: page.total_count,
            strategy,
            analytics: event,
        })
    }

    /// One datastore call, bounded by `timeout` and aborted on cancellation.
    async fn run_strategy(
        &self,
        query: &ListingQuery,
        timeout: Duration,
        token: &CancellationToken,
    ) -> Result<ListingPage> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(timeout, self.store.execute(query)) => match result {
                Ok(page) => page,
                Err(_) => Err(Error::Timeout(timeout)),
            },
        }
    }

    async fn cancelled(
        &self,
        term: &str,
        source: &str,
        filters: Option<ListingFilters>,
        pipeline: &StrategyPipeline,
        start: Instant,
    ) -> Result<SearchResponse> {
        debug!(attempted = ?pipeline.attempted(), "Search cancelled");
        self.record_incomplete(term, source, filters, &pipeline.attempted(), start)
            .await;
        Err(Error::Cancelled)
    }

    async fn record_incomplete(
        &self,
        term: &str,
        source: &str,
        filters: Option<ListingFilters>,
        attempted: &[SearchStrategyKind],
        start: Instant,
    ) {
        let event = SearchAnalyticsEvent::new(term, source)
            .with_duration(start.elapsed())
            .with_attempted(attempted.to_vec())
            .with_filters(filters)
            .incomplete();
        self.analytics.track(event).await;
    }
}
