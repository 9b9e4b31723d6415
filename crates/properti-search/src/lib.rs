//! # properti-search
//!
//! Hybrid property search engine for listing catalogues.
//!
//! This crate provides:
//! - Input sanitization, validation and intent detection
//! - Strategy fallthrough: full-text, then hybrid substring, then fallback
//! - Result assembly (filters, sorting, pagination) shared by every strategy
//! - Search analytics with suggestions, stats and optional JSON persistence
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use properti_db::Database;
//! use properti_search::{SearchAnalytics, SearchEngine, SearchEngineConfig, SearchOptions, SortMode};
//!
//! let db = Database::connect("postgres://...").await?;
//! let analytics = Arc::new(SearchAnalytics::default());
//! let engine = SearchEngine::with_config(db.listings.clone(), SearchEngineConfig::from_env())
//!     .with_analytics(analytics.clone());
//!
//! let response = engine
//!     .search("rumah sleman 500 juta", SearchOptions::default().with_sort(SortMode::Price))
//!     .await?;
//!
//! let suggestions = analytics.suggestions("rum").await;
//! ```

pub mod analytics;
pub mod assembler;
pub mod config;
pub mod engine;
pub mod pipeline;
pub mod sanitizer;

// Re-export core types
pub use properti_core::*;

pub use analytics::{
    AnalyticsExport, AnalyticsSnapshot, AnalyticsStore, JsonFileStore, NoopStore,
    PersistenceWarning, PopularTermEntry, SearchAnalytics, TrackReceipt,
};
pub use assembler::ResultAssembler;
pub use config::{AnalyticsConfig, FtsActivation, SearchEngineConfig};
pub use engine::SearchEngine;
pub use pipeline::{transition, Step, StrategyPipeline, StrategyState};
pub use sanitizer::{
    detect_intent, sanitize, should_include_word, split_terms, validate, ValidationResult,
};
pub use tokio_util::sync::CancellationToken;
