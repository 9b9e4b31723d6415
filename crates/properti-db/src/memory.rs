//! In-memory listing store for deterministic testing and demos.
//!
//! Evaluates the same typed [`ListingQuery`] as [`crate::PgListingStore`]
//! over a vector of listings, with failure and latency injection per
//! strategy tier and a call log for asserting which tiers ran.
//!
//! Full-text matching is approximated: every query word (websearch `or` and
//! `-negated` words ignored) must appear as a whole word in the listing's
//! searchable fields. Title hits rank higher than hits elsewhere.
//!
//! ## Usage
//!
//! ```rust
//! use properti_core::{ListingRecord, SearchStrategyKind};
//! use properti_db::memory::{FailureMode, InMemoryListingStore};
//!
//! let store = InMemoryListingStore::new()
//!     .with_listings(vec![ListingRecord::new("R8.01", "Rumah Sleman", "rumah")])
//!     .with_failure(SearchStrategyKind::Fts, FailureMode::Unavailable);
//!
//! assert_eq!(store.len(), 1);
//! assert_eq!(store.call_count(SearchStrategyKind::Fts), 0);
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::trace;
use uuid::Uuid;

use properti_core::{
    Direction, Error, FilterPredicate, FilterValue, ListingField, ListingPage, ListingQuery,
    ListingRecord, ListingStore, OrderKey, Result, SearchStrategyKind, SortTarget, TextMatch,
};

/// Injected failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Behaves like a refused connection.
    Unavailable,
    /// Behaves like a failing SQL statement.
    QueryError,
}

impl FailureMode {
    fn to_error(self, strategy: SearchStrategyKind) -> Error {
        match self {
            FailureMode::Unavailable => {
                Error::DatastoreUnavailable(format!("connection refused ({strategy})"))
            }
            FailureMode::QueryError => Error::Database(sqlx::Error::Protocol(format!(
                "injected query error ({strategy})"
            ))),
        }
    }
}

/// In-memory listing store.
#[derive(Clone, Default)]
pub struct InMemoryListingStore {
    listings: Arc<RwLock<Vec<ListingRecord>>>,
    failures: Arc<Mutex<HashMap<SearchStrategyKind, FailureMode>>>,
    latency: Arc<Mutex<HashMap<SearchStrategyKind, Duration>>>,
    call_log: Arc<Mutex<Vec<ListingQuery>>>,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(self, listings: Vec<ListingRecord>) -> Self {
        for listing in listings {
            self.insert(listing);
        }
        self
    }

    /// Make every query issued by `strategy` fail.
    pub fn with_failure(self, strategy: SearchStrategyKind, mode: FailureMode) -> Self {
        self.set_failure(strategy, Some(mode));
        self
    }

    /// Delay every query issued by `strategy`.
    pub fn with_latency(self, strategy: SearchStrategyKind, delay: Duration) -> Self {
        self.latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(strategy, delay);
        self
    }

    pub fn set_failure(&self, strategy: SearchStrategyKind, mode: Option<FailureMode>) {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        match mode {
            Some(mode) => failures.insert(strategy, mode),
            None => failures.remove(&strategy),
        };
    }

    pub fn insert(&self, listing: ListingRecord) {
        self.listings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listing);
    }

    pub fn len(&self) -> usize {
        self.listings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every query received, in order.
    pub fn calls(&self) -> Vec<ListingQuery> {
        self.call_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of queries received from one strategy tier.
    pub fn call_count(&self, strategy: SearchStrategyKind) -> usize {
        self.call_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|q| q.strategy == strategy)
            .count()
    }

    pub fn clear_calls(&self) {
        self.call_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn evaluate(&self, query: &ListingQuery) -> ListingPage {
        let listings = self.listings.read().unwrap_or_else(PoisonError::into_inner);

        let mut matched: Vec<ListingRecord> = listings
            .iter()
            .filter_map(|record| {
                let score = text_score(record, &query.text)?;
                if !query.filters.iter().all(|p| passes_filter(record, p)) {
                    return None;
                }
                let mut record = record.clone();
                record.search_score = score;
                Some(record)
            })
            .collect();

        let ranked = query.text.is_ranked();
        matched.sort_by(|a, b| compare_records(a, b, &query.order, ranked));

        let total_count = matched.len() as i64;
        let offset = query.page.offset.max(0) as usize;
        let limit = query.page.limit.max(0) as usize;
        let records = matched.into_iter().skip(offset).take(limit).collect();

        ListingPage {
            records,
            total_count,
        }
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn execute(&self, query: &ListingQuery) -> Result<ListingPage> {
        self.call_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());

        let delay = self
            .latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&query.strategy)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&query.strategy)
            .copied();
        if let Some(mode) = failure {
            return Err(mode.to_error(query.strategy));
        }

        let page = self.evaluate(query);
        trace!(
            strategy = %query.strategy,
            result_count = page.records.len(),
            total_count = page.total_count,
            "In-memory listing query evaluated"
        );
        Ok(page)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

fn text_value(record: &ListingRecord, field: ListingField) -> Option<&str> {
    match field {
        ListingField::Code => Some(&record.kode_listing),
        ListingField::Title => Some(&record.judul_properti),
        ListingField::Description => record.deskripsi.as_deref(),
        ListingField::PropertyType => Some(&record.jenis_properti),
        ListingField::Status => Some(&record.status),
        ListingField::Regency => record.kabupaten.as_deref(),
        ListingField::Province => record.provinsi.as_deref(),
        ListingField::Address => record.alamat_lengkap.as_deref(),
        _ => None,
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

/// `None` = no match; `Some(score)` = match with optional rank.
fn text_score(record: &ListingRecord, text: &TextMatch) -> Option<Option<f32>> {
    match text {
        TextMatch::FullText { term, .. } => {
            let query_words: Vec<String> = term
                .split_whitespace()
                .filter(|w| !w.eq_ignore_ascii_case("or") && !w.starts_with('-'))
                .flat_map(words)
                .collect();
            if query_words.is_empty() {
                return None;
            }

            let title_words: Vec<String> = words(&record.judul_properti).collect();
            let other_words: Vec<String> = [
                ListingField::Code,
                ListingField::Description,
                ListingField::PropertyType,
                ListingField::Regency,
                ListingField::Province,
                ListingField::Address,
            ]
            .iter()
            .filter_map(|f| text_value(record, *f))
            .flat_map(words)
            .collect();

            let mut score = 0.0f32;
            for word in &query_words {
                if title_words.contains(word) {
                    score += 1.0;
                } else if other_words.contains(word) {
                    score += 0.2;
                } else {
                    return None;
                }
            }
            Some(Some(score / query_words.len() as f32))
        }
        TextMatch::ExactCode(code) => record
            .kode_listing
            .to_lowercase()
            .eq(&code.to_lowercase())
            .then_some(None),
        TextMatch::AnyPattern(conditions) => conditions
            .iter()
            .any(|c| {
                text_value(record, c.field)
                    .map(|v| v.to_lowercase().contains(&c.needle.to_lowercase()))
                    .unwrap_or(false)
            })
            .then_some(None),
    }
}

fn passes_filter(record: &ListingRecord, predicate: &FilterPredicate) -> bool {
    match predicate {
        FilterPredicate::Eq { field, value } => match (field, value) {
            (ListingField::Price, FilterValue::Int(v)) => record.harga_properti == Some(*v),
            (ListingField::IsSold, FilterValue::Bool(v)) => record.is_sold == *v,
            (f, FilterValue::Text(v)) => text_value(record, *f) == Some(v.as_str()),
            _ => false,
        },
        FilterPredicate::Gte { field, value } => match (field, value) {
            (ListingField::Price, FilterValue::Int(v)) => {
                record.harga_properti.map(|p| p >= *v).unwrap_or(false)
            }
            _ => false,
        },
        FilterPredicate::Lte { field, value } => match (field, value) {
            (ListingField::Price, FilterValue::Int(v)) => {
                record.harga_properti.map(|p| p <= *v).unwrap_or(false)
            }
            _ => false,
        },
        FilterPredicate::NotTrue { field } => match field {
            ListingField::IsSold => !record.is_sold,
            _ => true,
        },
    }
}

#[derive(Debug, PartialEq, PartialOrd)]
enum SortValue {
    Int(i64),
    Float(f32),
    Text(String),
    Time(DateTime<Utc>),
    Id(Uuid),
    Bool(bool),
}

fn sort_value(record: &ListingRecord, target: SortTarget) -> Option<SortValue> {
    match target {
        SortTarget::Rank => record.search_score.map(SortValue::Float),
        SortTarget::Field(field) => match field {
            ListingField::Id => Some(SortValue::Id(record.id)),
            ListingField::Price => record.harga_properti.map(SortValue::Int),
            ListingField::CreatedAt => Some(SortValue::Time(record.created_at)),
            ListingField::IsSold => Some(SortValue::Bool(record.is_sold)),
            f => text_value(record, f).map(|v| SortValue::Text(v.to_string())),
        },
    }
}

fn compare_key(a: &ListingRecord, b: &ListingRecord, key: &OrderKey) -> Ordering {
    let (va, vb) = (sort_value(a, key.target), sort_value(b, key.target));
    match (va, vb) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => {
            if key.nulls_last {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Some(_), None) => {
            if key.nulls_last {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            match key.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        }
    }
}

fn compare_records(a: &ListingRecord, b: &ListingRecord, order: &[OrderKey], ranked: bool) -> Ordering {
    if order.is_empty() {
        return b.created_at.cmp(&a.created_at);
    }
    order
        .iter()
        .filter(|key| ranked || key.target != SortTarget::Rank)
        .map(|key| compare_key(a, b, key))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}
