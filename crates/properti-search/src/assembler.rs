//! Result assembly: filters, ordering and pagination for every strategy.
//!
//! All three tiers build their [`ListingQuery`] here from the same
//! [`SearchOptions`], so filter, sort and page semantics cannot drift
//! between strategies. Only the [`TextMatch`] differs per tier.

use properti_core::{
    Error, FilterPredicate, FilterValue, ListingField, ListingQuery, OrderKey, Page,
    PatternCondition, Result, SearchIntent, SearchOptions, SearchStrategyKind, SortMode,
    TextMatch,
};

use crate::config::SearchEngineConfig;
use crate::sanitizer::{should_include_word, split_terms};

/// Fields matched against the whole term by the hybrid tier.
const HYBRID_TERM_FIELDS: [ListingField; 3] =
    [ListingField::Title, ListingField::Code, ListingField::Address];

/// Fields matched against each word by the hybrid tier, primary then secondary.
const HYBRID_WORD_FIELDS: [ListingField; 6] = [
    ListingField::Title,
    ListingField::Description,
    ListingField::Address,
    ListingField::PropertyType,
    ListingField::Regency,
    ListingField::Province,
];

const FALLBACK_FIELDS: [ListingField; 3] = [
    ListingField::Title,
    ListingField::Description,
    ListingField::Code,
];

/// Pattern conditions for the hybrid tier.
pub fn hybrid_conditions(term: &str, words: &[String]) -> Vec<PatternCondition> {
    let mut conditions: Vec<PatternCondition> = HYBRID_TERM_FIELDS
        .iter()
        .map(|field| PatternCondition::new(*field, term))
        .collect();

    for word in words.iter().filter(|w| should_include_word(w)) {
        conditions.extend(
            HYBRID_WORD_FIELDS
                .iter()
                .map(|field| PatternCondition::new(*field, word.as_str())),
        );
    }
    conditions
}

/// Pattern conditions for the fallback tier.
pub fn fallback_conditions(term: &str) -> Vec<PatternCondition> {
    FALLBACK_FIELDS
        .iter()
        .map(|field| PatternCondition::new(*field, term))
        .collect()
}

/// Builds strategy queries from caller options.
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    text_search_config: String,
    default_limit: i64,
    max_limit: i64,
}

impl Default for ResultAssembler {
    fn default() -> Self {
        Self::new(&SearchEngineConfig::default())
    }
}

impl ResultAssembler {
    pub fn new(config: &SearchEngineConfig) -> Self {
        Self {
            text_search_config: config.text_search_config.clone(),
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }

    /// Reject options no strategy could honour.
    pub fn validate_options(&self, options: &SearchOptions) -> Result<()> {
        if let Some(limit) = options.limit {
            if limit < 1 {
                return Err(Error::InvalidInput(format!(
                    "limit must be at least 1, got {limit}"
                )));
            }
        }
        if let Some(offset) = options.offset {
            if offset < 0 {
                return Err(Error::InvalidInput(format!(
                    "offset must not be negative, got {offset}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (options.filters.min_price, options.filters.max_price) {
            if min > max {
                return Err(Error::InvalidInput(format!(
                    "minPrice ({min}) is greater than maxPrice ({max})"
                )));
            }
        }
        Ok(())
    }

    /// Effective page window; limit defaults and is capped.
    pub fn page(&self, options: &SearchOptions) -> Page {
        let limit = options
            .limit
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1));
        let offset = options.offset.unwrap_or(properti_core::defaults::PAGE_OFFSET).max(0);
        Page::new(offset, limit)
    }

    /// AND-combined filters shared by every tier.
    pub fn filters(&self, options: &SearchOptions) -> Vec<FilterPredicate> {
        let mut predicates = Vec::new();
        let filters = &options.filters;

        if let Some(jenis) = filters.jenis_properti.as_deref().filter(|s| !s.trim().is_empty()) {
            predicates.push(FilterPredicate::Eq {
                field: ListingField::PropertyType,
                value: FilterValue::Text(jenis.to_string()),
            });
        }
        if let Some(status) = filters.status.as_deref().filter(|s| !s.trim().is_empty()) {
            predicates.push(FilterPredicate::Eq {
                field: ListingField::Status,
                value: FilterValue::Text(status.to_string()),
            });
        }
        if let Some(min) = filters.min_price {
            predicates.push(FilterPredicate::Gte {
                field: ListingField::Price,
                value: FilterValue::Int(min),
            });
        }
        if let Some(max) = filters.max_price {
            predicates.push(FilterPredicate::Lte {
                field: ListingField::Price,
                value: FilterValue::Int(max),
            });
        }
        if !options.include_sold {
            predicates.push(FilterPredicate::NotTrue {
                field: ListingField::IsSold,
            });
        }
        predicates
    }

    /// Ordering for a tier. Always ends with `id asc` so pages are stable.
    pub fn order(&self, kind: SearchStrategyKind, sort: SortMode) -> Vec<OrderKey> {
        let mut keys = match (sort, kind) {
            (SortMode::Price, _) => vec![OrderKey::asc(ListingField::Price)],
            (SortMode::Date, _) => vec![OrderKey::desc(ListingField::CreatedAt)],
            (SortMode::Relevance, SearchStrategyKind::Fts) => vec![
                OrderKey::rank(),
                OrderKey::desc(ListingField::CreatedAt),
            ],
            (SortMode::Relevance, _) => vec![OrderKey::desc(ListingField::CreatedAt)],
        };
        keys.push(OrderKey::asc(ListingField::Id));
        keys
    }

    fn assemble(
        &self,
        kind: SearchStrategyKind,
        text: TextMatch,
        options: &SearchOptions,
    ) -> ListingQuery {
        let mut query = ListingQuery::new(kind, text).page(self.page(options));
        query.filters = self.filters(options);
        query.order = self.order(kind, options.sort_by);
        query
    }

    /// Full-text tier query; exact listing codes become a code lookup.
    pub fn full_text_query(
        &self,
        term: &str,
        intent: &SearchIntent,
        options: &SearchOptions,
    ) -> ListingQuery {
        if intent.is_exact_code {
            return self.code_query(SearchStrategyKind::Fts, term, options);
        }
        let text = TextMatch::FullText {
            term: term.to_string(),
            config: self.text_search_config.clone(),
        };
        self.assemble(SearchStrategyKind::Fts, text, options)
    }

    /// Exact listing-code lookup, used by every tier for code-shaped terms.
    pub fn code_query(
        &self,
        kind: SearchStrategyKind,
        term: &str,
        options: &SearchOptions,
    ) -> ListingQuery {
        self.assemble(kind, TextMatch::ExactCode(term.trim().to_string()), options)
    }

    pub fn hybrid_query(&self, term: &str, options: &SearchOptions) -> ListingQuery {
        let words = split_terms(term);
        self.assemble(
            SearchStrategyKind::Hybrid,
            TextMatch::AnyPattern(hybrid_conditions(term, &words)),
            options,
        )
    }

    pub fn fallback_query(&self, term: &str, options: &SearchOptions) -> ListingQuery {
        self.assemble(
            SearchStrategyKind::Fallback,
            TextMatch::AnyPattern(fallback_conditions(term)),
            options,
        )
    }

    /// Query for any tier.
    pub fn build(
        &self,
        kind: SearchStrategyKind,
        term: &str,
        intent: &SearchIntent,
        options: &SearchOptions,
    ) -> ListingQuery {
        match kind {
            SearchStrategyKind::Fts => self.full_text_query(term, intent, options),
            _ if intent.is_exact_code => self.code_query(kind, term, options),
            SearchStrategyKind::Hybrid => self.hybrid_query(term, options),
            SearchStrategyKind::Fallback => self.fallback_query(term, options),
        }
    }
}
