//! Typed listing query abstraction.
//!
//! Strategies describe what they want as structured predicates; datastore
//! adapters translate a [`ListingQuery`] into their native query syntax. No
//! user text is ever interpolated into query strings at this layer.

use serde::{Deserialize, Serialize};

use crate::search::SearchStrategyKind;

// =============================================================================
// FIELDS
// =============================================================================

/// Columns of the listings table that queries may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingField {
    Id,
    Code,
    Title,
    Description,
    PropertyType,
    Price,
    Status,
    IsSold,
    Regency,
    Province,
    Address,
    CreatedAt,
}

impl ListingField {
    /// Column name in the `properties` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Code => "kode_listing",
            Self::Title => "judul_properti",
            Self::Description => "deskripsi",
            Self::PropertyType => "jenis_properti",
            Self::Price => "harga_properti",
            Self::Status => "status",
            Self::IsSold => "is_sold",
            Self::Regency => "kabupaten",
            Self::Province => "provinsi",
            Self::Address => "alamat_lengkap",
            Self::CreatedAt => "created_at",
        }
    }

    /// Whether the column holds free text usable in pattern conditions.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Self::Code
                | Self::Title
                | Self::Description
                | Self::PropertyType
                | Self::Status
                | Self::Regency
                | Self::Province
                | Self::Address
        )
    }
}

// =============================================================================
// TEXT MATCHING
// =============================================================================

/// Case-insensitive substring condition on one text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCondition {
    pub field: ListingField,
    /// Raw substring; adapters are responsible for escaping wildcards.
    pub needle: String,
}

impl PatternCondition {
    pub fn new(field: ListingField, needle: impl Into<String>) -> Self {
        Self {
            field,
            needle: needle.into(),
        }
    }
}

/// How a query matches the search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TextMatch {
    /// Natural-language full-text query over the listings search vector.
    FullText { term: String, config: String },
    /// Case-insensitive equality on the listing code.
    ExactCode(String),
    /// OR-combination of substring conditions; empty matches nothing.
    AnyPattern(Vec<PatternCondition>),
}

impl TextMatch {
    /// Whether this match yields a rank signal usable for ordering.
    pub fn is_ranked(&self) -> bool {
        matches!(self, TextMatch::FullText { .. })
    }
}

// =============================================================================
// FILTERS
// =============================================================================

/// Filter value types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

/// A single AND-combined filter predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterPredicate {
    Eq { field: ListingField, value: FilterValue },
    Gte { field: ListingField, value: FilterValue },
    Lte { field: ListingField, value: FilterValue },
    /// Field is false or null.
    NotTrue { field: ListingField },
}

impl FilterPredicate {
    pub fn field(&self) -> ListingField {
        match self {
            Self::Eq { field, .. }
            | Self::Gte { field, .. }
            | Self::Lte { field, .. }
            | Self::NotTrue { field } => *field,
        }
    }
}

// =============================================================================
// ORDERING & PAGINATION
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Sort target: a column or the full-text rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortTarget {
    Field(ListingField),
    Rank,
}

/// One key of an ORDER BY list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub target: SortTarget,
    pub direction: Direction,
    pub nulls_last: bool,
}

impl OrderKey {
    pub fn asc(field: ListingField) -> Self {
        Self {
            target: SortTarget::Field(field),
            direction: Direction::Asc,
            nulls_last: true,
        }
    }

    pub fn desc(field: ListingField) -> Self {
        Self {
            target: SortTarget::Field(field),
            direction: Direction::Desc,
            nulls_last: true,
        }
    }

    pub fn rank() -> Self {
        Self {
            target: SortTarget::Rank,
            direction: Direction::Desc,
            nulls_last: true,
        }
    }
}

/// Offset/limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// Complete, datastore-agnostic listing query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingQuery {
    /// Strategy tier issuing the query (for logging and call accounting).
    pub strategy: SearchStrategyKind,
    pub text: TextMatch,
    pub filters: Vec<FilterPredicate>,
    pub order: Vec<OrderKey>,
    pub page: Page,
}

impl ListingQuery {
    pub fn new(strategy: SearchStrategyKind, text: TextMatch) -> Self {
        Self {
            strategy,
            text,
            filters: Vec::new(),
            order: Vec::new(),
            page: Page::new(0, crate::defaults::PAGE_LIMIT_SEARCH),
        }
    }

    pub fn filter(mut self, predicate: FilterPredicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn order_by(mut self, key: OrderKey) -> Self {
        self.order.push(key);
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    /// Number of OR-combined conditions (0 for non-pattern matches).
    pub fn condition_count(&self) -> usize {
        match &self.text {
            TextMatch::AnyPattern(conditions) => conditions.len(),
            _ => 0,
        }
    }
}
