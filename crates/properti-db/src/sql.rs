//! SQL translation of typed listing queries.
//!
//! Converts a [`ListingQuery`] into parameterised PostgreSQL statements:
//! a page query and a matching `COUNT(*)` query sharing one WHERE clause.
//!
//! All user-supplied values become bind parameters. LIKE wildcards in
//! pattern needles are escaped with [`escape_like`], and identical needles
//! share one parameter slot.

use std::collections::HashMap;

use properti_core::{
    Direction, FilterPredicate, FilterValue, ListingQuery, OrderKey, SortTarget, TextMatch,
};

use crate::escape_like;

/// Listings table name.
pub const LISTINGS_TABLE: &str = "properties";

/// Projection shared by every strategy; matches `ListingRecord`'s fields.
const LISTING_COLUMNS: &str = "id, kode_listing, judul_properti, deskripsi, jenis_properti, \
     harga_properti::int8 AS harga_properti, status, is_sold, kabupaten, provinsi, \
     alamat_lengkap, created_at";

/// Type-safe parameter binding for listing queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// Text parameter (terms, patterns, equality values, regconfig names).
    Text(String),
    /// 64-bit integer parameter (prices, limit, offset).
    BigInt(i64),
    /// Boolean parameter.
    Bool(bool),
}

impl From<&FilterValue> for QueryParam {
    fn from(value: &FilterValue) -> Self {
        match value {
            FilterValue::Text(s) => QueryParam::Text(s.clone()),
            FilterValue::Int(i) => QueryParam::BigInt(*i),
            FilterValue::Bool(b) => QueryParam::Bool(*b),
        }
    }
}

/// Result of translating a listing query.
#[derive(Debug, Clone)]
pub struct ListingSql {
    /// Paged SELECT returning `ListingRecord` rows.
    pub select_sql: String,
    /// Exact row count for the same WHERE clause.
    pub count_sql: String,
    /// Parameters in placeholder order. The count query binds the first
    /// `count_param_len` of them; limit and offset come last.
    pub params: Vec<QueryParam>,
    pub count_param_len: usize,
}

impl ListingSql {
    /// Parameters referenced by `count_sql`.
    pub fn count_params(&self) -> &[QueryParam] {
        &self.params[..self.count_param_len]
    }
}

/// Generates SQL for a [`ListingQuery`].
///
/// # Example
///
/// ```rust,ignore
/// use properti_db::sql::ListingSqlBuilder;
///
/// let sql = ListingSqlBuilder::new(&query).build();
/// // sql.select_sql: "SELECT ... FROM properties WHERE (judul_properti ILIKE $1 ESCAPE '\' OR ...) AND is_sold IS NOT TRUE ORDER BY ... LIMIT $2 OFFSET $3"
/// ```
pub struct ListingSqlBuilder<'a> {
    query: &'a ListingQuery,
    params: Vec<QueryParam>,
    pattern_slots: HashMap<String, usize>,
}

impl<'a> ListingSqlBuilder<'a> {
    pub fn new(query: &'a ListingQuery) -> Self {
        Self {
            query,
            params: Vec::new(),
            pattern_slots: HashMap::new(),
        }
    }

    fn push(&mut self, param: QueryParam) -> usize {
        self.params.push(param);
        self.params.len()
    }

    fn pattern_slot(&mut self, needle: &str) -> usize {
        let pattern = format!("%{}%", escape_like(needle));
        if let Some(idx) = self.pattern_slots.get(&pattern) {
            return *idx;
        }
        let idx = self.push(QueryParam::Text(pattern.clone()));
        self.pattern_slots.insert(pattern, idx);
        idx
    }

    /// Returns (WHERE fragment, score expression).
    fn text_clause(&mut self) -> (String, String) {
        let query = self.query;
        match &query.text {
            TextMatch::FullText { term, config } => {
                let config_idx = self.push(QueryParam::Text(config.clone()));
                let term_idx = self.push(QueryParam::Text(term.clone()));
                let tsquery = format!("websearch_to_tsquery(${config_idx}::regconfig, ${term_idx})");
                (
                    format!("search_vector @@ {tsquery}"),
                    format!("ts_rank(search_vector, {tsquery})::float4"),
                )
            }
            TextMatch::ExactCode(code) => {
                let idx = self.push(QueryParam::Text(code.clone()));
                (
                    format!("LOWER(kode_listing) = LOWER(${idx})"),
                    "NULL::float4".to_string(),
                )
            }
            TextMatch::AnyPattern(conditions) => {
                if conditions.is_empty() {
                    return ("FALSE".to_string(), "NULL::float4".to_string());
                }
                let mut parts = Vec::with_capacity(conditions.len());
                for condition in conditions {
                    let idx = self.pattern_slot(&condition.needle);
                    parts.push(format!(
                        r"{} ILIKE ${} ESCAPE '\'",
                        condition.field.column(),
                        idx
                    ));
                }
                (format!("({})", parts.join(" OR ")), "NULL::float4".to_string())
            }
        }
    }

    fn filter_clause(&mut self, predicate: &FilterPredicate) -> String {
        match predicate {
            FilterPredicate::Eq { field, value } => {
                let idx = self.push(value.into());
                format!("{} = ${}", field.column(), idx)
            }
            FilterPredicate::Gte { field, value } => {
                let idx = self.push(value.into());
                format!("{} >= ${}", field.column(), idx)
            }
            FilterPredicate::Lte { field, value } => {
                let idx = self.push(value.into());
                format!("{} <= ${}", field.column(), idx)
            }
            FilterPredicate::NotTrue { field } => format!("{} IS NOT TRUE", field.column()),
        }
    }

    fn order_clause(&self) -> String {
        let ranked = self.query.text.is_ranked();
        let keys: Vec<String> = self
            .query
            .order
            .iter()
            .filter_map(|key| order_key_sql(key, ranked))
            .collect();

        if keys.is_empty() {
            "created_at DESC".to_string()
        } else {
            keys.join(", ")
        }
    }

    /// Build the page and count statements.
    pub fn build(mut self) -> ListingSql {
        let (text_where, score_expr) = self.text_clause();

        let query = self.query;
        let mut clauses = vec![text_where];
        for predicate in &query.filters {
            clauses.push(self.filter_clause(predicate));
        }
        let where_clause = clauses.join(" AND ");
        let count_param_len = self.params.len();

        let order_clause = self.order_clause();
        let limit_idx = self.push(QueryParam::BigInt(query.page.limit));
        let offset_idx = self.push(QueryParam::BigInt(query.page.offset));

        let select_sql = format!(
            "SELECT {LISTING_COLUMNS}, {score_expr} AS search_score \
             FROM {LISTINGS_TABLE} WHERE {where_clause} \
             ORDER BY {order_clause} LIMIT ${limit_idx} OFFSET ${offset_idx}"
        );
        let count_sql = format!("SELECT COUNT(*) FROM {LISTINGS_TABLE} WHERE {where_clause}");

        ListingSql {
            select_sql,
            count_sql,
            params: self.params,
            count_param_len,
        }
    }
}

fn order_key_sql(key: &OrderKey, ranked: bool) -> Option<String> {
    let target = match key.target {
        SortTarget::Rank if !ranked => return None,
        SortTarget::Rank => "search_score",
        SortTarget::Field(field) => field.column(),
    };
    let direction = match key.direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    };
    let nulls = if key.nulls_last {
        "NULLS LAST"
    } else {
        "NULLS FIRST"
    };
    Some(format!("{target} {direction} {nulls}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use properti_core::{ListingField, Page, PatternCondition, SearchStrategyKind};

    fn pattern_query(conditions: Vec<PatternCondition>) -> ListingQuery {
        ListingQuery::new(SearchStrategyKind::Hybrid, TextMatch::AnyPattern(conditions))
    }

    #[test]
    fn test_full_text_query_binds_config_and_term() {
        let query = ListingQuery::new(
            SearchStrategyKind::Fts,
            TextMatch::FullText {
                term: "rumah sleman".into(),
                config: "indonesian".into(),
            },
        )
        .order_by(OrderKey::rank());

        let sql = ListingSqlBuilder::new(&query).build();
        assert!(sql
            .select_sql
            .contains("search_vector @@ websearch_to_tsquery($1::regconfig, $2)"));
        assert!(sql.select_sql.contains("ts_rank(search_vector"));
        assert!(sql.select_sql.contains("ORDER BY search_score DESC NULLS LAST"));
        assert!(sql.select_sql.ends_with("LIMIT $3 OFFSET $4"));
        assert_eq!(
            sql.params[..2],
            [
                QueryParam::Text("indonesian".into()),
                QueryParam::Text("rumah sleman".into())
            ]
        );
        assert_eq!(sql.count_param_len, 2);
    }

    #[test]
    fn test_pattern_conditions_are_or_combined_and_escaped() {
        let query = pattern_query(vec![
            PatternCondition::new(ListingField::Title, "50%_off"),
            PatternCondition::new(ListingField::Code, "50%_off"),
            PatternCondition::new(ListingField::Regency, "sleman"),
        ]);

        let sql = ListingSqlBuilder::new(&query).build();
        assert!(sql.select_sql.contains(
            r"(judul_properti ILIKE $1 ESCAPE '\' OR kode_listing ILIKE $1 ESCAPE '\' OR kabupaten ILIKE $2 ESCAPE '\')"
        ));
        assert_eq!(sql.params[0], QueryParam::Text(r"%50\%\_off%".into()));
        assert_eq!(sql.params[1], QueryParam::Text("%sleman%".into()));
    }

    #[test]
    fn test_empty_pattern_list_matches_nothing() {
        let sql = ListingSqlBuilder::new(&pattern_query(Vec::new())).build();
        assert!(sql.count_sql.ends_with("WHERE FALSE"));
    }

    #[test]
    fn test_exact_code_is_case_insensitive_equality() {
        let query = ListingQuery::new(SearchStrategyKind::Fts, TextMatch::ExactCode("R8.01".into()));
        let sql = ListingSqlBuilder::new(&query).build();
        assert!(sql.select_sql.contains("LOWER(kode_listing) = LOWER($1)"));
        assert!(sql.select_sql.contains("NULL::float4 AS search_score"));
    }

    #[test]
    fn test_filters_follow_text_params() {
        let query = pattern_query(vec![PatternCondition::new(ListingField::Title, "villa")])
            .filter(FilterPredicate::Eq {
                field: ListingField::PropertyType,
                value: FilterValue::Text("villa".into()),
            })
            .filter(FilterPredicate::Gte {
                field: ListingField::Price,
                value: FilterValue::Int(350_000_000),
            })
            .filter(FilterPredicate::Lte {
                field: ListingField::Price,
                value: FilterValue::Int(750_000_000),
            })
            .filter(FilterPredicate::NotTrue {
                field: ListingField::IsSold,
            })
            .page(Page::new(20, 10));

        let sql = ListingSqlBuilder::new(&query).build();
        assert!(sql.count_sql.contains(
            "AND jenis_properti = $2 AND harga_properti >= $3 AND harga_properti <= $4 AND is_sold IS NOT TRUE"
        ));
        assert_eq!(sql.count_params().len(), 4);
        assert_eq!(sql.params[4], QueryParam::BigInt(10));
        assert_eq!(sql.params[5], QueryParam::BigInt(20));
        assert!(sql.select_sql.ends_with("LIMIT $5 OFFSET $6"));
    }

    #[test]
    fn test_rank_ordering_dropped_for_unranked_match() {
        let query = pattern_query(vec![PatternCondition::new(ListingField::Title, "ruko")])
            .order_by(OrderKey::rank())
            .order_by(OrderKey::desc(ListingField::CreatedAt))
            .order_by(OrderKey::asc(ListingField::Id));

        let sql = ListingSqlBuilder::new(&query).build();
        assert!(sql
            .select_sql
            .contains("ORDER BY created_at DESC NULLS LAST, id ASC NULLS LAST"));
        assert!(!sql.select_sql.contains("search_score DESC"));
    }

    #[test]
    fn test_default_order_is_newest_first() {
        let query = pattern_query(vec![PatternCondition::new(ListingField::Title, "kost")]);
        let sql = ListingSqlBuilder::new(&query).build();
        assert!(sql.select_sql.contains("ORDER BY created_at DESC LIMIT"));
    }

    #[test]
    fn test_no_user_text_in_sql() {
        let hostile = "'; DROP TABLE properties; --";
        let query = pattern_query(vec![PatternCondition::new(ListingField::Title, hostile)]);
        let sql = ListingSqlBuilder::new(&query).build();
        assert!(!sql.select_sql.contains("DROP TABLE"));
        assert!(!sql.count_sql.contains("DROP TABLE"));
    }
}
