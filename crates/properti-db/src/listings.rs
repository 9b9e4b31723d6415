//! PostgreSQL listing store.
//!
//! Executes typed [`ListingQuery`] values against the `properties` table:
//! - full-text via `websearch_to_tsquery` over the generated `search_vector`
//! - OR-combined `ILIKE` pattern conditions for hybrid/fallback tiers
//! - exact, parameterised row counts alongside each page

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{Pool, Postgres};
use tracing::{debug, instrument};

use properti_core::{Error, ListingPage, ListingQuery, ListingRecord, ListingStore, Result};

use crate::sql::{ListingSqlBuilder, QueryParam};

/// Listing store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgListingStore {
    pool: Pool<Postgres>,
}

impl PgListingStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

fn bind_record_params<'q>(
    mut q: QueryAs<'q, Postgres, ListingRecord, PgArguments>,
    params: &'q [QueryParam],
) -> QueryAs<'q, Postgres, ListingRecord, PgArguments> {
    for param in params {
        q = match param {
            QueryParam::Text(s) => q.bind(s),
            QueryParam::BigInt(i) => q.bind(i),
            QueryParam::Bool(b) => q.bind(b),
        };
    }
    q
}

fn bind_count_params<'q>(
    mut q: QueryScalar<'q, Postgres, i64, PgArguments>,
    params: &'q [QueryParam],
) -> QueryScalar<'q, Postgres, i64, PgArguments> {
    for param in params {
        q = match param {
            QueryParam::Text(s) => q.bind(s),
            QueryParam::BigInt(i) => q.bind(i),
            QueryParam::Bool(b) => q.bind(b),
        };
    }
    q
}

/// Map sqlx failures onto the error taxonomy: connectivity problems become
/// `DatastoreUnavailable`, everything else stays a `Database` error.
pub fn classify_sqlx_error(e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => Error::DatastoreUnavailable(e.to_string()),
        other => Error::Database(other),
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    #[instrument(skip(self, query), fields(
        subsystem = "db",
        component = "listing_store",
        op = "execute",
        strategy = %query.strategy,
        condition_count = query.condition_count(),
    ))]
    async fn execute(&self, query: &ListingQuery) -> Result<ListingPage> {
        let start = Instant::now();
        let sql = ListingSqlBuilder::new(query).build();

        let records: Vec<ListingRecord> =
            bind_record_params(sqlx::query_as(&sql.select_sql), &sql.params)
                .fetch_all(&self.pool)
                .await
                .map_err(classify_sqlx_error)?;

        // A short first page already is the whole match set.
        let short_first_page =
            query.page.offset == 0 && (records.len() as i64) < query.page.limit;
        let total_count = if short_first_page {
            records.len() as i64
        } else {
            bind_count_params(sqlx::query_scalar(&sql.count_sql), sql.count_params())
                .fetch_one(&self.pool)
                .await
                .map_err(classify_sqlx_error)?
        };

        debug!(
            result_count = records.len(),
            total_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Listing query complete"
        );

        Ok(ListingPage {
            records,
            total_count,
        })
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_errors_become_unavailable() {
        assert!(matches!(
            classify_sqlx_error(sqlx::Error::PoolTimedOut),
            Error::DatastoreUnavailable(_)
        ));
        assert!(matches!(
            classify_sqlx_error(sqlx::Error::PoolClosed),
            Error::DatastoreUnavailable(_)
        ));
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(
            classify_sqlx_error(sqlx::Error::Io(io)),
            Error::DatastoreUnavailable(_)
        ));
    }

    #[test]
    fn test_query_errors_stay_database_errors() {
        let err = classify_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, Error::Database(_)));
        assert!(err.is_strategy_error());
    }
}
