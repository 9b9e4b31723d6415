//! # properti-db
//!
//! PostgreSQL database layer for properti-search.
//!
//! This crate provides:
//! - Connection pool management
//! - Translation of typed [`ListingQuery`] values into parameterised SQL
//! - [`PgListingStore`], the production [`ListingStore`]
//! - [`InMemoryListingStore`], an in-process store for tests and demos
//!
//! ## Example
//!
//! ```rust,ignore
//! use properti_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/properti").await?;
//!     let engine = properti_search::SearchEngine::new(db.listings.clone());
//!     let response = engine.search("rumah sleman", Default::default()).await?;
//!     println!("{} results via {}", response.total_count, response.strategy);
//!     Ok(())
//! }
//! ```

pub mod listings;
pub mod memory;
pub mod pool;
pub mod sql;

// Test fixtures for integration tests
pub mod test_fixtures;

// Re-export core types
pub use properti_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub use listings::{classify_sqlx_error, PgListingStore};
pub use memory::{FailureMode, InMemoryListingStore};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use sql::{ListingSql, ListingSqlBuilder, QueryParam, LISTINGS_TABLE};

/// Combined database context.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Listing store used by the search engine.
    pub listings: PgListingStore,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            listings: PgListingStore::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\x"), "c:\\\\x");
    }
}
