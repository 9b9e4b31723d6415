//! Core traits for properti-search abstractions.
//!
//! These traits define the interfaces that datastore adapters must satisfy,
//! enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ListingPage;
use crate::query::ListingQuery;

/// Query execution surface consumed by the search engine.
///
/// Implementations must return an exact `total_count` for the unpaged match
/// set alongside the requested page.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Execute a typed listing query.
    async fn execute(&self, query: &ListingQuery) -> Result<ListingPage>;

    /// Short adapter name for logs.
    fn name(&self) -> &'static str {
        "listing_store"
    }
}

#[async_trait]
impl<T: ListingStore + ?Sized> ListingStore for std::sync::Arc<T> {
    async fn execute(&self, query: &ListingQuery) -> Result<ListingPage> {
        (**self).execute(query).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::ListingRecord;
    use crate::query::TextMatch;

    struct SingleListing;

    #[async_trait]
    impl ListingStore for SingleListing {
        async fn execute(&self, _query: &ListingQuery) -> Result<ListingPage> {
            Ok(ListingPage {
                records: vec![ListingRecord::new("R8.01", "Rumah Minimalis", "Rumah")],
                total_count: 1,
            })
        }

        fn name(&self) -> &'static str {
            "single"
        }
    }

    #[tokio::test]
    async fn test_arc_store_delegates() {
        let store: Arc<dyn ListingStore> = Arc::new(SingleListing);
        let query = ListingQuery::new(
            crate::search::SearchStrategyKind::Fallback,
            TextMatch::ExactCode("R8.01".to_string()),
        );

        let page = store.execute(&query).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.records[0].kode_listing, "R8.01");
        assert_eq!(store.name(), "single");
    }
}
