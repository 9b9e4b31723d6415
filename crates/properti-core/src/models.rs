//! Core data models for properti-search.
//!
//! Listing records are owned by the datastore; the search engine only reads
//! and reshapes them. Field names follow the `properties` table columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// LISTING TYPES
// =============================================================================

/// Listing projection returned by every search strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ListingRecord {
    pub id: Uuid,
    pub kode_listing: String,
    pub judul_properti: String,
    pub deskripsi: Option<String>,
    pub jenis_properti: String,
    /// Asking price in rupiah.
    pub harga_properti: Option<i64>,
    /// Listing status, e.g. "dijual" or "disewakan".
    pub status: String,
    pub is_sold: bool,
    pub kabupaten: Option<String>,
    pub provinsi: Option<String>,
    pub alamat_lengkap: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Full-text rank; only the full-text strategy fills this in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_score: Option<f32>,
}

impl ListingRecord {
    /// Create a listing with the required fields; the rest default to empty.
    pub fn new(
        kode_listing: impl Into<String>,
        judul_properti: impl Into<String>,
        jenis_properti: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kode_listing: kode_listing.into(),
            judul_properti: judul_properti.into(),
            deskripsi: None,
            jenis_properti: jenis_properti.into(),
            harga_properti: None,
            status: "dijual".to_string(),
            is_sold: false,
            kabupaten: None,
            provinsi: None,
            alamat_lengkap: None,
            created_at: Utc::now(),
            search_score: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_description(mut self, deskripsi: impl Into<String>) -> Self {
        self.deskripsi = Some(deskripsi.into());
        self
    }

    pub fn with_price(mut self, harga: i64) -> Self {
        self.harga_properti = Some(harga);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn sold(mut self, is_sold: bool) -> Self {
        self.is_sold = is_sold;
        self
    }

    /// Set regency and province.
    pub fn with_locality(mut self, kabupaten: impl Into<String>, provinsi: impl Into<String>) -> Self {
        self.kabupaten = Some(kabupaten.into());
        self.provinsi = Some(provinsi.into());
        self
    }

    pub fn with_address(mut self, alamat: impl Into<String>) -> Self {
        self.alamat_lengkap = Some(alamat.into());
        self
    }

    pub fn created_at(mut self, ts: DateTime<Utc>) -> Self {
        self.created_at = ts;
        self
    }
}

/// One page of listings plus the exact number of rows matching the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    pub records: Vec<ListingRecord>,
    pub total_count: i64,
}

impl ListingPage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_defaults() {
        let listing = ListingRecord::new("R8.01", "Rumah Condongcatur", "rumah");
        assert_eq!(listing.kode_listing, "R8.01");
        assert_eq!(listing.status, "dijual");
        assert!(!listing.is_sold);
        assert!(listing.harga_properti.is_none());
        assert!(listing.search_score.is_none());
    }

    #[test]
    fn test_listing_builder_chain() {
        let listing = ListingRecord::new("T53", "Tanah Kavling", "tanah")
            .with_price(450_000_000)
            .with_locality("Sleman", "DI Yogyakarta")
            .with_address("Jl. Kaliurang KM 9")
            .with_status("disewakan")
            .sold(true);

        assert_eq!(listing.harga_properti, Some(450_000_000));
        assert_eq!(listing.kabupaten.as_deref(), Some("Sleman"));
        assert_eq!(listing.provinsi.as_deref(), Some("DI Yogyakarta"));
        assert_eq!(listing.alamat_lengkap.as_deref(), Some("Jl. Kaliurang KM 9"));
        assert_eq!(listing.status, "disewakan");
        assert!(listing.is_sold);
    }

    #[test]
    fn test_listing_serializes_with_column_names() {
        let listing = ListingRecord::new("K9.02", "Kost Putri", "kost");
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["kode_listing"], "K9.02");
        assert_eq!(json["judul_properti"], "Kost Putri");
        assert!(json.get("search_score").is_none());
    }

    #[test]
    fn test_empty_page() {
        let page = ListingPage::empty();
        assert!(page.is_empty());
        assert_eq!(page.total_count, 0);
    }
}
