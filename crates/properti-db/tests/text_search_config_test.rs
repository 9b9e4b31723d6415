//! Tests to verify that the schema and the SQL builder agree on the text
//! search configuration and on the columns every strategy reads.
//!
//! These check source text only. They do not require a database connection.

const MIGRATION: &str = include_str!("../../../migrations/20260301000000_properties.sql");
const SQL_SOURCE: &str = include_str!("../src/sql.rs");

#[test]
fn test_search_vector_uses_indonesian_config() {
    assert_eq!(
        MIGRATION.matches("'english'").count(),
        0,
        "properties migration should not use the 'english' text search config"
    );
    assert!(
        MIGRATION.matches("'indonesian'::regconfig").count() >= 5,
        "every search_vector segment should be built with 'indonesian'"
    );
}

#[test]
fn test_default_text_config_matches_schema() {
    let config = properti_core::defaults::TEXT_SEARCH_CONFIG;
    assert!(MIGRATION.contains(&format!("'{config}'::regconfig")));
}

#[test]
fn test_builder_reads_generated_search_vector() {
    assert!(MIGRATION.contains("search_vector   TSVECTOR GENERATED ALWAYS"));
    assert!(SQL_SOURCE.contains("search_vector @@ websearch_to_tsquery"));
}

#[test]
fn test_pattern_columns_have_trigram_indexes() {
    for column in ["judul_properti", "kode_listing", "alamat_lengkap", "deskripsi"] {
        assert!(
            MIGRATION.contains(&format!("({column} gin_trgm_ops)")),
            "missing trigram index on {column}"
        );
    }
}
