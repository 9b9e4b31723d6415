//! # properti-core
//!
//! Core types, traits, and abstractions for the properti-search library.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other properti crates depend on: listing records, search options
//! and responses, the typed listing query, and the `ListingStore` trait.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod search;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use query::*;
pub use search::*;
pub use traits::*;
