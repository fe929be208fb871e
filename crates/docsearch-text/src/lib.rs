//! docsearch-text
//!
//! Tantivy-backed index store: schema and analyzer, index lifecycle,
//! upsert-by-id bulk writes, and the weighted multi-field query API.

pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::TantivyStore;
