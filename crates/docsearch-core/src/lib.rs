//! docsearch-core
//!
//! Domain types, error taxonomy, inference/store traits, configuration and
//! corpus loading shared by the other docsearch crates.

pub mod config;
pub mod corpus;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result, Stage};
