//! Catalog Search CLI Library
//!
//! Loads JSON catalog snapshots and drives the semantic search engine:
//! backfilling stored embeddings, running queries, and verifying ranking
//! against a fixed query set.

pub mod catalog;
pub mod commands;
pub mod error;

pub use catalog::{Catalog, CatalogRecord};
pub use error::{CliError, CliResult};
