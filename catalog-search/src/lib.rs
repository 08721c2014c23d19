//! Catalog Semantic Search
//!
//! Similarity ranking for marketplace listings: free-text queries are
//! encoded into dense vectors and catalog items are ranked by cosine
//! similarity against a score threshold.
//!
//! ## Features
//!
//! - **Lazy shared encoder** - fastembed sentence encoder constructed once, on first use
//! - **Exact ranking** - stable cosine ranking with a configurable threshold
//! - **Recency fallback** - empty queries list the newest active items
//! - **Swappable index** - exact scan or HNSW behind one trait
//! - **Async service** - bounded, time-limited encoding for async hosts
//!
//! ## Example
//!
//! ```ignore
//! use catalog_search::{
//!     Candidate, CandidatePool, EmbeddingProvider, EncoderConfig, ProviderConfig,
//!     SearchConfig, SemanticSearch,
//! };
//! use std::sync::Arc;
//!
//! let provider = Arc::new(EmbeddingProvider::fastembed(
//!     EncoderConfig::from_env(),
//!     ProviderConfig::default(),
//! ));
//! let engine = SemanticSearch::new(provider.clone(), SearchConfig::default())?;
//!
//! let vector = provider.generate_embedding(Some("Mini fridge Great for dorms"))?;
//! let pool = CandidatePool::from_snapshot(vec![
//!     Candidate::new(42_u64, created_at).with_optional_embedding(vector),
//! ]);
//!
//! let outcome = engine.search(Some("cold drink storage"), &pool)?;
//! let filter = outcome.filter();
//! ```

pub mod backfill;
pub mod candidate;
pub mod codec;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ranker;
pub mod search;
pub mod service;
pub mod vector;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use backfill::{backfill_embeddings, refresh_embedding, BackfillReport, Embeddable};
pub use candidate::{Candidate, CandidatePool, ScoredCandidate};
pub use codec::{decode_optional, decode_vector, encode_vector};
pub use embedding::{
    item_text, EmbeddingProvider, EncoderConfig, FastEmbedEncoder, ProviderConfig, TextEncoder,
};
pub use error::{Result, SearchError};
pub use index::{CandidateIndex, HnswIndex};
pub use ranker::{cosine_similarity, rank};
pub use search::{
    normalize_query, IdFilter, SearchConfig, SearchOutcome, SemanticSearch, DEFAULT_LIMIT,
    DEFAULT_THRESHOLD,
};
pub use service::{SearchService, ServiceConfig};
pub use vector::{EmbeddingVector, DEFAULT_DIMENSION};
