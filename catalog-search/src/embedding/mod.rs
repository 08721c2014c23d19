//! Embedding module for semantic search
//!
//! Uses fastembed sentence encoders (all-MiniLM-L6-v2 by default) behind
//! the [`TextEncoder`] trait.

mod discovery;
mod encoder;
mod provider;
mod sentence;

pub use discovery::{find_model_cache_dir, MODEL_CACHE_ENV};
pub use encoder::TextEncoder;
pub use provider::{item_text, EmbeddingProvider, EncoderFactory, ProviderConfig};
pub use sentence::{EncoderConfig, FastEmbedEncoder, DEFAULT_MODEL, MODEL_ENV};
