//! Encoder abstraction
//!
//! Anything that turns text into a fixed-length dense vector.

use crate::error::Result;

/// Text encoder backing the embedding provider
///
/// Implementations must be deterministic for the lifetime of the process:
/// encoding the same text twice yields the same vector.
pub trait TextEncoder: Send + Sync {
    /// Human readable model identifier
    fn model_name(&self) -> &str;

    /// Length of every vector this encoder produces
    fn dimension(&self) -> usize;

    /// Encode a single, non-empty text
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Encode several texts; output order matches input order
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }
}
