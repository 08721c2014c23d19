//! Embedding provider
//!
//! Owns the encoder lifecycle: the encoder is expensive to construct, so it
//! is built once (on first use, or eagerly at start-up) and shared for the
//! provider's lifetime. Recent query embeddings are kept in an LRU cache.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use super::encoder::TextEncoder;
use super::sentence::{EncoderConfig, FastEmbedEncoder};
use crate::error::{Result, SearchError};
use crate::vector::EmbeddingVector;

/// Builds the encoder on first use
pub type EncoderFactory = Box<dyn Fn() -> Result<Arc<dyn TextEncoder>> + Send + Sync>;

/// Provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Number of recent texts whose embeddings are cached (0 disables)
    pub query_cache_capacity: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            query_cache_capacity: 256,
        }
    }
}

/// Lazily-initialized, shared text encoder with an embedding cache
pub struct EmbeddingProvider {
    factory: EncoderFactory,
    model: OnceLock<Arc<dyn TextEncoder>>,
    init_lock: Mutex<()>,
    constructions: AtomicUsize,
    cache: Option<Mutex<LruCache<String, EmbeddingVector>>>,
}

impl EmbeddingProvider {
    /// Create a provider that constructs its encoder on first use
    pub fn lazy<F>(factory: F, config: ProviderConfig) -> Self
    where
        F: Fn() -> Result<Arc<dyn TextEncoder>> + Send + Sync + 'static,
    {
        let cache = NonZeroUsize::new(config.query_cache_capacity)
            .map(|capacity| Mutex::new(LruCache::new(capacity)));

        Self {
            factory: Box::new(factory),
            model: OnceLock::new(),
            init_lock: Mutex::new(()),
            constructions: AtomicUsize::new(0),
            cache,
        }
    }

    /// Create a provider around an already constructed encoder
    pub fn eager(encoder: Arc<dyn TextEncoder>, config: ProviderConfig) -> Self {
        let factory_encoder = encoder.clone();
        let provider = Self::lazy(move || Ok(factory_encoder.clone()), config);
        let _ = provider.model.set(encoder);
        provider.constructions.store(1, Ordering::SeqCst);
        provider
    }

    /// Create a provider backed by a fastembed sentence encoder
    pub fn fastembed(encoder_config: EncoderConfig, config: ProviderConfig) -> Self {
        Self::lazy(
            move || {
                let encoder = FastEmbedEncoder::new(encoder_config.clone())?;
                Ok(Arc::new(encoder) as Arc<dyn TextEncoder>)
            },
            config,
        )
    }

    /// Get the shared encoder, constructing it on first call
    ///
    /// Concurrent first calls construct the encoder exactly once. A failed
    /// construction is not remembered; the next call tries again.
    pub fn get_model(&self) -> Result<Arc<dyn TextEncoder>> {
        if let Some(model) = self.model.get() {
            return Ok(model.clone());
        }

        let _guard = self.init_lock.lock();
        if let Some(model) = self.model.get() {
            return Ok(model.clone());
        }

        let model = (self.factory)().map_err(|e| {
            log::warn!("Encoder construction failed: {}", e);
            match e {
                SearchError::EncodingUnavailable(_) => e,
                other => SearchError::encoding(other.to_string()),
            }
        })?;
        self.constructions.fetch_add(1, Ordering::SeqCst);
        log::info!(
            "Encoder {} ready ({}d)",
            model.model_name(),
            model.dimension()
        );

        let _ = self.model.set(model.clone());
        Ok(model)
    }

    /// Whether the encoder has been constructed
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// Number of times the encoder has been constructed
    pub fn construction_count(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    /// Dimension of vectors produced by the encoder (loads it if needed)
    pub fn dimension(&self) -> Result<usize> {
        Ok(self.get_model()?.dimension())
    }

    /// Generate the embedding for `text`
    ///
    /// Returns `Ok(None)` for absent or empty text; such items and queries
    /// are never semantically matched. Encoder failures are returned as
    /// [`SearchError::EncodingUnavailable`].
    pub fn generate_embedding(&self, text: Option<&str>) -> Result<Option<EmbeddingVector>> {
        let text = match text {
            Some(text) if !text.is_empty() => text,
            _ => return Ok(None),
        };

        if let Some(cached) = self.cache_get(text) {
            log::debug!("Embedding cache hit ({} chars)", text.len());
            return Ok(Some(cached));
        }

        let model = self.get_model()?;
        let raw = model.encode(text)?;
        let vector = checked_vector(raw, model.dimension())?;

        self.cache_put(text, &vector);
        Ok(Some(vector))
    }

    /// Batch variant of [`generate_embedding`](Self::generate_embedding)
    ///
    /// Output order matches input order; absent or empty texts map to
    /// `None`. Uncached texts are sent to the encoder in a single batch.
    pub fn generate_embeddings(
        &self,
        texts: &[Option<&str>],
    ) -> Result<Vec<Option<EmbeddingVector>>> {
        let mut results: Vec<Option<EmbeddingVector>> = texts
            .iter()
            .map(|text| text.filter(|t| !t.is_empty()).and_then(|t| self.cache_get(t)))
            .collect();

        let uncached: Vec<(usize, &str)> = texts
            .iter()
            .enumerate()
            .filter(|(i, _)| results[*i].is_none())
            .filter_map(|(i, text)| text.filter(|t| !t.is_empty()).map(|t| (i, t)))
            .collect();

        if uncached.is_empty() {
            return Ok(results);
        }

        let model = self.get_model()?;
        let batch: Vec<&str> = uncached.iter().map(|(_, t)| *t).collect();
        let embeddings = model.encode_batch(&batch)?;

        if embeddings.len() != batch.len() {
            return Err(SearchError::encoding(format!(
                "Encoder returned {} embeddings for {} texts",
                embeddings.len(),
                batch.len()
            )));
        }

        for ((idx, text), raw) in uncached.into_iter().zip(embeddings) {
            let vector = checked_vector(raw, model.dimension())?;
            self.cache_put(text, &vector);
            results[idx] = Some(vector);
        }

        Ok(results)
    }

    /// Get cache size
    pub fn cache_size(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.lock().len())
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }

    fn cache_get(&self, text: &str) -> Option<EmbeddingVector> {
        self.cache.as_ref()?.lock().get(text).cloned()
    }

    fn cache_put(&self, text: &str, vector: &EmbeddingVector) {
        if let Some(cache) = &self.cache {
            cache.lock().put(text.to_string(), vector.clone());
        }
    }
}

/// Validate raw encoder output; a bad vector is an encoder failure
fn checked_vector(raw: Vec<f32>, dimension: usize) -> Result<EmbeddingVector> {
    EmbeddingVector::with_dimension(raw, dimension)
        .map_err(|e| SearchError::encoding(format!("Encoder produced an invalid vector: {}", e)))
}

/// Source text for a catalog item: title and description joined by a space
///
/// Surrounding whitespace is trimmed, so an item with neither title nor
/// description yields an empty string and therefore no embedding.
pub fn item_text(title: &str, description: Option<&str>) -> String {
    format!("{} {}", title, description.unwrap_or("")).trim().to_string()
}
