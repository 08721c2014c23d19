//! Sentence encoder backed by fastembed
//!
//! Local ONNX inference for sentence-transformer models. The default
//! all-MiniLM-L6-v2 produces 384-dimensional vectors.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;

use super::discovery::find_model_cache_dir;
use super::encoder::TextEncoder;
use crate::error::{Result, SearchError};

/// Environment variable selecting the encoder model
pub const MODEL_ENV: &str = "CATALOG_SEARCH_MODEL";

/// Default model name
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Encoder configuration
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Model name (default: all-MiniLM-L6-v2)
    pub model: String,
    /// Where model weights are cached or downloaded to
    pub cache_dir: PathBuf,
    /// Show a progress bar while downloading weights
    pub show_download_progress: bool,
    /// Maximum sequence length in tokens (default: 256)
    pub max_length: usize,
    /// Batch size for bulk encoding (default: 64)
    pub batch_size: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            cache_dir: PathBuf::from("models"),
            show_download_progress: false,
            max_length: 256,
            batch_size: 64,
        }
    }
}

impl EncoderConfig {
    /// Build configuration from the environment
    ///
    /// Reads `CATALOG_SEARCH_MODEL` and resolves the cache directory with
    /// [`find_model_cache_dir`].
    pub fn from_env() -> Self {
        Self {
            model: std::env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            cache_dir: find_model_cache_dir(std::env::current_dir().ok().as_deref()),
            ..Self::default()
        }
    }
}

/// Resolve a model name to the fastembed model and its output dimension
fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    match name.to_ascii_lowercase().as_str() {
        "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
            Ok((EmbeddingModel::AllMiniLML6V2, 384))
        }
        "all-minilm-l12-v2" | "sentence-transformers/all-minilm-l12-v2" => {
            Ok((EmbeddingModel::AllMiniLML12V2, 384))
        }
        "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" | "baai/bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        other => Err(SearchError::config(format!(
            "unsupported encoder model: {}",
            other
        ))),
    }
}

/// FastEmbed encoder wrapper
pub struct FastEmbedEncoder {
    model: TextEmbedding,
    config: EncoderConfig,
    dimension: usize,
}

impl FastEmbedEncoder {
    /// Load the configured model, downloading weights into the cache
    /// directory if they are not there yet
    pub fn new(config: EncoderConfig) -> Result<Self> {
        let (model_kind, dimension) = resolve_model(&config.model)?;

        log::info!(
            "Loading encoder {} from cache {}",
            config.model,
            config.cache_dir.display()
        );

        let options = InitOptions::new(model_kind)
            .with_cache_dir(config.cache_dir.clone())
            .with_show_download_progress(config.show_download_progress)
            .with_max_length(config.max_length);

        let model = TextEmbedding::try_new(options)
            .map_err(|e| SearchError::encoding(format!("Failed to load {}: {}", config.model, e)))?;

        log::info!(
            "Loaded encoder {} ({}d, max {} tokens)",
            config.model,
            dimension,
            config.max_length
        );

        Ok(Self {
            model,
            config,
            dimension,
        })
    }

    /// Get configuration
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}

impl TextEncoder for FastEmbedEncoder {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self
            .model
            .embed(vec![text], None)
            .map_err(|e| SearchError::encoding(format!("Failed to encode text: {}", e)))?;

        embeddings
            .pop()
            .ok_or_else(|| SearchError::encoding("Encoder returned no embedding"))
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        self.model
            .embed(texts.to_vec(), Some(self.config.batch_size))
            .map_err(|e| SearchError::encoding(format!("Failed to encode texts: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default_model() {
        let (_, dimension) = resolve_model(DEFAULT_MODEL).unwrap();
        assert_eq!(dimension, crate::vector::DEFAULT_DIMENSION);
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        assert!(resolve_model("sentence-transformers/All-MiniLM-L6-v2").is_ok());
        assert_eq!(resolve_model("BAAI/bge-base-en-v1.5").unwrap().1, 768);
    }

    #[test]
    fn test_resolve_unknown_model() {
        let err = resolve_model("word2vec-google-news").unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
    }

    #[test]
    fn test_config_default() {
        let config = EncoderConfig::default();
        assert_eq!(config.model, "all-MiniLM-L6-v2");
        assert_eq!(config.max_length, 256);
        assert!(!config.show_download_progress);
    }
}
