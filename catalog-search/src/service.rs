//! Async search service
//!
//! Encoder construction and inference are CPU-bound and can be slow, so the
//! service runs them on tokio's blocking pool, caps how many run at once,
//! and bounds each with a timeout. Ranking itself runs inline.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::error::{Result, SearchError};
use crate::index::CandidateIndex;
use crate::search::{
    normalize_query, rank_encoded, validate_threshold, SearchOutcome, SemanticSearch,
};
use crate::vector::EmbeddingVector;

/// Environment variable overriding the encode timeout (milliseconds)
pub const EMBED_TIMEOUT_ENV: &str = "CATALOG_SEARCH_EMBED_TIMEOUT_MS";

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upper bound on one encoder call, including first-use construction
    /// (default: 5s)
    pub encode_timeout: Duration,
    /// Encoder calls allowed to run at once (default: 4)
    pub max_concurrent_encodes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            encode_timeout: Duration::from_secs(5),
            max_concurrent_encodes: 4,
        }
    }
}

impl ServiceConfig {
    /// Defaults, with `CATALOG_SEARCH_EMBED_TIMEOUT_MS` applied if set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = std::env::var(EMBED_TIMEOUT_ENV)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.encode_timeout = Duration::from_millis(ms);
        }
        config
    }
}

/// Search engine wrapper for async hosts
pub struct SearchService {
    engine: Arc<SemanticSearch>,
    permits: Arc<Semaphore>,
    config: ServiceConfig,
}

impl SearchService {
    pub fn new(engine: Arc<SemanticSearch>, config: ServiceConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_encodes.max(1)));
        Self {
            engine,
            permits,
            config,
        }
    }

    pub fn engine(&self) -> &Arc<SemanticSearch> {
        &self.engine
    }

    /// Construct the encoder now instead of on the first query
    pub async fn warm_up(&self) -> Result<()> {
        let engine = self.engine.clone();
        self.run_blocking(move || engine.provider().get_model().map(|_| ()))
            .await
    }

    /// Async variant of [`EmbeddingProvider::generate_embedding`]
    ///
    /// [`EmbeddingProvider::generate_embedding`]: crate::EmbeddingProvider::generate_embedding
    pub async fn generate_embedding(
        &self,
        text: Option<String>,
    ) -> Result<Option<EmbeddingVector>> {
        let text = match text {
            Some(text) if !text.is_empty() => text,
            _ => return Ok(None),
        };
        let engine = self.engine.clone();
        self.run_blocking(move || engine.provider().generate_embedding(Some(&text)))
            .await
    }

    /// Search with the engine's configured limit and threshold
    pub async fn search<I, X>(&self, query: Option<&str>, index: &X) -> Result<SearchOutcome<I>>
    where
        I: Clone,
        X: CandidateIndex<I> + ?Sized,
    {
        let config = self.engine.config().clone();
        self.semantic_search(query, index, config.limit, config.threshold)
            .await
    }

    /// Async variant of [`SemanticSearch::semantic_search`]
    pub async fn semantic_search<I, X>(
        &self,
        query: Option<&str>,
        index: &X,
        limit: usize,
        threshold: f32,
    ) -> Result<SearchOutcome<I>>
    where
        I: Clone,
        X: CandidateIndex<I> + ?Sized,
    {
        let query = match normalize_query(query) {
            Some(query) => query.to_string(),
            // No encoder involved; the engine lists by recency
            None => return self.engine.semantic_search(None, index, limit, threshold),
        };

        validate_threshold(threshold)?;

        let query_vector = self.generate_embedding(Some(query)).await?;
        Ok(rank_encoded(query_vector.as_ref(), index, limit, threshold))
    }

    /// Run `work` on the blocking pool under a permit
    ///
    /// The permit moves into the blocking task, so work abandoned by a
    /// timeout keeps its slot until it actually finishes. The timeout
    /// covers waiting for a permit as well as the work itself.
    async fn run_blocking<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let permits = self.permits.clone();
        let task = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|_| SearchError::encoding("Encoder pool closed"))?;

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                work()
            })
            .await
            .map_err(|join_err| {
                SearchError::encoding(format!("Encoder task failed: {}", join_err))
            })?
        };

        match tokio::time::timeout(self.config.encode_timeout, task).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "Encoder call exceeded {}ms",
                    self.config.encode_timeout.as_millis()
                );
                Err(SearchError::encoding(format!(
                    "Encoder timed out after {}ms",
                    self.config.encode_timeout.as_millis()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{Candidate, CandidatePool};
    use crate::embedding::{EmbeddingProvider, ProviderConfig, TextEncoder};
    use crate::search::SearchConfig;
    use crate::testing::KeywordEncoder;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SlowEncoder;

    impl TextEncoder for SlowEncoder {
        fn model_name(&self) -> &str {
            "slow-test"
        }

        fn dimension(&self) -> usize {
            2
        }

        fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(vec![1.0, 0.0])
        }
    }

    fn service(encoder: Arc<dyn TextEncoder>, config: ServiceConfig) -> SearchService {
        let provider = Arc::new(EmbeddingProvider::eager(encoder, ProviderConfig::default()));
        let engine = SemanticSearch::new(provider, SearchConfig::default()).unwrap();
        SearchService::new(Arc::new(engine), config)
    }

    #[tokio::test]
    async fn test_search_matches_sync_engine() {
        let service = service(Arc::new(KeywordEncoder), ServiceConfig::default());
        let jacket = service
            .generate_embedding(Some("winter coat".to_string()))
            .await
            .unwrap();
        let pool = CandidatePool::from_snapshot(vec![
            Candidate::new(1u32, Utc::now()).with_optional_embedding(jacket),
            Candidate::new(2u32, Utc::now()),
        ]);

        let outcome = service.search(Some("warm jacket"), &pool).await.unwrap();
        assert_eq!(outcome.ids(), vec![1]);

        let sync = service
            .engine()
            .search(Some("warm jacket"), &pool)
            .unwrap();
        assert_eq!(outcome, sync);
    }

    #[tokio::test]
    async fn test_empty_query_skips_encoder() {
        let service = service(Arc::new(SlowEncoder), ServiceConfig {
            encode_timeout: Duration::from_millis(1),
            max_concurrent_encodes: 1,
        });
        let pool = CandidatePool::from_snapshot(vec![Candidate::new("a", Utc::now())]);
        let outcome = service.search(Some("  "), &pool).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Recent(vec!["a"]));
        assert!(service.generate_embedding(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_encoding_unavailable() {
        let service = service(Arc::new(SlowEncoder), ServiceConfig {
            encode_timeout: Duration::from_millis(20),
            max_concurrent_encodes: 1,
        });
        let pool: CandidatePool<u32> = CandidatePool::default();
        let err = service.search(Some("anything"), &pool).await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("timed out"));
    }

    /// Encoder that records how many encodes overlap
    #[derive(Default)]
    struct OverlapEncoder {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl TextEncoder for OverlapEncoder {
        fn model_name(&self) -> &str {
            "overlap-test"
        }

        fn dimension(&self) -> usize {
            2
        }

        fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(150));
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![1.0, 0.0])
        }
    }

    #[tokio::test]
    async fn test_timed_out_encodes_keep_their_permit() {
        let encoder = Arc::new(OverlapEncoder::default());
        let service = service(encoder.clone(), ServiceConfig {
            encode_timeout: Duration::from_millis(10),
            max_concurrent_encodes: 1,
        });
        let pool: CandidatePool<u32> = CandidatePool::default();

        for i in 0..5 {
            let query = format!("query {}", i);
            let err = service.search(Some(&query), &pool).await.unwrap_err();
            assert!(err.is_unavailable());
        }

        // Wait for abandoned encodes to drain
        let _all = service.permits.acquire().await.unwrap();
        assert_eq!(encoder.running.load(Ordering::SeqCst), 0);
        assert_eq!(encoder.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_searches_respect_permit_count() {
        let encoder = Arc::new(OverlapEncoder::default());
        let service = Arc::new(service(encoder.clone(), ServiceConfig {
            encode_timeout: Duration::from_secs(10),
            max_concurrent_encodes: 2,
        }));

        let mut handles = Vec::new();
        for i in 0..6 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.generate_embedding(Some(format!("item {}", i))).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }
        assert!(encoder.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_query_ignores_threshold() {
        let service = service(Arc::new(KeywordEncoder), ServiceConfig::default());
        let pool = CandidatePool::from_snapshot(vec![Candidate::new(7u32, Utc::now())]);
        let outcome = service
            .semantic_search(None, &pool, 5, 1.5)
            .await
            .unwrap();
        assert_eq!(outcome, SearchOutcome::Recent(vec![7]));
    }

    #[test]
    fn test_warm_up_loads_lazy_provider() {
        let provider = Arc::new(EmbeddingProvider::lazy(
            || Ok(Arc::new(KeywordEncoder) as Arc<dyn TextEncoder>),
            ProviderConfig::default(),
        ));
        let engine =
            Arc::new(SemanticSearch::new(provider.clone(), SearchConfig::default()).unwrap());
        let service = SearchService::new(engine, ServiceConfig::default());

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(service.warm_up()).unwrap();
        assert!(provider.is_loaded());
        assert_eq!(provider.construction_count(), 1);
    }

    #[test]
    fn test_config_default() {
        let config = ServiceConfig::default();
        assert_eq!(config.encode_timeout, Duration::from_secs(5));
        assert_eq!(config.max_concurrent_encodes, 4);
    }

    #[test]
    fn test_block_on_generate() {
        let service = service(Arc::new(KeywordEncoder), ServiceConfig::default());
        let vector = tokio_test::block_on(service.generate_embedding(Some("bike helmet".into())));
        assert!(vector.unwrap().is_some());
    }
}
