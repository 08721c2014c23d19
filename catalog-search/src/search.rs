//! Semantic search engine
//!
//! Encodes a free-text query and ranks a candidate index against it, or
//! falls back to a recency listing when there is no query.

use std::sync::Arc;

use crate::candidate::ScoredCandidate;
use crate::embedding::EmbeddingProvider;
use crate::error::{Result, SearchError};
use crate::index::CandidateIndex;
use crate::vector::EmbeddingVector;

/// Default minimum similarity for a match
pub const DEFAULT_THRESHOLD: f32 = 0.25;

/// Default number of results
pub const DEFAULT_LIMIT: usize = 20;

/// Search configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum results to return (default: 20)
    pub limit: usize,
    /// Minimum cosine similarity for a match (default: 0.25)
    pub threshold: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl SearchConfig {
    /// Reject a zero limit and thresholds outside [-1, 1]
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(SearchError::config("limit must be at least 1"));
        }
        validate_threshold(self.threshold)
    }
}

pub(crate) fn validate_threshold(threshold: f32) -> Result<()> {
    if !(-1.0..=1.0).contains(&threshold) {
        return Err(SearchError::config(format!(
            "threshold must be within [-1, 1], got {}",
            threshold
        )));
    }
    Ok(())
}

/// Result of one search call
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<I> {
    /// No query was given: newest candidates, newest first
    Recent(Vec<I>),
    /// Query was ranked: matches above the threshold, best first.
    /// Empty means "no matches", not "no filter".
    Ranked(Vec<ScoredCandidate<I>>),
}

impl<I: Clone> SearchOutcome<I> {
    /// Result ids in order
    pub fn ids(&self) -> Vec<I> {
        match self {
            Self::Recent(ids) => ids.clone(),
            Self::Ranked(hits) => hits.iter().map(|h| h.id.clone()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Recent(ids) => ids.len(),
            Self::Ranked(hits) => hits.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the query was ranked and nothing cleared the threshold
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::Ranked(hits) if hits.is_empty())
    }

    /// Listing constraint a caller must apply to its own record query
    ///
    /// A recency listing imposes no constraint; a ranked outcome restricts
    /// the listing to exactly its ids, which is the empty set when nothing
    /// matched.
    pub fn filter(&self) -> IdFilter<I> {
        match self {
            Self::Recent(_) => IdFilter::Unfiltered,
            Self::Ranked(hits) => IdFilter::Only(hits.iter().map(|h| h.id.clone()).collect()),
        }
    }
}

/// Constraint on which records a listing may show
#[derive(Debug, Clone, PartialEq)]
pub enum IdFilter<I> {
    /// Show everything that passes the caller's other filters
    Unfiltered,
    /// Show only these ids; the list is best first, see
    /// [`rank_of`](Self::rank_of)
    Only(Vec<I>),
}

impl<I: PartialEq> IdFilter<I> {
    /// Whether a record with this id may be listed
    pub fn admits(&self, id: &I) -> bool {
        match self {
            Self::Unfiltered => true,
            Self::Only(ids) => ids.contains(id),
        }
    }

    /// Relevance position of `id`, if the filter ranks it
    pub fn rank_of(&self, id: &I) -> Option<usize> {
        match self {
            Self::Unfiltered => None,
            Self::Only(ids) => ids.iter().position(|candidate| candidate == id),
        }
    }

    /// Keep the records this filter admits, preserving their order
    ///
    /// Callers that want relevance order sort the result by
    /// [`rank_of`](Self::rank_of).
    pub fn apply<T, F>(&self, records: Vec<T>, id_of: F) -> Vec<T>
    where
        F: Fn(&T) -> &I,
    {
        match self {
            Self::Unfiltered => records,
            Self::Only(_) => records
                .into_iter()
                .filter(|record| self.admits(id_of(record)))
                .collect(),
        }
    }
}

/// Trim a query; absent, empty, and whitespace-only queries become `None`
pub fn normalize_query(query: Option<&str>) -> Option<&str> {
    query.map(str::trim).filter(|q| !q.is_empty())
}

/// Semantic search engine
pub struct SemanticSearch {
    provider: Arc<EmbeddingProvider>,
    config: SearchConfig,
}

impl SemanticSearch {
    /// Create new search engine
    pub fn new(provider: Arc<EmbeddingProvider>, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { provider, config })
    }

    pub fn provider(&self) -> &Arc<EmbeddingProvider> {
        &self.provider
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search with the configured limit and threshold
    pub fn search<I, X>(&self, query: Option<&str>, index: &X) -> Result<SearchOutcome<I>>
    where
        I: Clone,
        X: CandidateIndex<I> + ?Sized,
    {
        self.semantic_search(query, index, self.config.limit, self.config.threshold)
    }

    /// Rank `index` against `query`
    ///
    /// - no query: the `limit` newest candidates, threshold ignored
    /// - query encodes to nothing: no matches
    /// - otherwise: candidates with a vector scoring at least `threshold`,
    ///   best first, ties in index order, at most `limit`
    ///
    /// Encoder failures are returned as [`SearchError::EncodingUnavailable`]
    /// and must be shown as "search unavailable", not as "no results".
    pub fn semantic_search<I, X>(
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
            Some(query) => query,
            None => return Ok(SearchOutcome::Recent(index.most_recent(limit))),
        };

        validate_threshold(threshold)?;

        let query_vector = self.provider.generate_embedding(Some(query))?;
        Ok(rank_encoded(query_vector.as_ref(), index, limit, threshold))
    }
}

/// Ranking step of a search whose query was already encoded
pub(crate) fn rank_encoded<I, X>(
    query_vector: Option<&EmbeddingVector>,
    index: &X,
    limit: usize,
    threshold: f32,
) -> SearchOutcome<I>
where
    I: Clone,
    X: CandidateIndex<I> + ?Sized,
{
    let query_vector = match query_vector {
        Some(v) => v,
        None => return SearchOutcome::Ranked(Vec::new()),
    };

    if index.embedded_len() == 0 {
        log::debug!("No candidates carry embeddings; nothing to rank");
        return SearchOutcome::Ranked(Vec::new());
    }

    let hits = index.nearest(query_vector, limit, threshold);
    log::debug!(
        "Ranked {} candidates: {} matches at threshold {}",
        index.embedded_len(),
        hits.len(),
        threshold
    );
    SearchOutcome::Ranked(hits)
}
