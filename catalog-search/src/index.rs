//! Candidate indexes
//!
//! [`CandidatePool`] is an exact O(n) scan and the default for catalogs up
//! to roughly ten thousand items. [`HnswIndex`] trades exactness for
//! O(log n) lookups on larger catalogs and can be passed anywhere a pool
//! can.

use chrono::{DateTime, Utc};
use instant_distance::{Builder, HnswMap, Point, Search};

use crate::candidate::{CandidatePool, ScoredCandidate};
use crate::ranker::{cosine, rank};
use crate::vector::EmbeddingVector;

/// Source of candidates for a semantic search
pub trait CandidateIndex<I> {
    /// Number of active candidates
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of candidates that carry a stored vector
    fn embedded_len(&self) -> usize;

    /// Ids of the `limit` newest candidates, newest first
    fn most_recent(&self, limit: usize) -> Vec<I>;

    /// Candidates scoring at least `threshold` against `query`, best first,
    /// at most `limit` of them
    fn nearest(&self, query: &EmbeddingVector, limit: usize, threshold: f32)
        -> Vec<ScoredCandidate<I>>;
}

impl<I: Clone> CandidateIndex<I> for CandidatePool<I> {
    fn len(&self) -> usize {
        CandidatePool::len(self)
    }

    fn embedded_len(&self) -> usize {
        self.embedded_count()
    }

    fn most_recent(&self, limit: usize) -> Vec<I> {
        CandidatePool::most_recent(self, limit)
    }

    fn nearest(
        &self,
        query: &EmbeddingVector,
        limit: usize,
        threshold: f32,
    ) -> Vec<ScoredCandidate<I>> {
        rank(
            query,
            self.iter().map(|c| (&c.id, c.embedding.as_ref())),
            limit,
            threshold,
        )
    }
}

/// HNSW point wrapper
#[derive(Clone)]
struct IndexPoint(EmbeddingVector);

impl Point for IndexPoint {
    fn distance(&self, other: &Self) -> f32 {
        // Cosine distance = 1 - similarity (HNSW finds minimum)
        1.0 - cosine(self.0.as_slice(), other.0.as_slice())
    }
}

/// Approximate nearest-neighbour index over a pool snapshot
///
/// Only candidates whose vector has the index dimension are inserted.
/// Results are approximate, can hold at most `ef_search` entries per
/// query, and equal scores follow graph traversal order rather than
/// snapshot order.
pub struct HnswIndex<I> {
    hnsw: Option<HnswMap<IndexPoint, usize>>,
    ids: Vec<I>,
    recency: Vec<(DateTime<Utc>, usize)>,
    all_ids: Vec<I>,
    dimension: usize,
}

impl<I: Clone> HnswIndex<I> {
    /// Build an index from a pool
    pub fn build(pool: &CandidatePool<I>, dimension: usize) -> Self {
        Self::build_with(pool, dimension, 100, 100)
    }

    /// Build with explicit HNSW construction and search breadth
    pub fn build_with(
        pool: &CandidatePool<I>,
        dimension: usize,
        ef_construction: usize,
        ef_search: usize,
    ) -> Self {
        let mut points = Vec::new();
        let mut ids = Vec::new();
        for candidate in pool.iter() {
            if let Some(vector) = candidate.scorable_embedding(dimension) {
                points.push(IndexPoint(vector.clone()));
                ids.push(candidate.id.clone());
            }
        }

        let all_ids: Vec<I> = pool.iter().map(|c| c.id.clone()).collect();
        let recency = pool
            .iter()
            .enumerate()
            .map(|(pos, c)| (c.created_at, pos))
            .collect();

        let hnsw = if points.is_empty() {
            None
        } else {
            let values: Vec<usize> = (0..points.len()).collect();
            Some(
                Builder::default()
                    .ef_construction(ef_construction)
                    .ef_search(ef_search)
                    .build(points, values),
            )
        };

        log::info!(
            "Built HNSW index over {} of {} candidates ({}d)",
            ids.len(),
            all_ids.len(),
            dimension
        );

        Self {
            hnsw,
            ids,
            recency,
            all_ids,
            dimension,
        }
    }

    /// Dimension of indexed vectors
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl<I: Clone> CandidateIndex<I> for HnswIndex<I> {
    fn len(&self) -> usize {
        self.all_ids.len()
    }

    fn embedded_len(&self) -> usize {
        self.ids.len()
    }

    fn most_recent(&self, limit: usize) -> Vec<I> {
        let mut recency = self.recency.clone();
        recency.sort_by(|a, b| b.0.cmp(&a.0));
        recency
            .into_iter()
            .take(limit)
            .map(|(_, pos)| self.all_ids[pos].clone())
            .collect()
    }

    fn nearest(
        &self,
        query: &EmbeddingVector,
        limit: usize,
        threshold: f32,
    ) -> Vec<ScoredCandidate<I>> {
        let hnsw = match &self.hnsw {
            Some(hnsw) => hnsw,
            None => return Vec::new(),
        };
        if query.dimension() != self.dimension {
            log::debug!(
                "Query dimension {} does not match index dimension {}",
                query.dimension(),
                self.dimension
            );
            return Vec::new();
        }

        let query_point = IndexPoint(query.clone());
        let mut search = Search::default();
        let mut results = Vec::new();

        for item in hnsw.search(&query_point, &mut search) {
            if results.len() >= limit {
                break;
            }
            let score = cosine(query.as_slice(), item.point.0.as_slice());
            if score >= threshold {
                results.push(ScoredCandidate {
                    id: self.ids[*item.value].clone(),
                    score,
                });
            }
        }

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results
    }
}
