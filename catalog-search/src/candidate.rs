//! Candidate types
//!
//! Catalog snapshot entries as seen by the ranker, and the pool built
//! from them for one search call.

use chrono::{DateTime, Utc};

use crate::vector::EmbeddingVector;

/// One catalog entry considered for ranking
#[derive(Debug, Clone)]
pub struct Candidate<I> {
    /// Opaque entity identifier, handed back to the caller
    pub id: I,
    /// Creation time, used for the recency listing
    pub created_at: DateTime<Utc>,
    /// Inactive entries never enter a pool
    pub active: bool,
    /// Stored embedding, if one was ever computed
    pub embedding: Option<EmbeddingVector>,
}

impl<I> Candidate<I> {
    /// Create an active candidate without an embedding
    pub fn new(id: I, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            active: true,
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: EmbeddingVector) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_optional_embedding(mut self, embedding: Option<EmbeddingVector>) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// The stored vector, if present and of the given dimension
    pub fn scorable_embedding(&self, dimension: usize) -> Option<&EmbeddingVector> {
        self.embedding
            .as_ref()
            .filter(|vector| vector.dimension() == dimension)
    }
}

/// A candidate id paired with its similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<I> {
    pub id: I,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

/// Active candidates for one search call, in snapshot order
///
/// Snapshot order matters: candidates with equal scores are returned in
/// the order they appear here.
#[derive(Debug, Clone)]
pub struct CandidatePool<I> {
    candidates: Vec<Candidate<I>>,
}

impl<I> Default for CandidatePool<I> {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }
}

impl<I> CandidatePool<I> {
    /// Build a pool from a catalog snapshot, dropping inactive entries
    pub fn from_snapshot(snapshot: impl IntoIterator<Item = Candidate<I>>) -> Self {
        let candidates = snapshot.into_iter().filter(|c| c.active).collect();
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate<I>> {
        self.candidates.iter()
    }

    /// Number of candidates with a stored vector of any dimension
    pub fn embedded_count(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.embedding.is_some())
            .count()
    }
}

impl<I: Clone> CandidatePool<I> {
    /// Ids of the `limit` most recently created candidates, newest first
    ///
    /// Candidates created at the same instant keep snapshot order.
    pub fn most_recent(&self, limit: usize) -> Vec<I> {
        let mut by_recency: Vec<&Candidate<I>> = self.candidates.iter().collect();
        by_recency.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        by_recency
            .into_iter()
            .take(limit)
            .map(|c| c.id.clone())
            .collect()
    }
}

impl<I> FromIterator<Candidate<I>> for CandidatePool<I> {
    fn from_iter<T: IntoIterator<Item = Candidate<I>>>(iter: T) -> Self {
        Self::from_snapshot(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn test_pool_drops_inactive() {
        let pool = CandidatePool::from_snapshot(vec![
            Candidate::new(1, at(0)),
            Candidate::new(2, at(1)).with_active(false),
            Candidate::new(3, at(2)),
        ]);
        let ids: Vec<i32> = pool.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_most_recent_orders_newest_first() {
        let pool: CandidatePool<&str> = vec![
            Candidate::new("old", at(0)),
            Candidate::new("newest", at(30)),
            Candidate::new("middle", at(10)),
        ]
        .into_iter()
        .collect();

        assert_eq!(pool.most_recent(2), vec!["newest", "middle"]);
        assert_eq!(pool.most_recent(10).len(), 3);
        assert!(pool.most_recent(0).is_empty());
    }

    #[test]
    fn test_most_recent_ties_keep_snapshot_order() {
        let pool = CandidatePool::from_snapshot(vec![
            Candidate::new('a', at(5)),
            Candidate::new('b', at(5)),
            Candidate::new('c', at(5)),
        ]);
        assert_eq!(pool.most_recent(3), vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_scorable_embedding_checks_dimension() {
        let vector = EmbeddingVector::new(vec![1.0, 0.0, 0.0]).unwrap();
        let candidate = Candidate::new(7, at(0)).with_embedding(vector);
        assert!(candidate.scorable_embedding(3).is_some());
        assert!(candidate.scorable_embedding(384).is_none());
        assert!(Candidate::new(8, at(0)).scorable_embedding(3).is_none());
    }
}
