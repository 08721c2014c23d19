//! Similarity ranking
//!
//! Exact cosine scoring over a candidate set with a score threshold.

use crate::candidate::ScoredCandidate;
use crate::error::{Result, SearchError};
use crate::vector::EmbeddingVector;

/// Cosine similarity between two optional vectors
///
/// - either vector absent: `0.0`
/// - either vector all zeros: `0.0` (a zero vector is similar to nothing,
///   itself included)
/// - differing dimensions: [`SearchError::DimensionMismatch`]
///
/// The result is clamped into [-1, 1].
pub fn cosine_similarity(a: Option<&EmbeddingVector>, b: Option<&EmbeddingVector>) -> Result<f32> {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return Ok(0.0),
    };

    if a.dimension() != b.dimension() {
        return Err(SearchError::DimensionMismatch {
            expected: a.dimension(),
            actual: b.dimension(),
        });
    }

    Ok(cosine(a.as_slice(), b.as_slice()))
}

/// Cosine similarity of two equal-length slices
pub(crate) fn cosine(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

/// Rank candidates against `query`
///
/// Candidates without a vector, or with a vector whose dimension differs
/// from the query's, are skipped. Scores below `threshold` are dropped.
/// The rest are sorted by score descending with a stable sort, so equal
/// scores keep input order, then truncated to `limit`.
pub fn rank<'a, I, It>(
    query: &EmbeddingVector,
    candidates: It,
    limit: usize,
    threshold: f32,
) -> Vec<ScoredCandidate<I>>
where
    I: Clone + 'a,
    It: IntoIterator<Item = (&'a I, Option<&'a EmbeddingVector>)>,
{
    let dimension = query.dimension();
    let mut excluded = 0usize;

    let mut scored: Vec<ScoredCandidate<I>> = candidates
        .into_iter()
        .filter_map(|(id, vector)| {
            let vector = match vector {
                Some(v) if v.dimension() == dimension => v,
                Some(_) => {
                    excluded += 1;
                    return None;
                }
                None => return None,
            };
            let score = cosine(query.as_slice(), vector.as_slice());
            (score >= threshold).then(|| ScoredCandidate {
                id: id.clone(),
                score,
            })
        })
        .collect();

    if excluded > 0 {
        log::debug!(
            "Skipped {} candidates with vectors not of dimension {}",
            excluded,
            dimension
        );
    }

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}
