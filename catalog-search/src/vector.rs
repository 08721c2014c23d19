//! Embedding vector type
//!
//! A validated, immutable, fixed-length vector of `f32` components.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Result, SearchError};

/// Dimension produced by all-MiniLM-L6-v2, the default encoder
pub const DEFAULT_DIMENSION: usize = 384;

/// Dense embedding of a piece of text
///
/// Components are guaranteed finite. The backing storage is shared, so
/// cloning a vector is cheap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct EmbeddingVector {
    values: Arc<[f32]>,
}

impl EmbeddingVector {
    /// Build a vector, rejecting empty input and non-finite components
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(SearchError::malformed("empty vector"));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(SearchError::malformed(format!(
                "non-finite component at index {}",
                pos
            )));
        }
        Ok(Self {
            values: values.into(),
        })
    }

    /// Build a vector and check it against a declared dimension
    pub fn with_dimension(values: Vec<f32>, dimension: usize) -> Result<Self> {
        if values.len() != dimension {
            return Err(SearchError::DimensionMismatch {
                expected: dimension,
                actual: values.len(),
            });
        }
        Self::new(values)
    }

    /// Number of components
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Euclidean norm
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Whether every component is zero
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.values.to_vec()
    }
}

impl TryFrom<Vec<f32>> for EmbeddingVector {
    type Error = SearchError;

    fn try_from(values: Vec<f32>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<EmbeddingVector> for Vec<f32> {
    fn from(vector: EmbeddingVector) -> Self {
        vector.to_vec()
    }
}

impl AsRef<[f32]> for EmbeddingVector {
    fn as_ref(&self) -> &[f32] {
        self.as_slice()
    }
}
