//! Binary layout for vectors persisted next to catalog rows
//!
//! Layout (bincode): `version: u8`, `dimension: u32`, `values: Vec<f32>`.
//! Decoding checks all three against each other and against the
//! dimension the caller expects, so a row written by a different encoder
//! model is rejected instead of being compared across dimensions.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::vector::EmbeddingVector;

/// Current layout version
const FORMAT_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct StoredVector {
    version: u8,
    dimension: u32,
    values: Vec<f32>,
}

/// Serialize a vector for storage
pub fn encode_vector(vector: &EmbeddingVector) -> Result<Vec<u8>> {
    let dimension = u32::try_from(vector.dimension())
        .map_err(|_| SearchError::malformed("dimension does not fit in u32"))?;
    let stored = StoredVector {
        version: FORMAT_VERSION,
        dimension,
        values: vector.to_vec(),
    };
    Ok(bincode::serialize(&stored)?)
}

/// Deserialize a stored vector, validating it against `expected_dimension`
pub fn decode_vector(bytes: &[u8], expected_dimension: usize) -> Result<EmbeddingVector> {
    let stored: StoredVector = bincode::deserialize(bytes)?;

    if stored.version != FORMAT_VERSION {
        return Err(SearchError::malformed(format!(
            "unknown vector format version {}",
            stored.version
        )));
    }

    if stored.dimension as usize != stored.values.len() {
        return Err(SearchError::malformed(format!(
            "header declares {} components, payload has {}",
            stored.dimension,
            stored.values.len()
        )));
    }

    EmbeddingVector::with_dimension(stored.values, expected_dimension)
}

/// Decode an optional stored column; malformed or stale blobs become `None`
///
/// This is the read path used when assembling candidate pools: a vector
/// that fails validation is treated the same as one that was never
/// computed.
pub fn decode_optional(bytes: Option<&[u8]>, expected_dimension: usize) -> Option<EmbeddingVector> {
    let bytes = bytes?;
    match decode_vector(bytes, expected_dimension) {
        Ok(vector) => Some(vector),
        Err(e) => {
            log::warn!("Ignoring stored vector: {}", e);
            None
        }
    }
}
