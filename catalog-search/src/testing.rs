//! Deterministic encoders for unit tests

use crate::embedding::TextEncoder;
use crate::error::{Result, SearchError};

/// Word groups; every word in group `n` votes for dimension `n`
const VOCABULARY: &[&[&str]] = &[
    &["gaming", "game", "console", "controller", "headset"],
    &["jacket", "coat", "winter", "warm", "clothes", "hoodie", "sweater"],
    &["book", "textbook", "novel", "reading"],
    &["computer", "laptop", "programming", "keyboard", "mouse"],
    &["fridge", "refrigerator", "cold", "drink", "drinks", "storage"],
    &["tablet", "ipad"],
    &["desk", "lamp", "chair", "furniture"],
    &["bike", "bicycle", "helmet"],
];

/// Bag-of-words encoder over a small fixed vocabulary
///
/// Unknown words are ignored, so text made only of unknown words encodes
/// to the zero vector.
#[derive(Debug, Default)]
pub struct KeywordEncoder;

impl TextEncoder for KeywordEncoder {
    fn model_name(&self) -> &str {
        "keyword-test"
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; VOCABULARY.len()];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
        {
            if let Some(dim) = VOCABULARY.iter().position(|group| group.contains(&token)) {
                vector[dim] += 1.0;
            }
        }
        Ok(vector)
    }
}

/// Encoder whose inference always fails
#[derive(Debug, Default)]
pub struct FailingEncoder;

impl TextEncoder for FailingEncoder {
    fn model_name(&self) -> &str {
        "failing-test"
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    fn encode(&self, _text: &str) -> Result<Vec<f32>> {
        Err(SearchError::encoding("inference backend crashed"))
    }
}

/// Unit vector along `dim` in the keyword encoder's space
pub fn axis(dim: usize) -> Vec<f32> {
    let mut v = vec![0.0; VOCABULARY.len()];
    v[dim] = 1.0;
    v
}

/// Vector in the keyword space whose cosine with `axis(dim)` is `score`
pub fn at_angle(dim: usize, score: f32) -> Vec<f32> {
    let mut v = vec![0.0; VOCABULARY.len()];
    v[dim] = score;
    v[(dim + 1) % VOCABULARY.len()] = (1.0 - score * score).sqrt();
    v
}
