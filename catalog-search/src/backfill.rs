//! Embedding backfill
//!
//! Computes stored vectors for catalog records that lack one, and
//! recomputes a record's vector after its text changes.

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::vector::EmbeddingVector;

/// A record that owns a stored embedding of its own text
pub trait Embeddable {
    /// Text the embedding is computed from (title and description)
    fn source_text(&self) -> String;

    fn embedding(&self) -> Option<&EmbeddingVector>;

    fn set_embedding(&mut self, embedding: Option<EmbeddingVector>);

    /// Short label for log lines
    fn label(&self) -> String;
}

/// Summary of a backfill run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Records examined
    pub processed: usize,
    /// Records that received a new vector
    pub generated: usize,
    /// Records left untouched because their vector was current
    pub skipped: usize,
    /// Records with a stored vector of the wrong dimension, regenerated
    pub stale: usize,
    /// Records whose text is empty, left without a vector
    pub empty: usize,
}

impl BackfillReport {
    /// Whether any record was rewritten
    pub fn has_changes(&self) -> bool {
        self.generated > 0 || self.empty > 0
    }
}

/// Fill in missing embeddings
///
/// Records that already hold a vector of the encoder's dimension are
/// skipped unless `force` is set. Vectors of another dimension (written by
/// a previous encoder model) are always regenerated.
pub fn backfill_embeddings<T: Embeddable>(
    provider: &EmbeddingProvider,
    records: &mut [T],
    force: bool,
) -> Result<BackfillReport> {
    let mut report = BackfillReport {
        processed: records.len(),
        ..BackfillReport::default()
    };

    if records.is_empty() {
        return Ok(report);
    }

    let dimension = provider.dimension()?;
    let mut pending: Vec<usize> = Vec::new();

    for (idx, record) in records.iter().enumerate() {
        match record.embedding() {
            Some(vector) if vector.dimension() != dimension => {
                log::info!(
                    "{} has a {}d vector, regenerating at {}d",
                    record.label(),
                    vector.dimension(),
                    dimension
                );
                report.stale += 1;
                pending.push(idx);
            }
            Some(_) if !force => {
                log::debug!("{} already has embedding. Skipping.", record.label());
                report.skipped += 1;
            }
            _ => pending.push(idx),
        }
    }

    if pending.is_empty() {
        log::info!("No records needed updates");
        return Ok(report);
    }

    let texts: Vec<String> = pending.iter().map(|&i| records[i].source_text()).collect();
    let text_refs: Vec<Option<&str>> = texts.iter().map(|t| Some(t.as_str())).collect();
    let embeddings = provider.generate_embeddings(&text_refs)?;

    for (idx, embedding) in pending.into_iter().zip(embeddings) {
        let record = &mut records[idx];
        match embedding {
            Some(vector) => {
                log::debug!("Generated embedding for {}", record.label());
                record.set_embedding(Some(vector));
                report.generated += 1;
            }
            None => {
                log::warn!("{} has no text to embed", record.label());
                record.set_embedding(None);
                report.empty += 1;
            }
        }
    }

    log::info!(
        "Backfill complete: {} generated, {} skipped, {} stale, {} empty",
        report.generated,
        report.skipped,
        report.stale,
        report.empty
    );

    Ok(report)
}

/// Recompute one record's embedding after an edit
///
/// Returns whether the record now holds a vector.
pub fn refresh_embedding<T: Embeddable>(
    provider: &EmbeddingProvider,
    record: &mut T,
) -> Result<bool> {
    let text = record.source_text();
    let embedding = provider.generate_embedding(Some(&text))?;
    let present = embedding.is_some();
    record.set_embedding(embedding);
    Ok(present)
}
