//! JSON catalog snapshots
//!
//! A catalog file is a JSON array of item records as exported from the
//! marketplace database. Stored embeddings are plain number arrays.

use catalog_search::{item_text, Candidate, CandidatePool, Embeddable, EmbeddingVector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{CliError, CliResult};

/// One catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(
        default,
        deserialize_with = "lenient_embedding",
        skip_serializing_if = "Option::is_none"
    )]
    pub embedding: Option<EmbeddingVector>,
}

fn default_active() -> bool {
    true
}

/// Read a stored vector; unusable vectors are treated as never computed
fn lenient_embedding<'de, D>(deserializer: D) -> Result<Option<EmbeddingVector>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<f32>> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|values| match EmbeddingVector::new(values) {
        Ok(vector) => Some(vector),
        Err(e) => {
            tracing::warn!("Dropping stored embedding: {}", e);
            None
        }
    }))
}

impl Embeddable for CatalogRecord {
    fn source_text(&self) -> String {
        item_text(&self.title, self.description.as_deref())
    }

    fn embedding(&self) -> Option<&EmbeddingVector> {
        self.embedding.as_ref()
    }

    fn set_embedding(&mut self, embedding: Option<EmbeddingVector>) {
        self.embedding = embedding;
    }

    fn label(&self) -> String {
        format!("item {}: {}", self.id, self.title)
    }
}

/// Catalog snapshot loaded from disk
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub items: Vec<CatalogRecord>,
}

impl Catalog {
    /// Load a catalog file, rejecting duplicate ids
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let items: Vec<CatalogRecord> = serde_json::from_str(&content)?;

        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id) {
                return Err(CliError::catalog(format!("duplicate item id {}", item.id)));
            }
        }

        tracing::info!("Loaded {} items from {}", items.len(), path.display());
        Ok(Self { items })
    }

    /// Write the catalog back, replacing the file atomically
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let json = serde_json::to_string_pretty(&self.items)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        tracing::info!("Wrote {} items to {}", self.items.len(), path.display());
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&CatalogRecord> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Active items, in file order
    pub fn active(&self) -> impl Iterator<Item = &CatalogRecord> {
        self.items.iter().filter(|item| item.is_active)
    }

    /// Candidate pool over the active items
    pub fn to_pool(&self) -> CandidatePool<u64> {
        CandidatePool::from_snapshot(self.items.iter().map(|item| {
            Candidate::new(item.id, item.created_at)
                .with_active(item.is_active)
                .with_optional_embedding(item.embedding.clone())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"id": 1, "title": "Mini fridge", "description": "Great for dorms", "price": 60.0,
         "created_at": "2024-09-01T12:00:00Z", "embedding": [0.1, 0.2, 0.3]},
        {"id": 2, "title": "Desk lamp", "price": 12.5,
         "created_at": "2024-09-02T12:00:00Z", "is_active": false},
        {"id": 3, "title": "Hoodie", "price": 20.0,
         "created_at": "2024-09-03T12:00:00Z", "embedding": []}
    ]"#;

    fn write_catalog(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_sample() {
        let file = write_catalog(SAMPLE);
        let catalog = Catalog::load(file.path()).unwrap();

        assert_eq!(catalog.items.len(), 3);
        assert!(catalog.get(1).unwrap().embedding.is_some());
        assert!(catalog.get(1).unwrap().is_active);
        assert!(!catalog.get(2).unwrap().is_active);
        // Empty stored vector is treated as absent
        assert!(catalog.get(3).unwrap().embedding.is_none());
    }

    #[test]
    fn test_pool_excludes_inactive() {
        let file = write_catalog(SAMPLE);
        let catalog = Catalog::load(file.path()).unwrap();
        let pool = catalog.to_pool();
        let ids: Vec<u64> = pool.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(catalog.active().count(), 2);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let file = write_catalog(
            r#"[{"id": 1, "title": "a", "price": 1.0, "created_at": "2024-09-01T12:00:00Z"},
                {"id": 1, "title": "b", "price": 1.0, "created_at": "2024-09-01T12:00:00Z"}]"#,
        );
        let err = Catalog::load(file.path()).unwrap_err();
        assert!(matches!(err, CliError::Catalog(_)));
    }

    #[test]
    fn test_save_then_load_keeps_embeddings() {
        let file = write_catalog(SAMPLE);
        let catalog = Catalog::load(file.path()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("catalog.json");
        catalog.save(&out).unwrap();

        let reloaded = Catalog::load(&out).unwrap();
        assert_eq!(
            reloaded.get(1).unwrap().embedding,
            catalog.get(1).unwrap().embedding
        );
        assert!(!out.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_source_text() {
        let file = write_catalog(SAMPLE);
        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.get(1).unwrap().source_text(), "Mini fridge Great for dorms");
        assert_eq!(catalog.get(2).unwrap().source_text(), "Desk lamp");
    }
}
