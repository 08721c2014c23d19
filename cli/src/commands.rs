//! Command implementations
//!
//! Each command loads a catalog snapshot, runs one engine operation, and
//! returns plain rows the binary prints.

use catalog_search::{
    backfill_embeddings, BackfillReport, EmbeddingProvider, SearchOutcome, SearchService,
};
use std::path::Path;

use crate::catalog::{Catalog, CatalogRecord};
use crate::error::CliResult;

/// Queries exercised by `verify`; the last one should match nothing
pub const VERIFY_QUERIES: &[&str] = &[
    "gaming accessory",
    "warm clothes",
    "computer book",
    "cold drink storage",
    "tablet",
    "nonsense gibberish 123",
];

/// Result limit used by `verify`
pub const VERIFY_LIMIT: usize = 5;

/// Ranked candidates considered before category filtering and the page limit
pub const CANDIDATE_LIMIT: usize = 100;

/// One printed result line
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub id: u64,
    pub title: String,
    pub price: f64,
    /// Similarity, present for ranked results only
    pub score: Option<f32>,
}

impl ResultRow {
    fn from_record(record: &CatalogRecord, score: Option<f32>) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            price: record.price,
            score,
        }
    }
}

/// Options for the search command
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub query: Option<String>,
    pub limit: usize,
    pub threshold: f32,
    pub category: Option<String>,
}

/// Fill in missing embeddings and write the catalog back if anything changed
pub fn backfill(
    catalog_path: &Path,
    provider: &EmbeddingProvider,
    force: bool,
) -> CliResult<BackfillReport> {
    let mut catalog = Catalog::load(catalog_path)?;
    tracing::info!("Found {} items to process", catalog.items.len());

    let report = backfill_embeddings(provider, &mut catalog.items, force)?;

    if report.has_changes() {
        catalog.save(catalog_path)?;
        tracing::info!("Successfully generated embeddings for {} items", report.generated);
    } else {
        tracing::info!("No items needed updates");
    }

    Ok(report)
}

/// Run one search and resolve the outcome against the catalog
pub async fn search(
    service: &SearchService,
    catalog: &Catalog,
    options: &SearchOptions,
) -> CliResult<Vec<ResultRow>> {
    let pool = catalog.to_pool();
    let candidates = options.limit.max(CANDIDATE_LIMIT);
    let outcome = service
        .semantic_search(options.query.as_deref(), &pool, candidates, options.threshold)
        .await?;

    Ok(listing(catalog, &outcome, options.category.as_deref(), options.limit))
}

/// Apply a search outcome and a category filter to the catalog
///
/// A ranked outcome restricts the listing to its ids in relevance order,
/// so a query with no matches lists nothing even when other filters are
/// set. A recency outcome lists the newest active items. Either way at
/// most `limit` rows are returned, counted after the category filter.
pub fn listing(
    catalog: &Catalog,
    outcome: &SearchOutcome<u64>,
    category: Option<&str>,
    limit: usize,
) -> Vec<ResultRow> {
    let filter = outcome.filter();
    let in_category =
        |record: &&CatalogRecord| category.map_or(true, |c| record.category.as_deref() == Some(c));

    let mut records: Vec<&CatalogRecord> = catalog
        .active()
        .filter(in_category)
        .filter(|record| filter.admits(&record.id))
        .collect();

    match outcome {
        SearchOutcome::Ranked(hits) => {
            records.sort_by_key(|record| filter.rank_of(&record.id));
            records
                .into_iter()
                .take(limit)
                .map(|record| {
                    let score = hits.iter().find(|h| h.id == record.id).map(|h| h.score);
                    ResultRow::from_record(record, score)
                })
                .collect()
        }
        SearchOutcome::Recent(_) => {
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            records
                .into_iter()
                .take(limit)
                .map(|record| ResultRow::from_record(record, None))
                .collect()
        }
    }
}

/// Run the canned verification queries
pub async fn verify(
    service: &SearchService,
    catalog: &Catalog,
    threshold: f32,
) -> CliResult<Vec<(String, Vec<ResultRow>)>> {
    let mut results = Vec::with_capacity(VERIFY_QUERIES.len());
    for query in VERIFY_QUERIES {
        let options = SearchOptions {
            query: Some(query.to_string()),
            limit: VERIFY_LIMIT,
            threshold,
            category: None,
        };
        let rows = search(service, catalog, &options).await?;
        results.push((query.to_string(), rows));
    }
    Ok(results)
}

/// Render rows as numbered lines
pub fn render_rows(rows: &[ResultRow]) -> String {
    if rows.is_empty() {
        return "  No results found.\n".to_string();
    }
    rows.iter()
        .enumerate()
        .map(|(i, row)| match row.score {
            Some(score) => format!(
                "  {}. {} (${:.2}) [score {:.3}]\n",
                i + 1,
                row.title,
                row.price,
                score
            ),
            None => format!("  {}. {} (${:.2})\n", i + 1, row.title, row.price),
        })
        .collect()
}
