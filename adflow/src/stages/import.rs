//! Catalog import.

use std::time::Duration;

use crate::collaborators::CatalogSource;
use crate::core::Product;
use crate::errors::{FlowError, RemoteError};
use crate::runner::StageTally;
use crate::store::{JsonStore, MergePolicy};

/// Result of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportOutcome {
    /// Accepted and rejected records.
    pub tally: StageTally,
    /// Catalog size after the import.
    pub catalog_size: usize,
}

/// Pulls records from a feed into the catalog store.
///
/// Re-imported products replace their stored version so price and
/// description changes are picked up.
pub struct ImportStage<'a> {
    source: Option<&'a dyn CatalogSource>,
    store: &'a JsonStore<Product>,
    timeout: Duration,
}

impl<'a> ImportStage<'a> {
    /// Creates the stage. Without a source the import is a no-op.
    #[must_use]
    pub fn new(source: Option<&'a dyn CatalogSource>, store: &'a JsonStore<Product>, timeout: Duration) -> Self {
        Self { source, store, timeout }
    }

    /// Runs the import.
    ///
    /// Rows that cannot be read and records without a name are counted as
    /// failed items. A feed that cannot be fetched, or a store that cannot
    /// be written, is an error.
    pub async fn run(&self) -> Result<ImportOutcome, FlowError> {
        let Some(source) = self.source else {
            tracing::info!("No product feed configured, keeping the current catalog");
            return Ok(ImportOutcome {
                tally: StageTally::default(),
                catalog_size: self.store.len()?,
            });
        };

        tracing::info!(feed = %source.describe(), "Importing products");
        let records = tokio::time::timeout(self.timeout, source.fetch())
            .await
            .map_err(|_| RemoteError::Timeout(self.timeout))??;

        let mut tally = StageTally::default();
        let mut products = Vec::with_capacity(records.len());
        for (row, record) in records.into_iter().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(reason) => {
                    tally.failed += 1;
                    tracing::warn!(row = row + 1, kind = "malformed_response", reason = %reason, "Unreadable product record, skipping");
                    continue;
                }
            };
            match Product::from_record(record) {
                Some(product) => {
                    tally.generated += 1;
                    products.push(product);
                }
                None => {
                    tally.failed += 1;
                    tracing::warn!(row = row + 1, kind = "malformed_response", "Product record has no name, skipping");
                }
            }
        }

        let report = self.store.upsert_all(products, MergePolicy::Replace)?;
        tracing::info!(
            inserted = report.inserted,
            replaced = report.replaced,
            rejected = tally.failed,
            catalog = report.total,
            "Import finished"
        );
        Ok(ImportOutcome {
            tally,
            catalog_size: report.total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProductRecord;
    use crate::testing::ScriptedCatalog;
    use tempfile::TempDir;

    fn record(name: &str, price: &str) -> ProductRecord {
        ProductRecord {
            name: name.to_string(),
            sku: "S1".to_string(),
            price: price.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_import_replaces_existing_products() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("products.json"));

        let first = ScriptedCatalog::new(Ok(vec![record("Lamp", "$20"), record("", "$1")]));
        let outcome = ImportStage::new(Some(&first), &store, Duration::from_secs(5)).run().await.unwrap();
        assert_eq!(outcome.tally.generated, 1);
        assert_eq!(outcome.tally.failed, 1);
        assert_eq!(outcome.catalog_size, 1);

        let second = ScriptedCatalog::new(Ok(vec![record("lamp ", "$25")]));
        let outcome = ImportStage::new(Some(&second), &store, Duration::from_secs(5)).run().await.unwrap();
        assert_eq!(outcome.catalog_size, 1);
        assert_eq!(store.load_all().unwrap()[0].price, "$25");
    }

    #[tokio::test]
    async fn test_unreadable_rows_do_not_block_the_rest() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("products.json"));
        let source = ScriptedCatalog::new(Ok(vec![record("Lamp", "19.99")]))
            .with_unreadable_row("invalid type: sequence, expected a string");

        let outcome = ImportStage::new(Some(&source), &store, Duration::from_secs(5)).run().await.unwrap();
        assert_eq!(outcome.tally, StageTally { generated: 1, skipped: 0, failed: 1 });
        assert_eq!(outcome.catalog_size, 1);
        assert_eq!(store.load_all().unwrap()[0].price, "19.99");
    }

    #[tokio::test]
    async fn test_import_without_source_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("products.json"));
        let outcome = ImportStage::new(None, &store, Duration::from_secs(5)).run().await.unwrap();
        assert_eq!(outcome, ImportOutcome::default());
        assert!(!store.exists());
    }

    #[tokio::test]
    async fn test_import_fetch_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("products.json"));
        let source = ScriptedCatalog::new(Err(RemoteError::Transport("refused".to_string())));
        let err = ImportStage::new(Some(&source), &store, Duration::from_secs(5)).run().await.unwrap_err();
        assert!(matches!(err, FlowError::Remote(RemoteError::Transport(_))));
    }
}
