//! Per-owner SKU uniqueness across storage and the current batch.

use std::collections::HashSet;

use stockroom_core::AppError;
use stockroom_db::CatalogWriter;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateCheck {
    Unique,
    /// Inserted earlier in this job
    InBatch,
    /// Already persisted for the owner
    Persisted,
}

impl DuplicateCheck {
    pub fn is_duplicate(&self) -> bool {
        !matches!(self, DuplicateCheck::Unique)
    }
}

pub fn duplicate_reason(sku: &str) -> String {
    format!("SKU {} already exists", sku)
}

/// Tracks SKUs inserted by one job.
#[derive(Debug, Default)]
pub struct DuplicateGuard {
    inserted: HashSet<String>,
}

impl DuplicateGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn check(
        &self,
        catalog: &dyn CatalogWriter,
        owner_id: Uuid,
        sku: &str,
    ) -> Result<DuplicateCheck, AppError> {
        if self.inserted.contains(sku) {
            return Ok(DuplicateCheck::InBatch);
        }
        if catalog.sku_exists(owner_id, sku).await? {
            return Ok(DuplicateCheck::Persisted);
        }
        Ok(DuplicateCheck::Unique)
    }

    /// Record a SKU once its row is inserted
    pub fn record(&mut self, sku: &str) {
        self.inserted.insert(sku.to_string());
    }
}
