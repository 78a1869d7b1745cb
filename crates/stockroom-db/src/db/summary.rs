use std::collections::HashMap;

use stockroom_core::models::IngestSummary;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Holds the most recent bulk upload summary for each owner.
///
/// One slot per owner; `put` overwrites (last write wins across concurrent jobs).
#[async_trait::async_trait]
pub trait SummaryStore: Send + Sync {
    async fn put(&self, owner_id: Uuid, summary: IngestSummary);

    async fn get(&self, owner_id: Uuid) -> Option<IngestSummary>;
}

#[derive(Default)]
pub struct InMemorySummaryStore {
    slots: RwLock<HashMap<Uuid, IngestSummary>>,
}

impl InMemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SummaryStore for InMemorySummaryStore {
    async fn put(&self, owner_id: Uuid, summary: IngestSummary) {
        self.slots.write().await.insert(owner_id, summary);
    }

    async fn get(&self, owner_id: Uuid) -> Option<IngestSummary> {
        self.slots.read().await.get(&owner_id).cloned()
    }
}
