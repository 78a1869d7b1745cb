use std::collections::HashMap;

use stockroom_core::models::{CatalogItem, CatalogItemDraft, ResolvedAsset};
use stockroom_core::AppError;
use sqlx::{PgPool, Postgres};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persistence seam used by the bulk upload pipeline
#[async_trait::async_trait]
pub trait CatalogWriter: Send + Sync {
    /// Whether `sku` is already persisted for `owner_id`
    async fn sku_exists(&self, owner_id: Uuid, sku: &str) -> Result<bool, AppError>;

    /// Persist one item.
    ///
    /// Returns `AppError::Conflict` when (owner, sku) already exists.
    async fn create_item(
        &self,
        owner_id: Uuid,
        draft: CatalogItemDraft,
        asset: ResolvedAsset,
    ) -> Result<CatalogItem, AppError>;
}

fn duplicate_sku(sku: &str) -> AppError {
    AppError::Conflict(format!("SKU {} already exists", sku))
}

/// Postgres-backed catalog repository
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogWriter for CatalogRepository {
    #[tracing::instrument(skip(self), fields(db.table = "catalog_items", db.operation = "select"))]
    async fn sku_exists(&self, owner_id: Uuid, sku: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM catalog_items WHERE owner_id = $1 AND sku = $2)",
        )
        .bind(owner_id)
        .bind(sku)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(
        skip(self, draft, asset),
        fields(db.table = "catalog_items", db.operation = "insert", sku = %draft.sku)
    )]
    async fn create_item(
        &self,
        owner_id: Uuid,
        draft: CatalogItemDraft,
        asset: ResolvedAsset,
    ) -> Result<CatalogItem, AppError> {
        let sku = draft.sku.clone();
        let item = CatalogItem::from_draft(owner_id, draft, asset);

        let result = sqlx::query_as::<Postgres, CatalogItem>(
            r#"
            INSERT INTO catalog_items (
                id, owner_id, name, price, description, category, brand, quantity, sku,
                compatibility, image_url, image_public_id, image_provider, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, owner_id, name, price, description, category, brand, quantity, sku,
                      compatibility, image_url, image_public_id, image_provider, created_at
            "#,
        )
        .bind(item.id)
        .bind(item.owner_id)
        .bind(&item.name)
        .bind(item.price)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.brand)
        .bind(item.quantity)
        .bind(&item.sku)
        .bind(&item.compatibility)
        .bind(&item.image_url)
        .bind(&item.image_public_id)
        .bind(&item.image_provider)
        .bind(item.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(duplicate_sku(&sku))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory catalog keyed by (owner, sku)
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    items: RwLock<HashMap<(Uuid, String), CatalogItem>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items persisted for `owner_id`, oldest first
    pub async fn items_for(&self, owner_id: Uuid) -> Vec<CatalogItem> {
        let items = self.items.read().await;
        let mut owned: Vec<CatalogItem> = items
            .values()
            .filter(|item| item.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by_key(|item| item.created_at);
        owned
    }
}

#[async_trait::async_trait]
impl CatalogWriter for InMemoryCatalogRepository {
    async fn sku_exists(&self, owner_id: Uuid, sku: &str) -> Result<bool, AppError> {
        let items = self.items.read().await;
        Ok(items.contains_key(&(owner_id, sku.to_string())))
    }

    async fn create_item(
        &self,
        owner_id: Uuid,
        draft: CatalogItemDraft,
        asset: ResolvedAsset,
    ) -> Result<CatalogItem, AppError> {
        let mut items = self.items.write().await;
        let key = (owner_id, draft.sku.clone());
        if items.contains_key(&key) {
            return Err(duplicate_sku(&draft.sku));
        }

        let item = CatalogItem::from_draft(owner_id, draft, asset);
        items.insert(key, item.clone());
        Ok(item)
    }
}
