use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A validated catalog row that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItemDraft {
    pub name: String,
    pub price: f64,
    pub description: String,
    /// Upper-cased
    pub category: String,
    pub brand: String,
    pub quantity: i64,
    /// Exactly 6 characters, upper-cased
    pub sku: String,
    pub compatibility: Option<String>,
}

/// Image stored on behalf of a catalog row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResolvedAsset {
    pub url: String,
    pub public_id: String,
    pub provider: String,
}

/// Persisted catalog item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CatalogItem {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub quantity: i64,
    pub sku: String,
    pub compatibility: Option<String>,
    pub image_url: String,
    pub image_public_id: String,
    pub image_provider: String,
    pub created_at: DateTime<Utc>,
}

impl CatalogItem {
    /// Build the entity a writer persists for `draft`
    pub fn from_draft(owner_id: Uuid, draft: CatalogItemDraft, asset: ResolvedAsset) -> Self {
        CatalogItem {
            id: Uuid::new_v4(),
            owner_id,
            name: draft.name,
            price: draft.price,
            description: draft.description,
            category: draft.category,
            brand: draft.brand,
            quantity: draft.quantity,
            sku: draft.sku,
            compatibility: draft.compatibility,
            image_url: asset.url,
            image_public_id: asset.public_id,
            image_provider: asset.provider,
            created_at: Utc::now(),
        }
    }
}
