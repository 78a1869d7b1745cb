//! Shared key generation for storage backends.

use uuid::Uuid;

/// Generate the storage key `catalog/{owner_id}/{filename}`.
pub fn generate_storage_key(owner_id: Uuid, filename: &str) -> String {
    format!("catalog/{}/{}", owner_id, filename)
}
