pub mod bulk_upload;
pub mod health;
