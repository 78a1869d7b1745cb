//! API constants

/// Versioned API prefix
pub const API_PREFIX: &str = "/api/v0";

/// Multipart field carrying the uploaded catalog file
pub const UPLOAD_FIELD: &str = "file";
