//! OpenAPI documentation, served at `/api/openapi.json` and rendered by RapiDoc at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use stockroom_core::models;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "0.1.0",
        description = "Bulk catalog ingestion (v0). Upload a ZIP, CSV or spreadsheet of catalog rows and receive a per-row summary. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::bulk_upload::bulk_upload,
        handlers::bulk_upload::bulk_upload_result,
        handlers::bulk_upload::bulk_upload_template,
        handlers::health::health_check,
        handlers::health::liveness_check,
    ),
    components(
        schemas(
            models::IngestSummary,
            models::RowError,
            models::RowStatus,
            error::ErrorResponse,
            handlers::health::HealthCheckResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "catalog", description = "Bulk catalog upload and results"),
        (name = "health", description = "Liveness and dependency health"),
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
