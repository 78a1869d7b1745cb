//! Bulk catalog upload endpoints

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use stockroom_core::models::IngestSummary;
use stockroom_core::AppError;
use stockroom_ingest::template::CATALOG_TEMPLATE_FILENAME;
use stockroom_ingest::{UploadJob, CATALOG_TEMPLATE_CSV};

use crate::auth::OwnerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::spool_multipart_file;

#[utoipa::path(
    post,
    path = "/api/v0/catalog/bulk-upload",
    tag = "catalog",
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Single field `file`: a .zip, .csv, .xlsx or .xls catalog"),
    responses(
        (status = 200, description = "Upload processed; per-row outcomes in the summary", body = IngestSummary),
        (status = 400, description = "Unsupported, corrupt or empty file", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, owner, multipart), fields(owner_id = %owner.owner_id))]
pub async fn bulk_upload(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    multipart: Multipart,
) -> Result<Json<IngestSummary>, HttpAppError> {
    let upload = spool_multipart_file(
        multipart,
        &state.ingest.upload_dir,
        state.ingest.max_upload_bytes,
    )
    .await?;

    tracing::info!(
        file = %upload.original_name,
        size_bytes = upload.size_bytes,
        "Bulk upload received"
    );

    // The pipeline owns the spooled file from here on
    let job = UploadJob::new(owner.owner_id, upload.file.persist(), upload.original_name);
    let pipeline = state.ingest.pipeline.clone();

    // Detached so a dropped connection does not stop the job between rows
    let summary = tokio::spawn(async move { pipeline.run(job).await })
        .await
        .map_err(|e| AppError::Internal(format!("Bulk upload task failed: {}", e)))??;

    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/v0/catalog/bulk-upload/result",
    tag = "catalog",
    responses(
        (status = 200, description = "Latest bulk upload summary for the caller", body = IngestSummary),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "No bulk upload has completed yet", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn bulk_upload_result(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
) -> Response {
    match state.ingest.summaries.get(owner.owner_id).await {
        Some(summary) => Json(summary).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(
                ErrorResponse::new("No bulk upload results", "NO_RESULTS")
                    .with_suggested_action("Submit a bulk upload first"),
            ),
        )
            .into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v0/catalog/bulk-upload/template",
    tag = "catalog",
    responses(
        (status = 200, description = "Sample catalog CSV", content_type = "text/csv", body = String)
    )
)]
pub async fn bulk_upload_template() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CATALOG_TEMPLATE_FILENAME),
            ),
        ],
        CATALOG_TEMPLATE_CSV,
    )
}
