//! `GET /api/reports/:id`: one-time download of a streamed batch's report.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::response::Response;

use crate::api::endpoints::analyze::xlsx_attachment;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;

pub async fn download(
    State(ctx): State<ApiContext>,
    Path(report_id): Path<String>,
) -> Result<Response, ApiError> {
    let xlsx = ctx
        .reports
        .lock()
        .map_err(|_| ApiError::Internal("report store lock".into()))?
        .take(&report_id)
        .ok_or(ApiError::ReportNotFound)?;

    tracing::info!(report_id = %report_id, bytes = xlsx.len(), "Report downloaded");

    xlsx_attachment()
        .body(Body::from(xlsx))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
