//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::batch::SkippedDocument;
use crate::pipeline::structuring::StructuringError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedDocument>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No API key provided")]
    MissingApiKey,
    #[error("No PDF files uploaded")]
    NoFiles,
    #[error("No document could be processed")]
    NoRecords { skipped: Vec<SkippedDocument> },
    #[error("Report not found or already downloaded")]
    ReportNotFound,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status and JSON detail, shared by plain responses and stream events.
    pub fn into_parts(self) -> (StatusCode, ErrorDetail) {
        let (status, code, message, skipped) = match self {
            ApiError::MissingApiKey => (
                StatusCode::BAD_REQUEST,
                "MISSING_API_KEY",
                "Informe sua chave de API do Google AI Studio".to_string(),
                Vec::new(),
            ),
            ApiError::NoFiles => (
                StatusCode::BAD_REQUEST,
                "NO_FILES",
                "Envie pelo menos um arquivo PDF".to_string(),
                Vec::new(),
            ),
            ApiError::NoRecords { skipped } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_RECORDS",
                "Nenhum artigo pôde ser processado com sucesso".to_string(),
                skipped,
            ),
            ApiError::ReportNotFound => (
                StatusCode::NOT_FOUND,
                "REPORT_NOT_FOUND",
                "Relatório não encontrado ou já baixado".to_string(),
                Vec::new(),
            ),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail, Vec::new())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                    Vec::new(),
                )
            }
        };

        (
            status,
            ErrorDetail {
                code,
                message,
                skipped,
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.into_parts();
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<StructuringError> for ApiError {
    fn from(err: StructuringError) -> Self {
        match err {
            StructuringError::MissingApiKey => ApiError::MissingApiKey,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<crate::pipeline::report::ExportError> for ApiError {
    fn from(err: crate::pipeline::report::ExportError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
