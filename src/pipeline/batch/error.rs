//! Why a document produced no record.
//!
//! All variants share one policy: report, exclude the document, continue.

use serde::Serialize;
use thiserror::Error;

use crate::pipeline::extraction::ExtractionError;
use crate::pipeline::structuring::StructuringError;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Unreadable or corrupt PDF.
    #[error("could not read PDF: {0}")]
    LoadFailed(String),

    /// The PDF has no extractable text (scanned or empty).
    #[error("no useful text could be extracted")]
    EmptyContent,

    /// Transport or authentication error from the model endpoint.
    #[error("model API error: {0}")]
    RemoteCall(String),

    /// The completion is not a JSON object after fence-stripping.
    #[error("model did not return valid JSON: {0}")]
    MalformedOutput(String),
}

impl SkipReason {
    /// Warnings are content problems; errors are failures of the file or the API.
    pub fn is_warning(&self) -> bool {
        matches!(self, SkipReason::EmptyContent | SkipReason::MalformedOutput(_))
    }
}

impl From<ExtractionError> for SkipReason {
    fn from(err: ExtractionError) -> Self {
        SkipReason::LoadFailed(err.to_string())
    }
}

impl From<StructuringError> for SkipReason {
    fn from(err: StructuringError) -> Self {
        if err.is_parse_error() {
            SkipReason::MalformedOutput(err.to_string())
        } else {
            SkipReason::RemoteCall(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_error_is_load_failure() {
        let reason: SkipReason = ExtractionError::PdfParsing("bad header".into()).into();
        assert!(matches!(reason, SkipReason::LoadFailed(_)));
        assert!(!reason.is_warning());
    }

    #[test]
    fn json_error_is_malformed_output() {
        let reason: SkipReason = StructuringError::JsonParsing("eof".into()).into();
        assert!(matches!(reason, SkipReason::MalformedOutput(_)));
        assert!(reason.is_warning());
    }

    #[test]
    fn api_error_is_remote_call() {
        let reason: SkipReason = StructuringError::ApiError {
            status: 401,
            body: "unauthenticated".into(),
        }
        .into();
        assert!(matches!(reason, SkipReason::RemoteCall(_)));
    }

    #[test]
    fn blocked_completion_is_remote_call() {
        let reason: SkipReason = StructuringError::EmptyCompletion("SAFETY".into()).into();
        assert!(matches!(reason, SkipReason::RemoteCall(_)));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(SkipReason::EmptyContent).unwrap();
        assert_eq!(json["kind"], "empty_content");
        let json = serde_json::to_value(SkipReason::LoadFailed("x".into())).unwrap();
        assert_eq!(json["detail"], "x");
    }
}
