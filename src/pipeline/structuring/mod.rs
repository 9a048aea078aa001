pub mod types;
pub mod prompt;
pub mod parser;
pub mod gemini;

pub use types::*;
pub use prompt::*;
pub use parser::*;
pub use gemini::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("Model API is not reachable at {0}")]
    ApiConnection(String),

    #[error("Model API returned error (status {status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Model returned no completion: {0}")]
    EmptyCompletion(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("No API key provided")]
    MissingApiKey,
}

impl StructuringError {
    /// True when the completion arrived but could not be turned into a record.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            StructuringError::MalformedResponse(_) | StructuringError::JsonParsing(_)
        )
    }
}
