use serde::{Deserialize, Serialize};

use super::error::SkipReason;
use crate::config::{DEFAULT_MODEL, MAX_PROMPT_CHARS};
use crate::pipeline::structuring::ExtractedRecord;

// ═══════════════════════════════════════════
// Input
// ═══════════════════════════════════════════

/// One uploaded PDF. Lives for a single processing pass.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Set when the file could not be read at all; the batch skips it as a
    /// load failure in its place.
    pub read_error: Option<String>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            read_error: None,
        }
    }

    /// A document whose bytes could not be obtained.
    pub fn unreadable(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            bytes: Vec::new(),
            read_error: Some(reason.into()),
        }
    }
}

// ═══════════════════════════════════════════
// Output
// ═══════════════════════════════════════════

/// A document excluded from the report, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDocument {
    pub filename: String,
    pub reason: SkipReason,
}

/// Outcome of a full batch run, records in upload order.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub records: Vec<ExtractedRecord>,
    pub skipped: Vec<SkippedDocument>,
    pub documents_total: u32,
    pub duration_ms: u64,
}

impl BatchResult {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
            documents_total: 0,
            duration_ms: 0,
        }
    }

    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }
}

// ═══════════════════════════════════════════
// Batch Status Events
// ═══════════════════════════════════════════

/// Event emitted during batch processing for the progress indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BatchStatusEvent {
    Started {
        document_count: u32,
    },
    /// About to process document `index` (0-based).
    Processing {
        index: u32,
        total: u32,
        filename: String,
    },
    /// A document finished, successfully or not.
    Progress {
        completed: u32,
        total: u32,
        filename: String,
        succeeded: bool,
    },
    Completed {
        records: u32,
        skipped: u32,
        duration_ms: u64,
    },
}

impl BatchStatusEvent {
    /// Fraction of documents done, for a progress bar.
    pub fn fraction(&self) -> f32 {
        match self {
            BatchStatusEvent::Started { .. } => 0.0,
            BatchStatusEvent::Processing { index, total, .. } => ratio(*index, *total),
            BatchStatusEvent::Progress {
                completed, total, ..
            } => ratio(*completed, *total),
            BatchStatusEvent::Completed { .. } => 1.0,
        }
    }
}

fn ratio(done: u32, total: u32) -> f32 {
    if total == 0 {
        1.0
    } else {
        done as f32 / total as f32
    }
}

// ═══════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Hosted model name (e.g., "gemini-1.5-flash-latest").
    pub model_name: String,
    /// Document text beyond this many characters is not sent to the model.
    pub max_prompt_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            max_prompt_chars: MAX_PROMPT_CHARS,
        }
    }
}
