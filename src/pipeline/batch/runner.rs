//! BatchRunner: orchestrates the per-document pipeline.
//!
//! Runs sequentially (one model call at a time). Every failure is turned into
//! a [`SkipReason`], logged, and the next document is processed.

use std::time::Instant;

use super::error::SkipReason;
use super::types::*;
use crate::pipeline::extraction::{load_document_text, PdfExtractor, PdfTextExtractor};
use crate::pipeline::structuring::{
    build_extraction_prompt_with_limit, completion_preview, parse_record, ExtractedRecord,
    LlmClient,
};

/// Characters of a bad completion kept in the skip detail.
const COMPLETION_PREVIEW_CHARS: usize = 200;

/// Runs Loader → Client → Parser for one document at a time.
pub struct BatchRunner {
    extractor: Box<dyn PdfExtractor + Send + Sync>,
    config: ExtractionConfig,
}

impl BatchRunner {
    pub fn new(extractor: Box<dyn PdfExtractor + Send + Sync>, config: ExtractionConfig) -> Self {
        Self { extractor, config }
    }

    /// Runner backed by the pdf-extract loader.
    pub fn with_pdf_extract(config: ExtractionConfig) -> Self {
        Self::new(Box::new(PdfTextExtractor), config)
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Run the pipeline on a single document.
    pub fn process_document(
        &self,
        document: &UploadedDocument,
        llm: &dyn LlmClient,
    ) -> Result<ExtractedRecord, SkipReason> {
        let _span = tracing::info_span!("process_document", filename = %document.filename).entered();

        if let Some(reason) = &document.read_error {
            return Err(SkipReason::LoadFailed(reason.clone()));
        }

        // Step 1: PDF → text
        let text = load_document_text(self.extractor.as_ref(), &document.bytes)?;
        if text.trim().is_empty() {
            return Err(SkipReason::EmptyContent);
        }

        // Step 2: prompt → completion
        let prompt = build_extraction_prompt_with_limit(&text, self.config.max_prompt_chars);
        let completion = llm.generate(&self.config.model_name, &prompt)?;

        // Step 3: completion → record
        parse_record(&document.filename, &completion).map_err(|e| match SkipReason::from(e) {
            SkipReason::MalformedOutput(detail) => SkipReason::MalformedOutput(format!(
                "{detail}; response: {}",
                completion_preview(&completion, COMPLETION_PREVIEW_CHARS)
            )),
            other => other,
        })
    }
}

/// Run a full batch over `documents`, in order.
///
/// Never fails: documents that cannot be processed end up in
/// [`BatchResult::skipped`]. Each document's bytes are dropped as soon as it
/// has been processed.
pub fn run_batch(
    runner: &BatchRunner,
    documents: Vec<UploadedDocument>,
    llm: &dyn LlmClient,
    progress_fn: Option<&dyn Fn(BatchStatusEvent)>,
) -> BatchResult {
    let start = Instant::now();
    let total = documents.len() as u32;

    let mut result = BatchResult::empty();
    result.documents_total = total;

    if documents.is_empty() {
        return result;
    }

    tracing::info!(documents = total, model = %runner.config().model_name, "Batch started");
    if let Some(progress) = progress_fn {
        progress(BatchStatusEvent::Started {
            document_count: total,
        });
    }

    for (i, document) in documents.into_iter().enumerate() {
        let index = i as u32;
        if let Some(progress) = progress_fn {
            progress(BatchStatusEvent::Processing {
                index,
                total,
                filename: document.filename.clone(),
            });
        }

        let outcome = runner.process_document(&document, llm);
        let succeeded = outcome.is_ok();
        let UploadedDocument { filename, .. } = document;

        match outcome {
            Ok(record) => {
                tracing::info!(filename = %filename, index = index + 1, total, "Document extracted");
                let missing = record.missing_fields();
                if !missing.is_empty() {
                    tracing::info!(
                        filename = %filename,
                        missing = ?missing,
                        "Fields absent from completion, using placeholder"
                    );
                }
                result.records.push(record);
            }
            Err(reason) => {
                if reason.is_warning() {
                    tracing::warn!(filename = %filename, reason = %reason, "Skipping document");
                } else {
                    tracing::error!(filename = %filename, reason = %reason, "Skipping document");
                }
                result.skipped.push(SkippedDocument {
                    filename: filename.clone(),
                    reason,
                });
            }
        }

        if let Some(progress) = progress_fn {
            progress(BatchStatusEvent::Progress {
                completed: index + 1,
                total,
                filename,
                succeeded,
            });
        }
    }

    result.duration_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        records = result.records.len(),
        skipped = result.skipped.len(),
        duration_ms = result.duration_ms,
        "Batch completed"
    );
    if let Some(progress) = progress_fn {
        progress(BatchStatusEvent::Completed {
            records: result.records.len() as u32,
            skipped: result.skipped.len() as u32,
            duration_ms: result.duration_ms,
        });
    }

    result
}
