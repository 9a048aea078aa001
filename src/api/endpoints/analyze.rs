//! `POST /api/analyze`: run one batch over the uploaded PDFs and return the
//! spreadsheet.
//!
//! `POST /api/analyze/stream` runs the same batch but answers with a
//! server-sent event stream: one `status` event per [`BatchStatusEvent`],
//! then `finished` (with a report id for `GET /api/reports/:id`) or `failed`.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{header, response, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::Response;
use futures_util::Stream;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::config::{REPORT_FILENAME, XLSX_MIME};
use crate::pipeline::batch::{
    run_batch, BatchRunner, BatchStatusEvent, ExtractionConfig, ReportTable, SkippedDocument,
    UploadedDocument,
};
use crate::pipeline::report::export_xlsx;

pub const PROCESSED_HEADER: &str = "X-Documents-Processed";
pub const SKIPPED_HEADER: &str = "X-Documents-Skipped";

/// Multipart fields of an analyze request.
struct AnalyzeRequest {
    api_key: String,
    documents: Vec<UploadedDocument>,
}

/// A finished report, ready to send.
struct AnalyzeOutcome {
    xlsx: Vec<u8>,
    processed: usize,
    skipped: Vec<SkippedDocument>,
}

/// Payload of a `status` event.
#[derive(Serialize)]
struct StatusUpdate {
    #[serde(flatten)]
    event: BatchStatusEvent,
    fraction: f32,
}

/// Payload of the `finished` event.
#[derive(Serialize)]
struct FinishedReport {
    report_id: String,
    processed: usize,
    skipped: Vec<SkippedDocument>,
}

/// Multipart fields: `api_key` (text) and one or more `files` (PDF parts).
pub async fn analyze(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let request = accept_request(multipart).await?;

    let outcome = tokio::task::spawn_blocking(move || run_analysis(&ctx, request, None))
        .await
        .map_err(|e| ApiError::Internal(format!("analysis task failed: {e}")))??;

    xlsx_attachment()
        .header(PROCESSED_HEADER, outcome.processed.to_string())
        .header(SKIPPED_HEADER, outcome.skipped.len().to_string())
        .body(Body::from(outcome.xlsx))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Same fields as [`analyze`]. Validation errors are plain JSON responses;
/// once the batch starts, everything arrives as events.
pub async fn analyze_stream(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let request = accept_request(multipart).await?;

    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    tokio::task::spawn_blocking(move || stream_analysis(&ctx, request, &tx));

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok(event), rx))
    });
    Ok(Sse::new(stream))
}

async fn accept_request(multipart: Multipart) -> Result<AnalyzeRequest, ApiError> {
    let request = read_request(multipart).await?;

    if request.api_key.is_empty() {
        return Err(ApiError::MissingApiKey);
    }
    if request.documents.is_empty() {
        return Err(ApiError::NoFiles);
    }

    tracing::info!(documents = request.documents.len(), "Analyze request accepted");
    Ok(request)
}

async fn read_request(mut multipart: Multipart) -> Result<AnalyzeRequest, ApiError> {
    let mut api_key = String::new();
    let mut documents = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "api_key" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read api_key: {e}")))?;
                api_key = text.trim().to_string();
            }
            "files" => {
                let filename = field.file_name().unwrap_or("documento.pdf").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    tracing::warn!(filename = %filename, "Failed to read upload bytes: {e}");
                    ApiError::BadRequest(format!("Failed to read file data: {filename}"))
                })?;
                documents.push(UploadedDocument::new(filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    Ok(AnalyzeRequest { api_key, documents })
}

/// Blocking part of the request: client, batch, table, export.
fn run_analysis(
    ctx: &ApiContext,
    request: AnalyzeRequest,
    progress_fn: Option<&dyn Fn(BatchStatusEvent)>,
) -> Result<AnalyzeOutcome, ApiError> {
    let llm = ctx.make_client(&request.api_key)?;
    let runner = BatchRunner::with_pdf_extract(ExtractionConfig {
        model_name: ctx.settings.model.clone(),
        ..Default::default()
    });

    let result = run_batch(&runner, request.documents, llm.as_ref(), progress_fn);
    if !result.has_records() {
        return Err(ApiError::NoRecords {
            skipped: result.skipped,
        });
    }

    let table = ReportTable::from_records(&result.records);
    let xlsx = export_xlsx(&table)?;

    Ok(AnalyzeOutcome {
        xlsx,
        processed: result.records.len(),
        skipped: result.skipped,
    })
}

/// Blocking body of the stream. Send errors mean the page went away; the
/// batch still runs to the end.
fn stream_analysis(ctx: &ApiContext, request: AnalyzeRequest, tx: &mpsc::UnboundedSender<Event>) {
    let send = |name: &str, data: Result<Event, axum::Error>| match data {
        Ok(event) => {
            let _ = tx.send(event.event(name));
        }
        Err(e) => tracing::error!(event = name, "Failed to encode stream event: {e}"),
    };

    let on_status = |event: BatchStatusEvent| {
        let update = StatusUpdate {
            fraction: event.fraction(),
            event,
        };
        send("status", Event::default().json_data(&update));
    };

    let finished = run_analysis(ctx, request, Some(&on_status)).and_then(|outcome| {
        let report_id = ctx
            .reports
            .lock()
            .map_err(|_| ApiError::Internal("report store lock".into()))?
            .insert(outcome.xlsx);
        Ok(FinishedReport {
            report_id,
            processed: outcome.processed,
            skipped: outcome.skipped,
        })
    });

    match finished {
        Ok(report) => send("finished", Event::default().json_data(&report)),
        Err(e) => {
            let (_, detail) = e.into_parts();
            send("failed", Event::default().json_data(&detail));
        }
    }
}

/// Response builder for a spreadsheet download.
pub(crate) fn xlsx_attachment() -> response::Builder {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, XLSX_MIME)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{REPORT_FILENAME}\""),
        )
}
