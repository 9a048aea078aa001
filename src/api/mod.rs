//! Local web surface.
//!
//! Serves the upload page, `POST /api/analyze` (one batch per request,
//! answered with the XLSX report) and its streaming twin
//! `POST /api/analyze/stream`, whose report is fetched from
//! `GET /api/reports/:id`. The router is composable: `analyzer_router()`
//! returns a `Router` that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::analyzer_router;
pub use server::{serve, start_server_on, AnalyzerServer, ServerSession};
pub use types::{ApiContext, LlmFactory, ReportStore};
