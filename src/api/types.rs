//! Shared types for the analyzer web layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::pipeline::structuring::{GeminiClient, LlmClient, StructuringError};

/// Builds a model client for the credential submitted with a request.
pub type LlmFactory = Arc<
    dyn Fn(&str) -> Result<Box<dyn LlmClient + Send + Sync>, StructuringError> + Send + Sync,
>;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the analyzer router
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes. Holds no per-request data: each analyze
/// call brings its own credential and documents.
#[derive(Clone)]
pub struct ApiContext {
    pub settings: Arc<Settings>,
    pub reports: Arc<Mutex<ReportStore>>,
    llm_factory: LlmFactory,
}

impl ApiContext {
    /// Context whose clients talk to the configured Gemini endpoint.
    pub fn new(settings: Settings) -> Self {
        let base_url = settings.api_base_url.clone();
        let timeout_secs = settings.request_timeout_secs;
        let factory: LlmFactory = Arc::new(move |api_key: &str| {
            let client = GeminiClient::new(&base_url, api_key, timeout_secs)?;
            Ok(Box::new(client) as Box<dyn LlmClient + Send + Sync>)
        });
        Self::with_llm_factory(settings, factory)
    }

    pub fn with_llm_factory(settings: Settings, llm_factory: LlmFactory) -> Self {
        Self {
            settings: Arc::new(settings),
            reports: Arc::new(Mutex::new(ReportStore::new())),
            llm_factory,
        }
    }

    /// Build a client for `api_key`. Must run off the async executor: the
    /// Gemini client is blocking.
    pub fn make_client(
        &self,
        api_key: &str,
    ) -> Result<Box<dyn LlmClient + Send + Sync>, StructuringError> {
        (self.llm_factory)(api_key)
    }
}

// ═══════════════════════════════════════════════════════════
// Report store: finished streamed batches awaiting download
// ═══════════════════════════════════════════════════════════

/// How long a streamed batch's spreadsheet stays downloadable.
const REPORT_TTL: Duration = Duration::from_secs(600);

struct PendingReport {
    xlsx: Vec<u8>,
    expires_at: Instant,
}

/// One-time download slots for reports built by `POST /api/analyze/stream`.
pub struct ReportStore {
    reports: HashMap<String, PendingReport>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self {
            reports: HashMap::new(),
        }
    }

    /// Keep `xlsx` for [`REPORT_TTL`] and return its download id.
    pub fn insert(&mut self, xlsx: Vec<u8>) -> String {
        self.cleanup();
        let id = uuid::Uuid::new_v4().to_string();
        self.reports.insert(
            id.clone(),
            PendingReport {
                xlsx,
                expires_at: Instant::now() + REPORT_TTL,
            },
        );
        id
    }

    /// Take a report (one-time). `None` when unknown, taken or expired.
    pub fn take(&mut self, id: &str) -> Option<Vec<u8>> {
        let entry = self.reports.remove(id)?;
        if Instant::now() > entry.expires_at {
            return None;
        }
        Some(entry.xlsx)
    }

    fn cleanup(&mut self) {
        let now = Instant::now();
        self.reports.retain(|_, r| now < r.expires_at);
    }
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}
