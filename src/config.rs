use std::net::SocketAddr;

/// Application-level constants
pub const APP_NAME: &str = "Corpus Compass";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hosted model used when none is given on the command line.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Google Generative Language API root.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variable consulted by the CLI for the API credential.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Maximum number of characters of document text sent to the model.
pub const MAX_PROMPT_CHARS: usize = 30_000;

/// Cell value for a recognized field the model did not return.
pub const MISSING_FIELD_PLACEHOLDER: &str = "Não encontrado";

pub const REPORT_FILENAME: &str = "relatorio_fichamentos.xlsx";
pub const REPORT_SHEET_NAME: &str = "Fichamentos";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";

/// Per-request timeout for the model call (5 minutes).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Maximum multipart body accepted by `POST /api/analyze` (200 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Upper bound accepted for `--max-upload-mb`.
pub const MAX_UPLOAD_MB: u64 = 4096;

/// Megabytes to bytes, `None` when the product does not fit in `usize`.
pub fn upload_limit_bytes(megabytes: u64) -> Option<usize> {
    usize::try_from(megabytes).ok()?.checked_mul(1024 * 1024)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "corpus_compass_lib=debug,corpus_compass=debug,info"
    } else {
        "corpus_compass_lib=info,corpus_compass=info,warn"
    }
}

/// Runtime settings shared by the web server and the CLI.
#[derive(Debug, Clone)]
pub struct Settings {
    pub model: String,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8501)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
