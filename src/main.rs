use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use corpus_compass_lib::config::{
    self, Settings, API_KEY_ENV, DEFAULT_API_BASE_URL, DEFAULT_BIND_ADDR, DEFAULT_MODEL,
    DEFAULT_REQUEST_TIMEOUT_SECS, MAX_UPLOAD_MB, REPORT_FILENAME,
};
use corpus_compass_lib::pipeline::batch::{
    run_batch, BatchResult, BatchRunner, BatchStatusEvent, ExtractionConfig, ReportTable,
    UploadedDocument,
};
use corpus_compass_lib::pipeline::report::{export_xlsx, write_report};
use corpus_compass_lib::pipeline::structuring::{GeminiClient, LlmClient};

#[derive(Parser)]
#[command(name = "corpus-compass")]
#[command(version, about = "Fichamento automático de artigos científicos em PDF", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the upload page and analyze endpoint
    Serve {
        /// Address to listen on
        #[arg(long, default_value = DEFAULT_BIND_ADDR)]
        bind: SocketAddr,

        /// Maximum upload size per request, in megabytes
        #[arg(
            long,
            default_value_t = 200,
            value_parser = clap::value_parser!(u64).range(1..=MAX_UPLOAD_MB)
        )]
        max_upload_mb: u64,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Analyze local PDFs and write the spreadsheet
    Analyze {
        /// PDF files, processed in the order given
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output spreadsheet
        #[arg(long, short, default_value = REPORT_FILENAME)]
        out: PathBuf,

        #[command(flatten)]
        key: KeyArgs,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// List models visible to the API key
    Models {
        #[command(flatten)]
        key: KeyArgs,

        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Args)]
struct KeyArgs {
    /// Google AI Studio API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: String,
}

#[derive(Args)]
struct ModelArgs {
    /// Model used for extraction
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Generative Language API base URL
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    api_base: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    timeout: u64,
}

impl ModelArgs {
    fn settings(&self) -> Settings {
        Settings {
            model: self.model.clone(),
            api_base_url: self.api_base.clone(),
            request_timeout_secs: self.timeout,
            ..Default::default()
        }
    }

    fn client(&self, api_key: &str) -> Result<GeminiClient, String> {
        GeminiClient::new(&self.api_base, api_key, self.timeout).map_err(|e| e.to_string())
    }
}

fn main() -> ExitCode {
    corpus_compass_lib::init_tracing();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Serve {
            bind,
            max_upload_mb,
            model,
        } => config::upload_limit_bytes(max_upload_mb)
            .ok_or_else(|| format!("--max-upload-mb {max_upload_mb} is too large"))
            .and_then(|max_upload_bytes| {
                run_serve(Settings {
                    bind_addr: bind,
                    max_upload_bytes,
                    ..model.settings()
                })
            }),
        Commands::Analyze {
            files,
            out,
            key,
            model,
        } => run_analyze(&files, &out, &key.api_key, &model),
        Commands::Models { key, model } => run_models(&key.api_key, &model),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("Erro: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_serve(settings: Settings) -> Result<ExitCode, String> {
    tracing::info!(
        app = config::APP_NAME,
        version = config::APP_VERSION,
        model = %settings.model,
        "Starting analyzer server"
    );
    let runtime =
        tokio::runtime::Runtime::new().map_err(|e| format!("Failed to start runtime: {e}"))?;
    runtime.block_on(corpus_compass_lib::api::serve(settings))?;
    Ok(ExitCode::SUCCESS)
}

fn run_analyze(
    files: &[PathBuf],
    out: &Path,
    api_key: &str,
    model: &ModelArgs,
) -> Result<ExitCode, String> {
    let llm = model.client(api_key)?;

    let documents = files.iter().map(|path| read_document(path)).collect();

    let runner = BatchRunner::with_pdf_extract(ExtractionConfig {
        model_name: model.model.clone(),
        ..Default::default()
    });
    let print_progress = |event: BatchStatusEvent| {
        if let BatchStatusEvent::Processing {
            index,
            total,
            filename,
        } = event
        {
            eprintln!("Processando artigo {}/{}: {}", index + 1, total, filename);
        }
    };

    let result = run_batch(&runner, documents, &llm, Some(&print_progress));

    print_summary(&result);

    if !result.has_records() {
        eprintln!("Nenhum artigo pôde ser processado com sucesso.");
        return Ok(ExitCode::FAILURE);
    }

    let table = ReportTable::from_records(&result.records);
    let bytes = export_xlsx(&table).map_err(|e| e.to_string())?;
    write_report(out, &bytes).map_err(|e| format!("{}: {e}", out.display()))?;

    eprintln!(
        "Análise concluída! {} artigo(s) processado(s). Relatório salvo em {}",
        table.row_count(),
        out.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_models(api_key: &str, model: &ModelArgs) -> Result<ExitCode, String> {
    let client = model.client(api_key)?;
    let available = client
        .is_model_available(&model.model)
        .map_err(|e| e.to_string())?;

    if available {
        eprintln!("Modelo configurado disponível: {}", model.model);
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!("Modelo configurado não encontrado: {}", model.model);
    eprintln!("Modelos disponíveis:");
    for name in client.list_models().map_err(|e| e.to_string())? {
        println!("{name}");
    }
    Ok(ExitCode::FAILURE)
}

/// Read one CLI argument; unreadable files stay in the batch as load failures.
fn read_document(path: &Path) -> UploadedDocument {
    let filename = display_name(path);
    match std::fs::read(path) {
        Ok(bytes) => UploadedDocument::new(filename, bytes),
        Err(e) => {
            tracing::error!(path = %path.display(), "Cannot read file: {e}");
            UploadedDocument::unreadable(filename, e.to_string())
        }
    }
}

fn print_summary(result: &BatchResult) {
    if result.skipped.is_empty() {
        return;
    }
    eprintln!("{} documento(s) ignorado(s):", result.skipped.len());
    for skipped in &result.skipped {
        eprintln!("  - {}: {}", skipped.filename, skipped.reason);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_accepts_default_upload_limit() {
        let cli = Cli::try_parse_from(["corpus-compass", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { max_upload_mb, .. } => {
                assert_eq!(config::upload_limit_bytes(max_upload_mb), Some(200 * 1024 * 1024));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn serve_rejects_oversized_upload_limit() {
        let result = Cli::try_parse_from([
            "corpus-compass",
            "serve",
            "--max-upload-mb",
            "17592186044416",
        ]);
        assert!(result.is_err());
        assert!(Cli::try_parse_from(["corpus-compass", "serve", "--max-upload-mb", "0"]).is_err());
    }

    #[test]
    fn unreadable_argument_becomes_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ausente.pdf");

        let doc = read_document(&missing);

        assert_eq!(doc.filename, "ausente.pdf");
        assert!(doc.bytes.is_empty());
        assert!(doc.read_error.is_some());
    }

    #[test]
    fn readable_argument_keeps_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artigo.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let doc = read_document(&path);

        assert_eq!(doc.bytes, b"%PDF-1.4");
        assert!(doc.read_error.is_none());
    }
}
