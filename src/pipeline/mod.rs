pub mod extraction; // Document Loader: PDF bytes → page text
pub mod structuring; // Extraction Client + Record Parser
pub mod batch; // Batch Compiler: per-document pipeline + report table
pub mod report; // Report Exporter: table → XLSX
