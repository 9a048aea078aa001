//! Batch Compiler
//!
//! Drives the per-document pipeline over every uploaded document, in upload
//! order, one at a time:
//! ```text
//! Loader (PDF → text) → Client (prompt → completion) → Parser (completion → record)
//! ```
//! Each document ends as `Ok(ExtractedRecord)` or `Err(SkipReason)`. A skip
//! is reported and the batch moves on; nothing aborts the run. The records
//! are then normalized into a fixed-column [`ReportTable`].

pub mod error;
pub mod types;
pub mod runner;
pub mod table;

pub use error::SkipReason;
pub use types::*;
pub use runner::{run_batch, BatchRunner};
pub use table::{ReportColumn, ReportTable};
