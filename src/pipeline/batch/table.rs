use serde::Serialize;

use crate::config::MISSING_FIELD_PLACEHOLDER;
use crate::pipeline::structuring::{ExtractedRecord, RecordField};

/// Report columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportColumn {
    Filename,
    Field(RecordField),
}

impl ReportColumn {
    pub const FILENAME_HEADER: &'static str = "arquivo";

    pub fn all() -> [ReportColumn; 8] {
        [
            ReportColumn::Filename,
            ReportColumn::Field(RecordField::Title),
            ReportColumn::Field(RecordField::Authors),
            ReportColumn::Field(RecordField::PublicationYear),
            ReportColumn::Field(RecordField::KnowledgeArea),
            ReportColumn::Field(RecordField::Summary),
            ReportColumn::Field(RecordField::Keywords),
            ReportColumn::Field(RecordField::Methodology),
        ]
    }

    pub fn header(&self) -> &'static str {
        match self {
            ReportColumn::Filename => Self::FILENAME_HEADER,
            ReportColumn::Field(field) => field.json_key(),
        }
    }

    /// Cell text for `record` in this column.
    fn cell(&self, record: &ExtractedRecord) -> String {
        match self {
            ReportColumn::Filename => record.source_filename.clone(),
            ReportColumn::Field(field) => match record.get(*field) {
                Some(value) => value.render(),
                None => MISSING_FIELD_PLACEHOLDER.to_string(),
            },
        }
    }
}

/// Rectangular view of a batch: one row per record, upload order kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    columns: Vec<ReportColumn>,
    rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn from_records(records: &[ExtractedRecord]) -> Self {
        let columns = ReportColumn::all().to_vec();
        let rows = records
            .iter()
            .map(|record| columns.iter().map(|c| c.cell(record)).collect())
            .collect();
        Self { columns, rows }
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(ReportColumn::header).collect()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
