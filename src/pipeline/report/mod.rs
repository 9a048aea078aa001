//! Report exporter: writes a [`ReportTable`] as a single-sheet XLSX workbook.
//!
//! The workbook is assembled in memory as an OOXML zip package with a shared
//! string table. Empty cells are omitted from the sheet XML.

use std::io::{Cursor, Write};
use std::path::Path;

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::{APP_NAME, REPORT_SHEET_NAME};
use crate::pipeline::batch::ReportTable;

/// Spreadsheet applications reject cells longer than this.
pub const MAX_CELL_CHARS: usize = 32_767;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("XLSX packaging failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XLSX write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize `table` to XLSX bytes. The sheet holds a header row followed by
/// one row per record.
pub fn export_xlsx(table: &ReportTable) -> Result<Vec<u8>, ExportError> {
    let mut strings = SharedStrings::default();
    let sheet = sheet_xml(table, &mut strings);

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let parts: [(&str, String); 8] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", ROOT_RELS_XML.to_string()),
        ("docProps/core.xml", core_props_xml(chrono::Utc::now())),
        ("xl/workbook.xml", workbook_xml(REPORT_SHEET_NAME)),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
        ("xl/styles.xml", STYLES_XML.to_string()),
        ("xl/sharedStrings.xml", strings.to_xml()),
        ("xl/worksheets/sheet1.xml", sheet),
    ];

    for (path, content) in parts {
        zip.start_file(path, options)?;
        zip.write_all(content.as_bytes())?;
    }

    let cursor = zip.finish()?;
    tracing::debug!(rows = table.row_count(), "XLSX report written");
    Ok(cursor.into_inner())
}

/// Write report bytes to `path` through a temp file in the same directory,
/// so a crash never leaves a half-written spreadsheet behind.
pub fn write_report(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ═══════════════════════════════════════════
// Shared strings
// ═══════════════════════════════════════════

#[derive(Default)]
struct SharedStrings {
    entries: Vec<String>,
    index: std::collections::HashMap<String, usize>,
    references: usize,
}

impl SharedStrings {
    fn intern(&mut self, value: &str) -> usize {
        self.references += 1;
        if let Some(&i) = self.index.get(value) {
            return i;
        }
        let i = self.entries.len();
        self.entries.push(value.to_string());
        self.index.insert(value.to_string(), i);
        i
    }

    fn to_xml(&self) -> String {
        let mut xml = format!(
            "{XML_DECL}<sst xmlns=\"{SHEET_NS}\" count=\"{}\" uniqueCount=\"{}\">",
            self.references,
            self.entries.len()
        );
        for entry in &self.entries {
            let space = if needs_space_preserve(entry) {
                " xml:space=\"preserve\""
            } else {
                ""
            };
            xml.push_str(&format!("<si><t{space}>{}</t></si>", escape_xml(entry)));
        }
        xml.push_str("</sst>");
        xml
    }
}

// ═══════════════════════════════════════════
// Worksheet
// ═══════════════════════════════════════════

fn sheet_xml(table: &ReportTable, strings: &mut SharedStrings) -> String {
    let headers = table.headers();
    let last_col = column_letter(headers.len().saturating_sub(1));
    let last_row = table.row_count() + 1;

    let mut xml = format!(
        "{XML_DECL}<worksheet xmlns=\"{SHEET_NS}\" xmlns:r=\"{REL_NS}\">\
         <dimension ref=\"A1:{last_col}{last_row}\"/><sheetData>"
    );

    push_row(&mut xml, 1, headers.iter().copied(), strings);
    for (i, row) in table.rows().iter().enumerate() {
        push_row(&mut xml, i + 2, row.iter().map(String::as_str), strings);
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_row<'a>(
    xml: &mut String,
    row_number: usize,
    cells: impl Iterator<Item = &'a str>,
    strings: &mut SharedStrings,
) {
    xml.push_str(&format!("<row r=\"{row_number}\">"));
    for (col, value) in cells.enumerate() {
        if value.is_empty() {
            continue;
        }
        let idx = strings.intern(truncate_cell(value));
        xml.push_str(&format!(
            "<c r=\"{}{row_number}\" t=\"s\"><v>{idx}</v></c>",
            column_letter(col)
        ));
    }
    xml.push_str("</row>");
}

/// Zero-based column index to spreadsheet letters (0 → A, 26 → AA).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn truncate_cell(value: &str) -> &str {
    crate::pipeline::structuring::truncate_chars(value, MAX_CELL_CHARS)
}

/// Escape markup characters and drop code points XML 1.0 cannot carry.
fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            // XML parsers normalize a raw CR to LF.
            '\r' => out.push_str("&#13;"),
            '\t' | '\n' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

fn needs_space_preserve(value: &str) -> bool {
    value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace)
}

// ═══════════════════════════════════════════
// Package parts
// ═══════════════════════════════════════════

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";
const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

/// Default cell format only.
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        "{XML_DECL}<workbook xmlns=\"{SHEET_NS}\" xmlns:r=\"{REL_NS}\">\
         <sheets><sheet name=\"{}\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>",
        escape_xml(sheet_name)
    )
}

fn core_props_xml(created: chrono::DateTime<chrono::Utc>) -> String {
    let stamp = created.format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        "{XML_DECL}<cp:coreProperties \
         xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
         xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
         <dc:creator>{}</dc:creator>\
         <dcterms:created xsi:type=\"dcterms:W3CDTF\">{stamp}</dcterms:created>\
         <dcterms:modified xsi:type=\"dcterms:W3CDTF\">{stamp}</dcterms:modified>\
         </cp:coreProperties>",
        escape_xml(APP_NAME)
    )
}
