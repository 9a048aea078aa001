use std::panic::{self, AssertUnwindSafe};

use super::types::{PageExtraction, PdfExtractor};
use super::ExtractionError;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers.
///
/// pdf-extract panics on some malformed files; the panic is caught and
/// returned as [`ExtractionError::PdfPanic`] so one bad upload cannot take
/// the batch down.
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, ExtractionError> {
        let page_texts =
            extract_guarded(|| pdf_extract::extract_text_from_mem_by_pages(pdf_bytes))?;

        let pages = page_texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PageExtraction {
                page_number: i + 1,
                text,
            })
            .collect();

        Ok(pages)
    }
}

/// Run one extraction call, turning a panic into [`ExtractionError::PdfPanic`].
fn extract_guarded<E: std::fmt::Display>(
    extract: impl FnOnce() -> Result<Vec<String>, E>,
) -> Result<Vec<String>, ExtractionError> {
    panic::catch_unwind(AssertUnwindSafe(extract))
        .map_err(|payload| ExtractionError::PdfPanic(panic_message(payload.as_ref())))?
        .map_err(|e| ExtractionError::PdfParsing(e.to_string()))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
pub(crate) mod test_pdf {
    use lopdf::dictionary;
    use lopdf::{Dictionary, Document, Object, Stream};

    /// Generate a valid PDF with one text page per entry, using lopdf
    /// (the library that pdf-extract uses internally).
    pub fn make_test_pdf(pages: &[&str]) -> Vec<u8> {
        make_test_pdf_with_font(
            pages,
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
            },
        )
    }

    /// Same layout as [`make_test_pdf`], every page set in `font`.
    pub fn make_test_pdf_with_font(pages: &[&str], font: Dictionary) -> Vec<u8> {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(font);

        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            // BT /F1 12 Tf (text) Tj ET
            let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }
}
