use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// Text of a single PDF page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageExtraction {
    /// 1-based, in document order.
    pub page_number: usize,
    pub text: String,
}

/// PDF text extraction abstraction (allows mocking for tests)
pub trait PdfExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, ExtractionError>;
}

/// Concatenate the text of every page, pages joined with a single space.
pub fn load_document_text(
    extractor: &dyn PdfExtractor,
    pdf_bytes: &[u8],
) -> Result<String, ExtractionError> {
    let pages = extractor.extract_text(pdf_bytes)?;
    Ok(join_pages(&pages))
}

fn join_pages(pages: &[PageExtraction]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPages(Vec<&'static str>);

    impl PdfExtractor for FixedPages {
        fn extract_text(&self, _: &[u8]) -> Result<Vec<PageExtraction>, ExtractionError> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(i, t)| PageExtraction {
                    page_number: i + 1,
                    text: t.to_string(),
                })
                .collect())
        }
    }

    struct Broken;

    impl PdfExtractor for Broken {
        fn extract_text(&self, _: &[u8]) -> Result<Vec<PageExtraction>, ExtractionError> {
            Err(ExtractionError::PdfParsing("bad xref".into()))
        }
    }

    #[test]
    fn pages_joined_with_single_space_in_order() {
        let extractor = FixedPages(vec!["Introduction", "Methods", "Results"]);
        let text = load_document_text(&extractor, b"").unwrap();
        assert_eq!(text, "Introduction Methods Results");
    }

    #[test]
    fn single_page_has_no_separator() {
        let extractor = FixedPages(vec!["Only page"]);
        assert_eq!(load_document_text(&extractor, b"").unwrap(), "Only page");
    }

    #[test]
    fn no_pages_yields_empty_text() {
        let extractor = FixedPages(vec![]);
        assert_eq!(load_document_text(&extractor, b"").unwrap(), "");
    }

    #[test]
    fn extractor_error_propagates() {
        let result = load_document_text(&Broken, b"");
        assert!(matches!(result, Err(ExtractionError::PdfParsing(_))));
    }
}
