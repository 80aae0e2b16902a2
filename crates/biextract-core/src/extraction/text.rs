use crate::error::BiextractError;
use crate::extraction::{split_pages, PageContent, PdfExtractor};

/// Reads text that was already laid out by `pdftotext -layout` (or any tool
/// that pads columns with spaces and separates pages with form feeds).
pub struct LayoutTextExtractor;

impl PdfExtractor for LayoutTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, BiextractError> {
        let text = std::str::from_utf8(pdf_bytes)
            .map_err(|e| BiextractError::Extraction(format!("layout text is not UTF-8: {e}")))?;
        Ok(split_pages(text))
    }

    fn backend_name(&self) -> &str {
        "layout-text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_form_feed_pages() {
        let pages = LayoutTextExtractor
            .extract_pages("Model: PCS-931S\n\x0cBI_01   1   Breaker Open\n".as_bytes())
            .unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].lines[0], "BI_01   1   Breaker Open");
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        assert!(LayoutTextExtractor.extract_pages(&[0xc3, 0x28]).is_err());
    }
}
