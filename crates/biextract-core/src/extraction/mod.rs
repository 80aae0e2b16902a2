pub mod pdftotext;
pub mod text;

use crate::error::BiextractError;
use pdftotext::PdftotextExtractor;
use text::LayoutTextExtractor;

/// Text of a single page, one entry per physical line.
///
/// Lines keep their leading whitespace: with layout-preserving extraction the
/// character column of a token is its horizontal position on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub page_number: usize,
    pub lines: Vec<String>,
}

impl PageContent {
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Trait for page text backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from document bytes, returning one PageContent per page.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, BiextractError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// What an input file looks like, judged from its first bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    LayoutText,
    Unsupported,
}

pub fn detect_input_kind(bytes: &[u8]) -> InputKind {
    if bytes.starts_with(b"%PDF-") {
        InputKind::Pdf
    } else if !bytes.is_empty() && std::str::from_utf8(bytes).is_ok() {
        InputKind::LayoutText
    } else {
        InputKind::Unsupported
    }
}

/// Split layout text into pages on form feeds.
///
/// pdftotext terminates every page with `\x0c`, so the trailing empty chunk
/// is dropped; page 1 is always kept.
pub fn split_pages(text: &str) -> Vec<PageContent> {
    text.split('\x0c')
        .enumerate()
        .map(|(i, page_text)| PageContent {
            page_number: i + 1,
            lines: page_text
                .lines()
                .map(|l| l.trim_end_matches('\r').to_string())
                .collect(),
        })
        .filter(|p| !p.lines.is_empty() || p.page_number == 1)
        .collect()
}

/// Dispatches on the input's magic bytes: PDFs go through pdftotext,
/// UTF-8 text is taken as an existing layout dump.
pub struct SniffingExtractor {
    pdf: PdftotextExtractor,
    text: LayoutTextExtractor,
}

impl SniffingExtractor {
    pub fn new(pdf: PdftotextExtractor) -> Self {
        SniffingExtractor {
            pdf,
            text: LayoutTextExtractor,
        }
    }
}

impl Default for SniffingExtractor {
    fn default() -> Self {
        Self::new(PdftotextExtractor::new())
    }
}

impl PdfExtractor for SniffingExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, BiextractError> {
        match detect_input_kind(pdf_bytes) {
            InputKind::Pdf => self.pdf.extract_pages(pdf_bytes),
            InputKind::LayoutText => self.text.extract_pages(pdf_bytes),
            InputKind::Unsupported => Err(BiextractError::Extraction(
                "input is neither a PDF nor UTF-8 layout text".into(),
            )),
        }
    }

    fn backend_name(&self) -> &str {
        "auto"
    }
}
