use crate::error::BiextractError;
use crate::extraction::{split_pages, PageContent, PdfExtractor};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// `-layout` keeps the horizontal placement of table cells as runs of
/// spaces, which is what the column windows in `parsing::layout` match on.
pub struct PdftotextExtractor {
    binary: PathBuf,
}

impl PdftotextExtractor {
    pub fn new() -> Self {
        Self::with_binary("pdftotext")
    }

    /// Use a specific pdftotext executable instead of the one on `PATH`.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        PdftotextExtractor {
            binary: binary.into(),
        }
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }

    fn run(&self, pdf_path: &Path) -> Result<String, BiextractError> {
        let output = Command::new(&self.binary)
            .args(["-layout", "-enc", "UTF-8"])
            .arg(pdf_path)
            .arg("-")
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BiextractError::PdftotextNotFound
                } else {
                    BiextractError::Extraction(format!("pdftotext failed: {e}"))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BiextractError::PdftotextFailed { code, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, BiextractError> {
        let mut tmpfile = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| BiextractError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| BiextractError::Extraction(e.to_string()))?;

        let text = self.run(tmpfile.path())?;
        let pages = split_pages(&text);
        log::debug!("pdftotext produced {} page(s)", pages.len());
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_reports_not_found() {
        let extractor = PdftotextExtractor::with_binary("/nonexistent/pdftotext-biextract");
        assert!(!extractor.is_available());
        let err = extractor.extract_pages(b"%PDF-1.4\n").unwrap_err();
        assert!(matches!(err, BiextractError::PdftotextNotFound));
    }
}
