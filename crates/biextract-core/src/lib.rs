pub mod aggregate;
pub mod config;
pub mod emit;
pub mod error;
pub mod extraction;
pub mod model;
pub mod parsing;
pub mod trace;

use config::ExtractConfig;
use emit::xlsx::emit_standard;
use emit::SheetEmitter;
use error::BiextractError;
use extraction::{PageContent, PdfExtractor};
use model::DocumentResult;
use std::path::{Path, PathBuf};
use trace::{count_devices, DocumentFailure, DocumentSummary, RunReport};

/// Most documents a single run accepts.
pub const MAX_DOCUMENTS: usize = 3;

/// Extract records from already-loaded pages.
pub fn extract_document(
    name: &str,
    pages: &[PageContent],
    config: &ExtractConfig,
) -> (DocumentResult, DocumentSummary) {
    let scan = parsing::scan_document(name, pages, config);
    let summary = DocumentSummary {
        name: scan.result.name.clone(),
        source: None,
        records: scan.result.records.len(),
        skipped_rows: scan.skipped_rows,
        unresolved_model: scan.unresolved_model,
        devices: count_devices(&scan.result.records),
    };
    (scan.result, summary)
}

/// Load one file through `extractor` and extract its records.
///
/// Fails when the file cannot be read or holds no text at all; rows that do
/// not parse are reported in the summary instead.
pub fn extract_file(
    path: &Path,
    extractor: &dyn PdfExtractor,
    config: &ExtractConfig,
) -> Result<(DocumentResult, DocumentSummary), BiextractError> {
    let bytes = std::fs::read(path).map_err(|e| BiextractError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let pages = extractor.extract_pages(&bytes)?;
    if pages.iter().all(|p| p.is_blank()) {
        return Err(BiextractError::Extraction(
            "no text content found (scanned drawings are not supported)".into(),
        ));
    }
    log::info!(
        "{}: {} page(s) via {}",
        path.display(),
        pages.len(),
        extractor.backend_name()
    );

    let (result, mut summary) = extract_document(&display_name(path), &pages, config);
    summary.source = Some(path.to_path_buf());
    Ok((result, summary))
}

/// Process up to `config.max_documents` files and emit one sheet each.
///
/// A file that cannot be read is reported in `failures` and the others are
/// still processed. When no file could be read nothing is emitted. Only
/// emitter failures abort the run.
pub fn run_batch(
    inputs: &[PathBuf],
    extractor: &dyn PdfExtractor,
    emitter: &mut dyn SheetEmitter,
    config: &ExtractConfig,
) -> Result<RunReport, BiextractError> {
    if inputs.is_empty() {
        return Err(BiextractError::NoInputs);
    }
    if inputs.len() > config.max_documents {
        return Err(BiextractError::TooManyInputs {
            given: inputs.len(),
            max: config.max_documents,
        });
    }

    let mut report = RunReport::default();
    let mut results = Vec::new();
    for path in inputs {
        match extract_file(path, extractor, config) {
            Ok((result, summary)) => {
                results.push(result);
                report.documents.push(summary);
            }
            Err(e) => {
                log::error!("{}: {e}", path.display());
                report.failures.push(DocumentFailure {
                    source: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if results.is_empty() {
        log::warn!("no document could be read, nothing written");
        return Ok(report);
    }

    for result in &results {
        emit_standard(emitter, &result.name, &result.records)?;
    }
    emitter.finish()?;
    report.output = emitter.destination().map(Path::to_path_buf);
    Ok(report)
}

/// Worksheet name for a source file: its file stem.
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_is_file_stem() {
        assert_eq!(display_name(Path::new("/tmp/L-2201 BI.pdf")), "L-2201 BI");
        assert_eq!(display_name(Path::new("panel")), "panel");
        assert_eq!(display_name(Path::new("/")), "document");
    }
}
