use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BiextractError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("cannot read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("too many input documents: {given} given, at most {max} supported")]
    TooManyInputs { given: usize, max: usize },

    #[error("no input documents given")]
    NoInputs,

    #[error("none of the {0} input document(s) could be read, nothing written")]
    NothingExtracted(usize),

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("failed to write spreadsheet: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
