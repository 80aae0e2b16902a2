pub mod config;
pub mod extract;
pub mod inspect;

use biextract_core::config::{load_config, ExtractConfig};
use biextract_core::error::BiextractError;
use biextract_core::extraction::pdftotext::PdftotextExtractor;
use biextract_core::extraction::SniffingExtractor;
use std::path::Path;

/// The config file if one was given, defaults otherwise.
pub fn load_or_default(path: Option<&Path>) -> Result<ExtractConfig, BiextractError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(ExtractConfig::default()),
    }
}

pub fn extractor_for(config: &ExtractConfig) -> SniffingExtractor {
    let pdf = match &config.pdftotext {
        Some(binary) => PdftotextExtractor::with_binary(binary),
        None => PdftotextExtractor::new(),
    };
    if !pdf.is_available() {
        log::warn!("pdftotext not found; only pre-extracted layout text can be read");
    }
    SniffingExtractor::new(pdf)
}
