use biextract_core::emit::XlsxEmitter;
use biextract_core::error::BiextractError;
use biextract_core::run_batch;
use std::path::PathBuf;

use crate::output;
use crate::OutputFormat;

pub fn run(
    inputs: Vec<PathBuf>,
    out: PathBuf,
    config_file: Option<PathBuf>,
    format: OutputFormat,
) -> Result<(), BiextractError> {
    let config = super::load_or_default(config_file.as_deref())?;
    let extractor = super::extractor_for(&config);
    let mut emitter = XlsxEmitter::new(&out);

    let report = run_batch(&inputs, &extractor, &mut emitter, &config)?;

    match format {
        OutputFormat::Json => output::json::print(&report)?,
        OutputFormat::Table => output::table::print_report(&report),
    }

    if report.output.is_none() {
        return Err(BiextractError::NothingExtracted(inputs.len()));
    }
    Ok(())
}
