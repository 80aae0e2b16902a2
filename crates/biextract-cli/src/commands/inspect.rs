use biextract_core::error::BiextractError;
use biextract_core::extract_file;
use std::path::PathBuf;

use crate::output;
use crate::OutputFormat;

pub fn run(
    input_file: PathBuf,
    config_file: Option<PathBuf>,
    format: OutputFormat,
    show_skipped: bool,
) -> Result<(), BiextractError> {
    let config = super::load_or_default(config_file.as_deref())?;
    let extractor = super::extractor_for(&config);
    let (result, summary) = extract_file(&input_file, &extractor, &config)?;

    match format {
        OutputFormat::Json => output::json::print(&result)?,
        OutputFormat::Table => {
            output::table::print_records(&result);
            output::table::print_summary(&summary, show_skipped);
        }
    }
    Ok(())
}
