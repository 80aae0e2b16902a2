use biextract_core::config::load_config;
use biextract_core::error::BiextractError;
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::output;

pub fn show(config_file: Option<PathBuf>) -> Result<(), BiextractError> {
    let config = super::load_or_default(config_file.as_deref())?;
    output::json::print(&config.resolved())
}

pub fn validate(file: &Path) -> Result<(), BiextractError> {
    let config = load_config(file)?;
    println!("{} {}", "Valid:".green().bold(), file.display());
    if !config.layouts.is_empty() {
        let models: Vec<String> = config.layouts.keys().map(|m| m.to_string()).collect();
        println!("  layout overrides: {}", models.join(", "));
    }
    Ok(())
}
