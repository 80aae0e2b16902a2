use crate::error::BiextractError;
use crate::model::DeviceModel;
use crate::parsing::layout::{builtin_layout, ModelLayout};
use crate::MAX_DOCUMENTS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Extraction settings. Every field has a default, so a config file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Placed between Description_Line1 and Description_Line2 in
    /// Full_Description.
    pub description_separator: String,
    /// Placed between wrapped lines appended to an occupied Description_Line2.
    pub wrap_separator: String,
    /// Columns of drift allowed around each layout window.
    pub column_tolerance: usize,
    pub max_documents: usize,
    /// Per-model overrides of the built-in column layouts.
    pub layouts: BTreeMap<DeviceModel, ModelLayout>,
    /// pdftotext binary; looked up on `PATH` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdftotext: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            description_separator: " ".into(),
            wrap_separator: "\n".into(),
            column_tolerance: 2,
            max_documents: MAX_DOCUMENTS,
            layouts: BTreeMap::new(),
            pdftotext: None,
        }
    }
}

impl ExtractConfig {
    /// Layout for a model: the configured override, else the built-in one.
    pub fn layout(&self, model: DeviceModel) -> ModelLayout {
        self.layouts
            .get(&model)
            .cloned()
            .unwrap_or_else(|| builtin_layout(model))
    }

    /// The config with every model's effective layout spelled out.
    pub fn resolved(&self) -> ExtractConfig {
        let mut config = self.clone();
        for model in DeviceModel::SUPPORTED
            .into_iter()
            .chain([DeviceModel::Unknown])
        {
            config.layouts.insert(model, self.layout(model));
        }
        config
    }
}

/// Load a config from a JSON file.
pub fn load_config(path: &Path) -> Result<ExtractConfig, BiextractError> {
    let content = std::fs::read_to_string(path).map_err(|e| BiextractError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse a config from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<ExtractConfig, BiextractError> {
    let config: ExtractConfig =
        serde_json::from_str(json).map_err(|e| BiextractError::ConfigLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a config is usable.
pub fn validate_config(config: &ExtractConfig) -> Result<(), BiextractError> {
    if config.description_separator.is_empty() {
        return Err(BiextractError::ConfigInvalid(
            "description_separator must not be empty".into(),
        ));
    }

    if config.max_documents == 0 || config.max_documents > MAX_DOCUMENTS {
        return Err(BiextractError::ConfigInvalid(format!(
            "max_documents must be between 1 and {MAX_DOCUMENTS}, got {}",
            config.max_documents
        )));
    }

    for (model, layout) in &config.layouts {
        layout
            .validate()
            .map_err(|reason| BiextractError::ConfigInvalid(format!("{model} layout: {reason}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::layout::{Field, Orientation};

    #[test]
    fn test_defaults() {
        let config = ExtractConfig::default();
        assert_eq!(config.description_separator, " ");
        assert_eq!(config.wrap_separator, "\n");
        assert_eq!(config.column_tolerance, 2);
        assert_eq!(config.max_documents, 3);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse_config(r#"{ "column_tolerance": 4 }"#, Path::new("x.json")).unwrap();
        assert_eq!(config.column_tolerance, 4);
        assert_eq!(config.description_separator, " ");
    }

    #[test]
    fn test_layout_override() {
        let json = r#"{
            "layouts": {
                "SEL-411L": {
                    "orientation": "rows",
                    "columns": [
                        { "field": "input_id", "start": 0, "end": 10 },
                        { "field": "description1", "start": 10 }
                    ]
                }
            }
        }"#;
        let config = parse_config(json, Path::new("x.json")).unwrap();
        let layout = config.layout(DeviceModel::Sel411l);
        assert_eq!(layout.orientation, Orientation::Rows);
        assert_eq!(layout.field_at(12, 0), Some(Field::Description1));
        // Other models keep their built-in table.
        assert_eq!(
            config.layout(DeviceModel::Pcs931s),
            builtin_layout(DeviceModel::Pcs931s)
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = parse_config(r#"{ "max_documents": 5 }"#, Path::new("x.json")).unwrap_err();
        assert!(matches!(err, BiextractError::ConfigInvalid(_)));
        let err =
            parse_config(r#"{ "description_separator": "" }"#, Path::new("x.json")).unwrap_err();
        assert!(matches!(err, BiextractError::ConfigInvalid(_)));
        let json = r#"{ "layouts": { "UDF-506": { "orientation": "rows", "columns": [] } } }"#;
        assert!(parse_config(json, Path::new("x.json")).is_err());
    }

    #[test]
    fn test_malformed_json_is_a_load_error() {
        let err = parse_config("{", Path::new("cfg.json")).unwrap_err();
        assert!(matches!(err, BiextractError::ConfigLoad { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/biextract.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/biextract.json"));
    }

    #[test]
    fn test_resolved_lists_every_model() {
        let config = ExtractConfig::default().resolved();
        assert_eq!(config.layouts.len(), 7);
        assert!(validate_config(&config).is_ok());
    }
}
