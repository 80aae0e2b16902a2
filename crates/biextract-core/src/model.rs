use serde::{Deserialize, Serialize};
use std::fmt;

/// Worksheet column titles, in emission order.
pub const COLUMNS: [&str; 14] = [
    "Substation",
    "Bay",
    "Voltage",
    "Switchgear",
    "Device",
    "Model",
    "Function",
    "Board/Slot",
    "Input_ID",
    "Input_Number",
    "Description_Line1",
    "Description_Line2",
    "Full_Description",
    "Page",
];

/// The fixed set of supported device models, plus `Unknown` for layouts the
/// detector could not pin down.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DeviceModel {
    #[serde(rename = "PCS-931S")]
    Pcs931s,
    #[serde(rename = "SEL-411L")]
    Sel411l,
    #[serde(rename = "PCS-9705S")]
    Pcs9705s,
    #[serde(rename = "UDF-506")]
    Udf506,
    #[serde(rename = "PCS-915SD")]
    Pcs915sd,
    #[serde(rename = "TESLA 4000")]
    Tesla4000,
    #[default]
    Unknown,
}

impl DeviceModel {
    pub const SUPPORTED: [DeviceModel; 6] = [
        DeviceModel::Pcs931s,
        DeviceModel::Sel411l,
        DeviceModel::Pcs9705s,
        DeviceModel::Udf506,
        DeviceModel::Pcs915sd,
        DeviceModel::Tesla4000,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceModel::Pcs931s => "PCS-931S",
            DeviceModel::Sel411l => "SEL-411L",
            DeviceModel::Pcs9705s => "PCS-9705S",
            DeviceModel::Udf506 => "UDF-506",
            DeviceModel::Pcs915sd => "PCS-915SD",
            DeviceModel::Tesla4000 => "TESLA 4000",
            DeviceModel::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DeviceModel::Unknown)
    }

    /// Vendor and product line, as printed in the run summary.
    pub fn product_name(&self) -> &'static str {
        match self {
            DeviceModel::Pcs931s => "NR Electric PCS-931S Line Differential Relay",
            DeviceModel::Sel411l => "Schweitzer SEL-411L Line Protection Relay",
            DeviceModel::Pcs9705s => "NR Electric PCS-9705S Bay Controller",
            DeviceModel::Udf506 => "NR Electric UDF-506 Fault Recorder",
            DeviceModel::Pcs915sd => "NR Electric PCS-915SD Bus Protection Relay",
            DeviceModel::Tesla4000 => "ERL TESLA 4000 Power System Recorder",
            DeviceModel::Unknown => "Unknown device",
        }
    }

    /// Resolve a model token as it appears in drawings.
    ///
    /// Spelling varies between sheets ("SEL-411L", "SEL 411L", "Tesla4000"),
    /// so everything except letters and digits is ignored.
    pub fn from_token(token: &str) -> Option<DeviceModel> {
        let squashed: String = token
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match squashed.as_str() {
            "PCS931S" => Some(DeviceModel::Pcs931s),
            "SEL411L" => Some(DeviceModel::Sel411l),
            "PCS9705S" => Some(DeviceModel::Pcs9705s),
            "UDF506" => Some(DeviceModel::Udf506),
            "PCS915SD" => Some(DeviceModel::Pcs915sd),
            "TESLA4000" => Some(DeviceModel::Tesla4000),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ambient header fields in effect at the current scan position.
///
/// Empty strings mean "not seen yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderContext {
    pub substation: String,
    pub bay: String,
    pub voltage: String,
    pub switchgear: String,
    pub device: String,
    pub model: DeviceModel,
    pub function: String,
    pub board_slot: String,
}

/// Binary input number: a plain index for most layouts, an alphanumeric
/// ordinal for layouts that label terminals like `12A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputNumber {
    Index(u32),
    Ordinal(String),
}

impl InputNumber {
    pub fn is_empty(&self) -> bool {
        match self {
            InputNumber::Index(_) => false,
            InputNumber::Ordinal(s) => s.trim().is_empty(),
        }
    }

    pub fn as_index(&self) -> Option<u32> {
        match self {
            InputNumber::Index(n) => Some(*n),
            InputNumber::Ordinal(_) => None,
        }
    }
}

impl fmt::Display for InputNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputNumber::Index(n) => write!(f, "{n}"),
            InputNumber::Ordinal(s) => f.write_str(s),
        }
    }
}

/// Fields a row parser pulled out of one table row (or wrapped row group).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub input_id: String,
    pub input_number: Option<InputNumber>,
    pub description_line1: String,
    pub description_line2: String,
    /// Board column, for layouts that print it per row.
    pub board: Option<String>,
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryInputRecord {
    pub substation: String,
    pub bay: String,
    pub voltage: String,
    pub switchgear: String,
    pub device: String,
    pub model: DeviceModel,
    pub function: String,
    pub board_slot: String,
    pub input_id: String,
    pub input_number: InputNumber,
    pub description_line1: String,
    pub description_line2: String,
    pub full_description: String,
    pub page: usize,
    /// Set when the row was parsed without a confident model match.
    #[serde(default)]
    pub needs_review: bool,
}

/// All records extracted from one source document, in encounter order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Display name, used as the worksheet name.
    pub name: String,
    pub records: Vec<BinaryInputRecord>,
}

impl DocumentResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_token_spellings() {
        assert_eq!(DeviceModel::from_token("PCS-931S"), Some(DeviceModel::Pcs931s));
        assert_eq!(DeviceModel::from_token("sel 411l"), Some(DeviceModel::Sel411l));
        assert_eq!(DeviceModel::from_token("Tesla4000"), Some(DeviceModel::Tesla4000));
        assert_eq!(DeviceModel::from_token("TESLA 4000"), Some(DeviceModel::Tesla4000));
        assert_eq!(DeviceModel::from_token("PCS-915SD"), Some(DeviceModel::Pcs915sd));
        assert_eq!(DeviceModel::from_token("PCS-978"), None);
    }

    #[test]
    fn test_model_serializes_as_product_token() {
        let json = serde_json::to_string(&DeviceModel::Pcs9705s).unwrap();
        assert_eq!(json, "\"PCS-9705S\"");
        let back: DeviceModel = serde_json::from_str("\"TESLA 4000\"").unwrap();
        assert_eq!(back, DeviceModel::Tesla4000);
    }

    #[test]
    fn test_input_number_display() {
        assert_eq!(InputNumber::Index(7).to_string(), "7");
        assert_eq!(InputNumber::Ordinal("12A".into()).to_string(), "12A");
        assert!(InputNumber::Ordinal("  ".into()).is_empty());
    }
}
