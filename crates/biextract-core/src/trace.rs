use crate::model::{BinaryInputRecord, DeviceModel};
use crate::parsing::table::NoiseKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum SkipReason {
    /// Footer, revision stamp, legend or frame reference inside a table.
    Noise(String),
    /// Text inside a table region that fits no row shape.
    Unrecognised,
    /// An input id whose other cells do not fit the layout.
    Malformed(String),
    /// Rejected by the normalizer (missing id or number).
    Rejected(String),
    /// Description text above a transposed id line that no id picked up.
    OrphanDescription,
}

impl SkipReason {
    pub fn noise(kind: NoiseKind) -> Self {
        let label = match kind {
            NoiseKind::PageFooter => "page footer",
            NoiseKind::RevisionStamp => "revision stamp",
            NoiseKind::Legend => "legend",
            NoiseKind::FrameGrid => "frame grid",
        };
        SkipReason::Noise(label.to_string())
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Noise(kind) => write!(f, "noise ({kind})"),
            SkipReason::Unrecognised => f.write_str("unrecognised line"),
            SkipReason::Malformed(reason) => write!(f, "malformed row: {reason}"),
            SkipReason::Rejected(reason) => write!(f, "rejected: {reason}"),
            SkipReason::OrphanDescription => f.write_str("description without input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub page: usize,
    pub line_text: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCount {
    pub device: String,
    pub model: DeviceModel,
    pub records: usize,
}

/// What happened to one document, for the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    pub records: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_rows: Vec<SkippedRow>,
    /// No supported model was ever identified; rows carry `Unknown`.
    pub unresolved_model: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<DeviceCount>,
}

impl DocumentSummary {
    pub fn skipped(&self) -> usize {
        self.skipped_rows.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub source: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub schema_version: String,
    pub documents: Vec<DocumentSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<DocumentFailure>,
    /// Workbook written, or `None` when nothing could be read.
    pub output: Option<PathBuf>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            documents: Vec::new(),
            failures: Vec::new(),
            output: None,
        }
    }
}

impl RunReport {
    pub fn total_records(&self) -> usize {
        self.documents.iter().map(|d| d.records).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.documents.iter().map(|d| d.skipped()).sum()
    }
}

/// Records per (device, model), in order of first appearance.
pub fn count_devices(records: &[BinaryInputRecord]) -> Vec<DeviceCount> {
    let mut order: Vec<(String, DeviceModel)> = Vec::new();
    let mut counts: BTreeMap<(String, DeviceModel), usize> = BTreeMap::new();
    for rec in records {
        let key = (rec.device.clone(), rec.model);
        let n = counts.entry(key.clone()).or_insert(0);
        if *n == 0 {
            order.push(key);
        }
        *n += 1;
    }
    order
        .into_iter()
        .map(|key| {
            let records = counts.get(&key).copied().unwrap_or_default();
            DeviceCount {
                device: key.0,
                model: key.1,
                records,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InputNumber;

    fn record(device: &str, model: DeviceModel) -> BinaryInputRecord {
        BinaryInputRecord {
            substation: String::new(),
            bay: String::new(),
            voltage: String::new(),
            switchgear: String::new(),
            device: device.into(),
            model,
            function: String::new(),
            board_slot: String::new(),
            input_id: "BI_01".into(),
            input_number: InputNumber::Index(1),
            description_line1: String::new(),
            description_line2: String::new(),
            full_description: String::new(),
            page: 1,
            needs_review: false,
        }
    }

    #[test]
    fn test_count_devices_keeps_first_appearance_order() {
        let records = vec![
            record("-F02", DeviceModel::Sel411l),
            record("-F01", DeviceModel::Pcs931s),
            record("-F02", DeviceModel::Sel411l),
        ];
        let counts = count_devices(&records);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].device, "-F02");
        assert_eq!(counts[0].records, 2);
        assert_eq!(counts[1].model, DeviceModel::Pcs931s);
    }

    #[test]
    fn test_skip_reason_serializes_tagged() {
        let json = serde_json::to_string(&SkipReason::noise(NoiseKind::PageFooter)).unwrap();
        assert_eq!(json, r#"{"kind":"noise","detail":"page footer"}"#);
        let json = serde_json::to_string(&SkipReason::Unrecognised).unwrap();
        assert_eq!(json, r#"{"kind":"unrecognised"}"#);
    }

    #[test]
    fn test_report_totals() {
        let mut report = RunReport::default();
        assert_eq!(report.schema_version, REPORT_SCHEMA_VERSION);
        report.documents.push(DocumentSummary {
            name: "a".into(),
            source: None,
            records: 3,
            skipped_rows: vec![SkippedRow {
                page: 1,
                line_text: "Page 1 of 2".into(),
                reason: SkipReason::noise(NoiseKind::PageFooter),
            }],
            unresolved_model: false,
            devices: Vec::new(),
        });
        assert_eq!(report.total_records(), 3);
        assert_eq!(report.total_skipped(), 1);
    }
}
