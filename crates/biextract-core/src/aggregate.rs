use crate::model::{BinaryInputRecord, DocumentResult};
use crate::trace::SkippedRow;

/// Collects one document's records in encounter order.
///
/// Nothing is readable until `finish`, which consumes the aggregator, so a
/// half-scanned document can only be dropped, never emitted.
#[derive(Debug)]
pub struct DocumentAggregator {
    name: String,
    records: Vec<BinaryInputRecord>,
    skipped: Vec<SkippedRow>,
}

impl DocumentAggregator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn push(&mut self, record: BinaryInputRecord) {
        self.records.push(record);
    }

    pub fn skip(&mut self, row: SkippedRow) {
        log::debug!(
            "{}: skipped page {} line '{}': {}",
            self.name,
            row.page,
            row.line_text.trim(),
            row.reason
        );
        self.skipped.push(row);
    }

    pub fn finish(self) -> (DocumentResult, Vec<SkippedRow>) {
        (
            DocumentResult {
                name: self.name,
                records: self.records,
            },
            self.skipped,
        )
    }
}
