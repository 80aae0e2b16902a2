pub mod detect;
pub mod header;
pub mod layout;
pub mod normalize;
pub mod rows;
pub mod table;
pub mod values;

use crate::aggregate::DocumentAggregator;
use crate::config::ExtractConfig;
use crate::extraction::PageContent;
use crate::model::{DeviceModel, DocumentResult, HeaderContext, RawRow};
use crate::trace::{SkipReason, SkippedRow};
use detect::ModelDetector;
use header::{DeviceCatalog, HeaderField, HeaderTracker};
use layout::{ModelLayout, Orientation};
use normalize::{append_continuation, normalize_row};
use rows::{assemble_band, classify_line, LineClass, RowStrategy};
use std::collections::{BTreeMap, VecDeque};

/// Description lines kept above a transposed id line.
const BAND_DEPTH: usize = 2;

/// Outcome of scanning one document.
#[derive(Debug, Clone)]
pub struct DocumentScan {
    pub result: DocumentResult,
    pub skipped_rows: Vec<SkippedRow>,
    /// The model detector never identified a supported model.
    pub unresolved_model: bool,
}

/// Scan a document's pages into records.
///
/// Header context, model detection and the device catalog all start empty,
/// so nothing leaks in from a previously scanned document.
pub fn scan_document(name: &str, pages: &[PageContent], config: &ExtractConfig) -> DocumentScan {
    let mut scanner = Scanner::new(name, config);
    for page in pages {
        scanner.scan_page(page);
    }
    scanner.finish()
}

/// A data row waiting for possible wrapped continuation lines.
struct PendingRow {
    row: RawRow,
    anchor: usize,
    context: HeaderContext,
    page: usize,
    line_text: String,
}

struct Scanner<'c> {
    config: &'c ExtractConfig,
    layouts: BTreeMap<DeviceModel, ModelLayout>,
    tracker: HeaderTracker,
    detector: ModelDetector,
    aggregator: DocumentAggregator,
    pending: Option<PendingRow>,
    band: VecDeque<String>,
    region_open: bool,
    page: usize,
    resolved_once: bool,
}

impl<'c> Scanner<'c> {
    fn new(name: &str, config: &'c ExtractConfig) -> Self {
        Self {
            config,
            layouts: config.resolved().layouts,
            tracker: HeaderTracker::new(),
            detector: ModelDetector::new(),
            aggregator: DocumentAggregator::new(name),
            pending: None,
            band: VecDeque::new(),
            region_open: false,
            page: 0,
            resolved_once: false,
        }
    }

    fn scan_page(&mut self, page: &PageContent) {
        self.page = page.page_number;
        self.region_open = false;
        self.detector.begin_page();

        if DeviceCatalog::is_catalog_page(&page.text()) {
            let before = self.tracker.catalog().len();
            for line in &page.lines {
                self.tracker.observe_catalog_line(line);
            }
            log::debug!(
                "page {}: material list, {} device(s) catalogued",
                self.page,
                self.tracker.catalog().len() - before
            );
            return;
        }

        for line in &page.lines {
            if line.trim().is_empty() {
                continue;
            }
            self.scan_line(line);
            self.resolved_once |= self.detector.is_resolved();
        }

        self.flush_pending();
        self.drain_band();
    }

    fn scan_line(&mut self, line: &str) {
        // A device title or model token quoted in a wrapped description is
        // part of the row, not a new header.
        if let Some(text) = self.continuation_of_pending(line) {
            if let Some(pending) = self.pending.as_mut() {
                append_continuation(&mut pending.row, &text, &self.config.wrap_separator);
            }
            return;
        }

        let update = self.tracker.observe_explicit(line);
        if update.changed(HeaderField::Model) {
            self.detector.observe_explicit(self.tracker.context().model);
        }
        if update.is_header_line() {
            self.flush_pending();
            self.drain_band();
            return;
        }

        self.detector.observe_cues(line);
        let model = self.detector.resolve();
        let strategy = RowStrategy::for_model(model);
        let Some(layout) = self.layouts.get(&model) else {
            return;
        };
        let transposed = layout.orientation == Orientation::Transposed;
        let pending_anchor = self.pending.as_ref().map(|p| p.anchor);

        match classify_line(
            strategy,
            layout,
            self.config.column_tolerance,
            line,
            pending_anchor,
        ) {
            LineClass::Row { row, anchor } => {
                self.flush_pending();
                self.region_open = true;
                if let Some(board) = &row.board {
                    self.tracker.observe_board(board);
                }
                self.pending = Some(PendingRow {
                    row,
                    anchor,
                    context: self.snapshot(model),
                    page: self.page,
                    line_text: line.to_string(),
                });
            }
            LineClass::IdBand(ids) => {
                self.flush_pending();
                self.region_open = true;
                let band: Vec<String> = self.band.drain(..).collect();
                let context = self.snapshot(model);
                for row in assemble_band(&ids, &band, self.config.column_tolerance) {
                    self.emit(row, &context, self.page, line);
                }
            }
            LineClass::Continuation(text) => {
                if let Some(pending) = self.pending.as_mut() {
                    append_continuation(&mut pending.row, &text, &self.config.wrap_separator);
                }
            }
            LineClass::ColumnTitles => {
                self.flush_pending();
                self.drain_band();
                self.region_open = true;
            }
            LineClass::Noise(kind) => {
                self.flush_pending();
                if self.region_open {
                    self.skip(line, SkipReason::noise(kind));
                }
            }
            LineClass::Malformed(reason) => {
                self.flush_pending();
                self.region_open = true;
                self.skip(line, SkipReason::Malformed(reason));
            }
            LineClass::Text => {
                if self.tracker.observe_patterns(line).is_header_line() {
                    self.flush_pending();
                    return;
                }
                if transposed {
                    self.band.push_back(line.to_string());
                    if self.band.len() > BAND_DEPTH {
                        if let Some(evicted) = self.band.pop_front() {
                            if self.region_open {
                                self.skip(&evicted, SkipReason::OrphanDescription);
                            }
                        }
                    }
                } else {
                    self.flush_pending();
                    if self.region_open {
                        self.skip(line, SkipReason::Unrecognised);
                    }
                }
            }
        }
    }

    /// Text of `line` if it wraps the pending row's description, judged by
    /// the layout that row was read with.
    fn continuation_of_pending(&self, line: &str) -> Option<String> {
        let pending = self.pending.as_ref()?;
        let model = pending.context.model;
        let layout = self.layouts.get(&model)?;
        match classify_line(
            RowStrategy::for_model(model),
            layout,
            self.config.column_tolerance,
            line,
            Some(pending.anchor),
        ) {
            LineClass::Continuation(text) => Some(text),
            _ => None,
        }
    }

    /// Header context as it applies to a row read now.
    fn snapshot(&self, model: DeviceModel) -> HeaderContext {
        let mut context = self.tracker.context().clone();
        context.model = model;
        context
    }

    fn flush_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.emit(
                pending.row,
                &pending.context,
                pending.page,
                &pending.line_text,
            );
        }
    }

    fn emit(&mut self, row: RawRow, context: &HeaderContext, page: usize, line: &str) {
        match normalize_row(context, row, page, &self.config.description_separator) {
            Ok(record) => self.aggregator.push(record),
            Err(reason) => self.aggregator.skip(SkippedRow {
                page,
                line_text: line.trim().to_string(),
                reason: SkipReason::Rejected(reason),
            }),
        }
    }

    /// Drop buffered band lines; inside a table they are orphans.
    fn drain_band(&mut self) {
        let band: Vec<String> = self.band.drain(..).collect();
        if self.region_open {
            for line in band {
                self.skip(&line, SkipReason::OrphanDescription);
            }
        }
    }

    fn skip(&mut self, line: &str, reason: SkipReason) {
        self.aggregator.skip(SkippedRow {
            page: self.page,
            line_text: line.trim().to_string(),
            reason,
        });
    }

    fn finish(mut self) -> DocumentScan {
        self.flush_pending();
        self.drain_band();
        let unresolved_model = !self.resolved_once;
        let (result, skipped_rows) = self.aggregator.finish();
        if unresolved_model && !result.is_empty() {
            log::warn!(
                "{}: no supported device model identified, {} row(s) flagged for review",
                result.name,
                result.records.len()
            );
        }
        DocumentScan {
            result,
            skipped_rows,
            unresolved_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InputNumber;

    fn page(number: usize, lines: &[&str]) -> PageContent {
        PageContent {
            page_number: number,
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn scan(pages: &[PageContent]) -> DocumentScan {
        scan_document("doc", pages, &ExtractConfig::default())
    }

    #[test]
    fn test_rows_inherit_header_context() {
        let scan = scan(&[page(
            1,
            &[
                "Substation: ALFA",
                "Model: PCS-931S",
                "Input     No.   Description",
                "BI_01   1     Breaker Open                    52a",
                "BI_02   2     Breaker Closed                  52b",
            ],
        )]);
        let records = &scan.result.records;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.substation == "ALFA"));
        assert!(records.iter().all(|r| r.model == DeviceModel::Pcs931s));
        assert_eq!(records[1].full_description, "Breaker Closed 52b");
        assert!(!scan.unresolved_model);
        assert!(scan.skipped_rows.is_empty());
    }

    #[test]
    fn test_wrapped_description_naming_another_device() {
        let scan = scan(&[page(
            1,
            &[
                "Model: PCS-931S",
                "BI_01   1     Disparo externo",
                "              desde -F02 (SEL-411L)",
                "BI_02   2     Breaker Open",
                "BI_03   3     Breaker Closed",
            ],
        )]);
        let records = &scan.result.records;
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.model == DeviceModel::Pcs931s));
        assert!(records.iter().all(|r| r.device.is_empty()));
        assert_eq!(records[0].description_line2, "desde -F02 (SEL-411L)");
        assert!(scan.skipped_rows.is_empty());
    }

    #[test]
    fn test_label_word_in_description_is_still_a_row() {
        let scan = scan(&[page(
            1,
            &[
                "Model: PCS-931S",
                "BI_01   1     Breaker Open",
                "BI_02   2     Tablero: falla alimentación",
            ],
        )]);
        let records = &scan.result.records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].description_line1, "Tablero: falla alimentación");
        assert!(records.iter().all(|r| r.switchgear.is_empty()));
        assert!(scan.skipped_rows.is_empty());
    }

    #[test]
    fn test_wrapped_description_joins_line2() {
        let scan = scan(&[page(
            1,
            &[
                "Model: PCS-931S",
                "BI_01   1     Interruptor =D.Q01.QA1",
                "              Posición Cerrado",
                "              Fase R,S,T",
                "BI_02   2     Reserva",
            ],
        )]);
        let records = &scan.result.records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description_line2, "Posición Cerrado\nFase R,S,T");
        assert_eq!(records[1].description_line1, "Reserva");
    }

    #[test]
    fn test_footer_inside_table_is_skipped() {
        let scan = scan(&[page(
            1,
            &[
                "Model: PCS-931S",
                "Page 1 of 2",
                "BI_01   1     Breaker Open",
                "Page 1 of 2",
                "BI_02   2     Breaker Closed",
            ],
        )]);
        assert_eq!(scan.result.records.len(), 2);
        // The footer before the table is preamble, not a skipped row.
        assert_eq!(scan.skipped_rows.len(), 1);
        assert_eq!(scan.skipped_rows[0].page, 1);
    }

    #[test]
    fn test_malformed_and_rejected_rows_are_counted() {
        let scan = scan(&[page(
            1,
            &[
                "Model: PCS-931S",
                "BI_01   1     Breaker Open",
                "BI_02   x     Breaker Closed",
                "BI_03         Trip Signal",
            ],
        )]);
        assert_eq!(scan.result.records.len(), 1);
        assert_eq!(scan.skipped_rows.len(), 2);
        assert!(matches!(scan.skipped_rows[0].reason, SkipReason::Malformed(_)));
        assert!(matches!(scan.skipped_rows[1].reason, SkipReason::Rejected(_)));
    }

    #[test]
    fn test_model_changes_between_pages() {
        let scan = scan(&[
            page(1, &["Model: PCS-931S", "BI_01   1     Breaker Open"]),
            page(2, &["BI_02   2     Breaker Closed"]),
            page(3, &["Model: SEL-411L", "IN101   Disparo 87L"]),
        ]);
        let models: Vec<DeviceModel> = scan.result.records.iter().map(|r| r.model).collect();
        assert_eq!(
            models,
            [DeviceModel::Pcs931s, DeviceModel::Pcs931s, DeviceModel::Sel411l]
        );
        assert_eq!(scan.result.records[1].page, 2);
        assert_eq!(scan.result.records[2].input_number, InputNumber::Index(101));
    }

    #[test]
    fn test_unknown_model_rows_flagged() {
        let scan = scan(&[page(1, &["BI_01   1   Breaker Open"])]);
        assert!(scan.unresolved_model);
        assert_eq!(scan.result.records.len(), 1);
        let rec = &scan.result.records[0];
        assert_eq!(rec.model, DeviceModel::Unknown);
        assert!(rec.needs_review);
        assert_eq!(rec.description_line1, "Breaker Open");
    }

    #[test]
    fn test_transposed_table() {
        let scan = scan(&[page(
            1,
            &[
                "TESLA 4000",
                "   Interr.      Seccion.",
                "   Abierto      Cerrado",
                "   BI_01        BI_02",
            ],
        )]);
        let records = &scan.result.records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].model, DeviceModel::Tesla4000);
        assert_eq!(records[0].full_description, "Interr. Abierto");
        assert_eq!(records[1].input_id, "BI_02");
    }

    #[test]
    fn test_catalog_page_feeds_device_titles() {
        let scan = scan(&[
            page(
                1,
                &[
                    "LISTA DE MATERIALES",
                    "  -F01   RELÉ DIFERENCIAL DE LÍNEA   PCS-931S",
                ],
            ),
            page(
                2,
                &[
                    "Entradas Binarias de -F01",
                    "BI_01   1     Breaker Open",
                ],
            ),
        ]);
        let rec = &scan.result.records[0];
        assert_eq!(rec.device, "-F01");
        assert_eq!(rec.model, DeviceModel::Pcs931s);
        assert_eq!(rec.function, "Relé Diferencial de Línea");
        assert_eq!(rec.page, 2);
    }
}
