//! Column layouts for the supported device tables.
//!
//! A layout is an ordered list of (field, offset window) pairs. Offsets are
//! character columns measured from the row's input-id token, so a table that
//! is shifted as a whole still matches; the per-config tolerance absorbs
//! drift of individual cells.

use crate::model::DeviceModel;
use serde::{Deserialize, Serialize};

/// A run of text separated from its neighbours by two or more spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Character column of the first character.
    pub column: usize,
    pub text: &'a str,
}

impl<'a> Segment<'a> {
    /// Column one past the last character.
    pub fn end(&self) -> usize {
        self.column + self.text.chars().count()
    }

    pub fn center(&self) -> usize {
        (self.column + self.end()) / 2
    }

    /// Split off the first whitespace-delimited token.
    ///
    /// Cells separated by a single space (`BI_01 1`) come out of
    /// `split_segments` glued together; this peels them apart again.
    pub fn split_first_token(&self) -> (Segment<'a>, Option<Segment<'a>>) {
        match self.text.find(char::is_whitespace) {
            None => (*self, None),
            Some(idx) => {
                let head = &self.text[..idx];
                let rest = self.text[idx..].trim_start();
                let skipped = self.text[idx..].chars().count() - rest.chars().count();
                let head_seg = Segment {
                    column: self.column,
                    text: head,
                };
                let rest_seg = Segment {
                    column: self.column + head.chars().count() + skipped,
                    text: rest,
                };
                (head_seg, Some(rest_seg))
            }
        }
    }
}

/// Tab stops are this many columns apart.
const TAB_WIDTH: usize = 8;

/// Split a line at gaps of 2+ whitespace characters, keeping columns. A tab
/// always ends a cell and advances to the next tab stop.
pub fn split_segments(line: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start: Option<(usize, usize)> = None;
    let mut last_end = 0;
    let mut gap = 0;
    let mut column = 0;

    for (byte, c) in line.char_indices() {
        if c == '\t' {
            if let Some((s, col)) = start.take() {
                segments.push(Segment {
                    column: col,
                    text: &line[s..last_end],
                });
            }
            gap = 2;
            column = (column / TAB_WIDTH + 1) * TAB_WIDTH;
            continue;
        }
        if c.is_whitespace() {
            gap += 1;
            if gap == 2 {
                if let Some((s, col)) = start.take() {
                    segments.push(Segment {
                        column: col,
                        text: &line[s..last_end],
                    });
                }
            }
        } else {
            if start.is_none() {
                start = Some((byte, column));
            }
            gap = 0;
            last_end = byte + c.len_utf8();
        }
        column += 1;
    }

    if let Some((s, col)) = start {
        segments.push(Segment {
            column: col,
            text: &line[s..last_end],
        });
    }

    segments
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Board,
    InputId,
    InputNumber,
    Description1,
    Description2,
    /// A single description cell holding both lines as `line1 - line2`.
    Description,
}

impl Field {
    pub fn is_description(&self) -> bool {
        matches!(
            self,
            Field::Description | Field::Description1 | Field::Description2
        )
    }
}

/// Offset window `[start, end)` relative to the input-id column; `end: None`
/// runs to the end of the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnWindow {
    pub field: Field,
    pub start: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i32>,
}

impl ColumnWindow {
    fn new(field: Field, start: i32, end: Option<i32>) -> Self {
        ColumnWindow { field, start, end }
    }

    fn contains(&self, offset: i32) -> bool {
        offset >= self.start && self.end.map_or(true, |end| offset < end)
    }

    /// Distance from the window edge; zero inside.
    fn distance(&self, offset: i32) -> i32 {
        if offset < self.start {
            self.start - offset
        } else {
            match self.end {
                Some(end) if offset >= end => offset - end + 1,
                _ => 0,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// One input per line, cells left to right.
    Rows,
    /// Input ids side by side on one line, descriptions stacked above them.
    Transposed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLayout {
    pub orientation: Orientation,
    #[serde(default)]
    pub columns: Vec<ColumnWindow>,
}

impl ModelLayout {
    /// Field whose window holds `offset`, allowing `tolerance` columns of
    /// drift. An exact hit always beats a near miss.
    pub fn field_at(&self, offset: i32, tolerance: i32) -> Option<Field> {
        self.locate(offset, tolerance, |_| true)
    }

    /// Field for a cell beside the id token. The id's own window is left
    /// out, so a cell drifting toward the id still reaches its neighbour.
    pub fn cell_field_at(&self, offset: i32, tolerance: i32) -> Option<Field> {
        self.locate(offset, tolerance, |w| w.field != Field::InputId)
    }

    fn locate(
        &self,
        offset: i32,
        tolerance: i32,
        keep: impl Fn(&ColumnWindow) -> bool,
    ) -> Option<Field> {
        let windows = || self.columns.iter().filter(|w| keep(w));
        if let Some(w) = windows().find(|w| w.contains(offset)) {
            return Some(w.field);
        }
        windows()
            .map(|w| (w.distance(offset), w))
            .filter(|(d, _)| *d <= tolerance)
            .min_by_key(|(d, _)| *d)
            .map(|(_, w)| w.field)
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.columns.iter().any(|w| w.field == field)
    }

    /// Whether text starting at `offset` would sit in a description cell.
    pub fn is_description_offset(&self, offset: i32, tolerance: i32) -> bool {
        self.field_at(offset, tolerance)
            .is_some_and(|f| f.is_description())
    }

    /// Check windows are non-empty and row layouts can anchor on an id.
    pub fn validate(&self) -> Result<(), String> {
        for w in &self.columns {
            if let Some(end) = w.end {
                if end <= w.start {
                    return Err(format!(
                        "{:?} window [{}, {}) is empty or inverted",
                        w.field, w.start, end
                    ));
                }
            }
        }
        if self.orientation == Orientation::Rows && !self.has_field(Field::InputId) {
            return Err("row layout has no input_id column".into());
        }
        Ok(())
    }
}

/// Column table each model's drawings use out of the box.
pub fn builtin_layout(model: DeviceModel) -> ModelLayout {
    use Field::*;
    let rows = |columns: Vec<ColumnWindow>| ModelLayout {
        orientation: Orientation::Rows,
        columns,
    };
    match model {
        DeviceModel::Pcs931s => rows(vec![
            ColumnWindow::new(InputId, 0, Some(8)),
            ColumnWindow::new(InputNumber, 8, Some(14)),
            ColumnWindow::new(Description1, 14, Some(46)),
            ColumnWindow::new(Description2, 46, None),
        ]),
        DeviceModel::Sel411l => rows(vec![
            ColumnWindow::new(InputId, 0, Some(8)),
            ColumnWindow::new(Description1, 8, Some(40)),
            ColumnWindow::new(Description2, 40, None),
        ]),
        DeviceModel::Pcs9705s => rows(vec![
            ColumnWindow::new(Board, -8, Some(0)),
            ColumnWindow::new(InputId, 0, Some(8)),
            ColumnWindow::new(InputNumber, 8, Some(14)),
            ColumnWindow::new(Description, 14, None),
        ]),
        DeviceModel::Udf506 => rows(vec![
            ColumnWindow::new(InputNumber, -8, Some(0)),
            ColumnWindow::new(InputId, 0, Some(8)),
            ColumnWindow::new(Description1, 8, Some(40)),
            ColumnWindow::new(Description2, 40, None),
        ]),
        DeviceModel::Pcs915sd => rows(vec![
            ColumnWindow::new(InputId, 0, Some(8)),
            ColumnWindow::new(InputNumber, 8, Some(14)),
            ColumnWindow::new(Description1, 14, None),
        ]),
        DeviceModel::Tesla4000 => ModelLayout {
            orientation: Orientation::Transposed,
            columns: Vec::new(),
        },
        // Generic rows are read in segment order, the windows only decide
        // whether an id-less line continues the previous row.
        DeviceModel::Unknown => rows(vec![
            ColumnWindow::new(InputId, 0, Some(6)),
            ColumnWindow::new(Description1, 6, None),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_segments_columns() {
        let segs = split_segments("  BI_01   1     Breaker Open");
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0], Segment { column: 2, text: "BI_01" });
        assert_eq!(segs[1], Segment { column: 10, text: "1" });
        assert_eq!(segs[2], Segment { column: 16, text: "Breaker Open" });
    }

    #[test]
    fn test_split_segments_counts_chars_not_bytes() {
        let segs = split_segments("Posición  Cerrado");
        assert_eq!(segs[1].column, 10);
        assert_eq!(segs[0].end(), 8);
    }

    #[test]
    fn test_split_segments_trailing_space() {
        let segs = split_segments("BI_01 ");
        assert_eq!(segs, vec![Segment { column: 0, text: "BI_01" }]);
    }

    #[test]
    fn test_split_first_token() {
        let seg = Segment {
            column: 4,
            text: "BI_01 1",
        };
        let (head, rest) = seg.split_first_token();
        assert_eq!(head.text, "BI_01");
        assert_eq!(rest, Some(Segment { column: 10, text: "1" }));
    }

    #[test]
    fn test_field_at_exact_and_tolerance() {
        let layout = builtin_layout(DeviceModel::Pcs931s);
        assert_eq!(layout.field_at(9, 2), Some(Field::InputNumber));
        assert_eq!(layout.field_at(14, 2), Some(Field::Description1));
        assert_eq!(layout.field_at(60, 2), Some(Field::Description2));
        // Left of the id, within drift of nothing.
        assert_eq!(layout.field_at(-5, 2), None);
    }

    #[test]
    fn test_split_segments_tabs_are_gaps() {
        let segs = split_segments("BI_01\t1\tBreaker Open");
        assert_eq!(
            segs,
            vec![
                Segment { column: 0, text: "BI_01" },
                Segment { column: 8, text: "1" },
                Segment { column: 16, text: "Breaker Open" },
            ]
        );
        let segs = split_segments("  BI_01 \t  2");
        assert_eq!(segs[0].column, 2);
        assert_eq!(segs[1], Segment { column: 18, text: "2" });
    }

    #[test]
    fn test_cell_field_skips_id_window() {
        let layout = builtin_layout(DeviceModel::Pcs931s);
        assert_eq!(layout.field_at(7, 2), Some(Field::InputId));
        assert_eq!(layout.cell_field_at(7, 2), Some(Field::InputNumber));
        assert_eq!(layout.cell_field_at(3, 2), None);
    }

    #[test]
    fn test_field_at_negative_windows() {
        let layout = builtin_layout(DeviceModel::Pcs9705s);
        assert_eq!(layout.field_at(-6, 2), Some(Field::Board));
        assert_eq!(layout.field_at(-10, 2), Some(Field::Board));
        assert_eq!(layout.field_at(-11, 2), None);
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let layout = ModelLayout {
            orientation: Orientation::Rows,
            columns: vec![ColumnWindow::new(Field::InputId, 8, Some(2))],
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_validate_requires_id_for_rows() {
        let layout = ModelLayout {
            orientation: Orientation::Rows,
            columns: vec![ColumnWindow::new(Field::Description1, 0, None)],
        };
        assert!(layout.validate().is_err());
        for model in DeviceModel::SUPPORTED {
            assert!(builtin_layout(model).validate().is_ok());
        }
    }
}
