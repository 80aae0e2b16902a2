//! Per-model row parsers.
//!
//! Each supported model prints its binary input table differently. The
//! variants of `RowStrategy` carry the token shapes; the column windows come
//! from the model's `ModelLayout` so they can be tuned from config.

use super::layout::{split_segments, Field, ModelLayout, Orientation, Segment};
use super::table::{is_column_titles, noise_kind, NoiseKind};
use super::values::{parse_input_id, parse_input_number, IdShape, NumberShape};
use crate::model::{DeviceModel, InputNumber, RawRow};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStrategy {
    Pcs931s,
    Sel411l,
    Pcs9705s,
    Udf506,
    Pcs915sd,
    Tesla4000,
    /// Best effort for documents whose model was never identified.
    Generic,
}

impl RowStrategy {
    pub fn for_model(model: DeviceModel) -> Self {
        match model {
            DeviceModel::Pcs931s => RowStrategy::Pcs931s,
            DeviceModel::Sel411l => RowStrategy::Sel411l,
            DeviceModel::Pcs9705s => RowStrategy::Pcs9705s,
            DeviceModel::Udf506 => RowStrategy::Udf506,
            DeviceModel::Pcs915sd => RowStrategy::Pcs915sd,
            DeviceModel::Tesla4000 => RowStrategy::Tesla4000,
            DeviceModel::Unknown => RowStrategy::Generic,
        }
    }

    pub fn id_shape(self) -> IdShape {
        match self {
            RowStrategy::Sel411l => IdShape::In,
            RowStrategy::Generic => IdShape::Any,
            _ => IdShape::Bi,
        }
    }

    pub fn number_shape(self) -> NumberShape {
        match self {
            RowStrategy::Pcs931s | RowStrategy::Pcs9705s | RowStrategy::Udf506 => {
                NumberShape::Numeric
            }
            RowStrategy::Pcs915sd => NumberShape::Ordinal,
            RowStrategy::Sel411l | RowStrategy::Tesla4000 | RowStrategy::Generic => {
                NumberShape::FromId
            }
        }
    }
}

/// An input id on a transposed id line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandId {
    pub input_id: String,
    pub number: u32,
    pub column: usize,
    pub end: usize,
}

impl BandId {
    fn center(&self) -> usize {
        (self.column + self.end) / 2
    }
}

/// What one physical line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// A data row. `anchor` is the character column of its input id.
    Row { row: RawRow, anchor: usize },
    /// A line of side-by-side ids in a transposed table.
    IdBand(Vec<BandId>),
    /// Wrapped description text belonging to the pending row.
    Continuation(String),
    ColumnTitles,
    Noise(NoiseKind),
    /// The line has an input id but the rest does not fit the layout.
    Malformed(String),
    /// Anything else: header prose, title blocks, band descriptions.
    Text,
}

/// Classify one line for the given strategy.
///
/// `pending_anchor` is the id column of the row a wrapped line would extend,
/// if any.
pub fn classify_line(
    strategy: RowStrategy,
    layout: &ModelLayout,
    tolerance: usize,
    line: &str,
    pending_anchor: Option<usize>,
) -> LineClass {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineClass::Text;
    }
    if let Some(kind) = noise_kind(trimmed) {
        return LineClass::Noise(kind);
    }
    if is_column_titles(line) {
        return LineClass::ColumnTitles;
    }

    let segments = split_segments(line);
    if layout.orientation == Orientation::Transposed {
        let ids = band_ids(&segments, strategy.id_shape());
        return if ids.is_empty() {
            LineClass::Text
        } else {
            LineClass::IdBand(ids)
        };
    }

    let tol = tolerance as i32;
    let Some((idx, id_seg, rest)) = find_id(&segments, strategy.id_shape()) else {
        return match pending_anchor {
            Some(anchor)
                if layout.is_description_offset(segments[0].column as i32 - anchor as i32, tol) =>
            {
                LineClass::Continuation(join_cells(segments.iter().map(|s| s.text)))
            }
            _ => LineClass::Text,
        };
    };

    let anchor = id_seg.column;
    let Some((input_id, id_number)) = parse_input_id(id_seg.text, strategy.id_shape()) else {
        return LineClass::Text;
    };

    let left = &segments[..idx];
    let mut right: VecDeque<Segment<'_>> = rest.into_iter().collect();
    right.extend(segments[idx + 1..].iter().copied());

    let parsed = if strategy == RowStrategy::Generic {
        Ok(generic_row(input_id, id_number, right))
    } else {
        layout_row(strategy, layout, tol, anchor, input_id, id_number, left, right)
    };
    match parsed {
        Ok(row) => LineClass::Row { row, anchor },
        Err(reason) => LineClass::Malformed(reason),
    }
}

/// First segment whose leading token is an input id, with any text glued to
/// it by a single space split off.
fn find_id<'a>(
    segments: &[Segment<'a>],
    shape: IdShape,
) -> Option<(usize, Segment<'a>, Option<Segment<'a>>)> {
    segments.iter().enumerate().find_map(|(i, seg)| {
        let (head, rest) = seg.split_first_token();
        parse_input_id(head.text, shape).map(|_| (i, head, rest))
    })
}

fn band_ids(segments: &[Segment<'_>], shape: IdShape) -> Vec<BandId> {
    let mut ids = Vec::new();
    for seg in segments {
        let mut current = Some(*seg);
        while let Some(s) = current {
            let (head, rest) = s.split_first_token();
            if let Some((input_id, number)) = parse_input_id(head.text, shape) {
                ids.push(BandId {
                    input_id,
                    number,
                    column: head.column,
                    end: head.end(),
                });
            }
            current = rest;
        }
    }
    ids
}

#[derive(Default)]
struct Cells {
    board: Vec<String>,
    number: Vec<String>,
    line1: Vec<String>,
    line2: Vec<String>,
    description: Vec<String>,
}

#[allow(clippy::too_many_arguments)]
fn layout_row(
    strategy: RowStrategy,
    layout: &ModelLayout,
    tol: i32,
    anchor: usize,
    input_id: String,
    id_number: u32,
    left: &[Segment<'_>],
    mut right: VecDeque<Segment<'_>>,
) -> Result<RawRow, String> {
    let mut cells = Cells::default();

    for seg in left {
        let offset = seg.column as i32 - anchor as i32;
        match layout.cell_field_at(offset, tol) {
            Some(Field::Board) => cells.board.push(seg.text.to_string()),
            Some(Field::InputNumber) => cells.number.push(seg.text.to_string()),
            _ => log::debug!("ignoring '{}' left of {input_id}", seg.text),
        }
    }

    while let Some(seg) = right.pop_front() {
        let offset = seg.column as i32 - anchor as i32;
        match layout.cell_field_at(offset, tol) {
            Some(Field::InputNumber) if cells.number.is_empty() => {
                // "1 Breaker Open": number and description one space apart.
                let (head, rest) = seg.split_first_token();
                cells.number.push(head.text.to_string());
                if let Some(rest) = rest {
                    right.push_front(rest);
                }
            }
            Some(Field::Board) => cells.board.push(seg.text.to_string()),
            Some(Field::Description2) => cells.line2.push(seg.text.to_string()),
            Some(Field::Description) => cells.description.push(seg.text.to_string()),
            _ => cells.line1.push(seg.text.to_string()),
        }
    }

    let input_number = match strategy.number_shape() {
        NumberShape::FromId => Some(InputNumber::Index(id_number)),
        shape => parse_input_number(&join_cells(cells.number.iter()), shape)
            .map_err(|e| format!("{input_id}: {e}"))?,
    };

    let (mut line1, mut line2) = (join_cells(cells.line1.iter()), join_cells(cells.line2.iter()));
    if !cells.description.is_empty() {
        let description = join_cells(cells.description.iter());
        let (first, second) = split_description(&description);
        line1 = join_cells([line1.as_str(), first].into_iter());
        line2 = join_cells([second, line2.as_str()].into_iter());
    }

    let board = join_cells(cells.board.iter());
    Ok(RawRow {
        input_id,
        input_number,
        description_line1: line1,
        description_line2: line2,
        board: (!board.is_empty()).then_some(board),
    })
}

/// Rows of an unidentified layout: the cells right of the id, in order.
fn generic_row(input_id: String, id_number: u32, mut right: VecDeque<Segment<'_>>) -> RawRow {
    let mut input_number = InputNumber::Index(id_number);
    if let Some(first) = right.front().copied() {
        let (head, rest) = first.split_first_token();
        if let Ok(Some(n)) = parse_input_number(head.text, NumberShape::Ordinal) {
            input_number = n;
            right.pop_front();
            if let Some(rest) = rest {
                right.push_front(rest);
            }
        }
    }

    let line1 = right.pop_front().map(|s| collapse(s.text)).unwrap_or_default();
    let line2 = join_cells(right.iter().map(|s| s.text));
    RawRow {
        input_id,
        input_number: Some(input_number),
        description_line1: line1,
        description_line2: line2,
        board: None,
    }
}

/// Turn a transposed table's id line and the description lines stacked
/// above it into one row per id.
///
/// Each id owns the columns between the midpoints to its neighbours, widened
/// by `tolerance`; band text goes to the nearest id whose span holds its
/// centre. The first band line that reaches an id is its line 1, the rest
/// are joined into line 2.
pub fn assemble_band(ids: &[BandId], band: &[String], tolerance: usize) -> Vec<RawRow> {
    let centers: Vec<i64> = ids.iter().map(|id| id.center() as i64).collect();
    let spans: Vec<(i64, i64)> = (0..ids.len())
        .map(|i| {
            let lo = if i == 0 {
                i64::MIN
            } else {
                (centers[i - 1] + centers[i]) / 2 - tolerance as i64
            };
            let hi = if i + 1 == ids.len() {
                i64::MAX
            } else {
                (centers[i] + centers[i + 1]) / 2 + tolerance as i64
            };
            (lo, hi)
        })
        .collect();

    let mut texts: Vec<Vec<String>> = vec![Vec::new(); ids.len()];
    for line in band {
        let mut per_id: Vec<Vec<&str>> = vec![Vec::new(); ids.len()];
        for seg in split_segments(line) {
            let c = seg.center() as i64;
            let owner = spans
                .iter()
                .enumerate()
                .filter(|(_, (lo, hi))| c >= *lo && c <= *hi)
                .min_by_key(|(i, _)| (centers[*i] - c).abs())
                .map(|(i, _)| i);
            match owner {
                Some(i) => per_id[i].push(seg.text),
                None => log::debug!("band text '{}' matches no input column", seg.text),
            }
        }
        for (i, cells) in per_id.into_iter().enumerate() {
            if !cells.is_empty() {
                texts[i].push(join_cells(cells.into_iter()));
            }
        }
    }

    ids.iter()
        .zip(texts)
        .map(|(id, lines)| {
            let mut lines = lines.into_iter();
            let line1 = lines.next().unwrap_or_default();
            let line2 = join_cells(lines);
            RawRow {
                input_id: id.input_id.clone(),
                input_number: Some(InputNumber::Index(id.number)),
                description_line1: line1,
                description_line2: line2,
                board: None,
            }
        })
        .collect()
}

/// Split a single description cell written as `line1 - line2`.
fn split_description(description: &str) -> (&str, &str) {
    match description.split_once(" - ") {
        Some((first, second)) => (first.trim(), second.trim()),
        None => (description.trim(), ""),
    }
}

fn join_cells<I, S>(cells: I) -> String
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<String> = cells
        .map(|c| collapse(c.as_ref()))
        .filter(|c| !c.is_empty())
        .collect();
    parts.join(" ")
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
