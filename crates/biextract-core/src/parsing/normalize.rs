use crate::model::{BinaryInputRecord, HeaderContext, RawRow};

/// Build the full description from the two description lines.
///
/// 1. Both empty: empty
/// 2. One empty: the other one
/// 3. Otherwise: `line1`, `separator`, `line2`
pub fn join_description(line1: &str, line2: &str, separator: &str) -> String {
    match (line1.is_empty(), line2.is_empty()) {
        (true, true) => String::new(),
        (false, true) => line1.to_string(),
        (true, false) => line2.to_string(),
        (false, false) => format!("{line1}{separator}{line2}"),
    }
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append a wrapped continuation to a row's second description line.
///
/// An empty line 2 simply takes the text; an occupied one gets the wrap
/// marker in between so the break stays visible.
pub fn append_continuation(row: &mut RawRow, text: &str, wrap_separator: &str) {
    let text = collapse_whitespace(text);
    if text.is_empty() {
        return;
    }
    if row.description_line2.is_empty() {
        row.description_line2 = text;
    } else {
        row.description_line2.push_str(wrap_separator);
        row.description_line2.push_str(&text);
    }
}

/// Turn a parsed row into an output record, stamping it with the header
/// snapshot taken when the row was read.
///
/// Returns `Err` with the rejection reason when the row has no input id or
/// no input number.
pub fn normalize_row(
    context: &HeaderContext,
    row: RawRow,
    page: usize,
    separator: &str,
) -> Result<BinaryInputRecord, String> {
    let input_id = row.input_id.trim().to_string();
    if input_id.is_empty() {
        return Err("missing input id".into());
    }
    let input_number = match row.input_number {
        Some(n) if !n.is_empty() => n,
        _ => return Err(format!("{input_id} has no input number")),
    };

    let line1 = row.description_line1.trim().to_string();
    let line2 = row.description_line2.trim().to_string();
    let full_description = join_description(&line1, &line2, separator);

    // A per-row board column is more specific than the last board label.
    let board_slot = row
        .board
        .filter(|b| !b.trim().is_empty())
        .unwrap_or_else(|| context.board_slot.clone());

    Ok(BinaryInputRecord {
        substation: context.substation.clone(),
        bay: context.bay.clone(),
        voltage: context.voltage.clone(),
        switchgear: context.switchgear.clone(),
        device: context.device.clone(),
        model: context.model,
        function: context.function.clone(),
        board_slot,
        input_id,
        input_number,
        description_line1: line1,
        description_line2: line2,
        full_description,
        page,
        needs_review: !context.model.is_known(),
    })
}
