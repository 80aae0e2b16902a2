use crate::model::InputNumber;
use regex::Regex;
use std::sync::LazyLock;

static BI_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^BI_(\d{1,3})$").unwrap());
static IN_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^IN(\d{3})$").unwrap());
static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3})([A-Za-z]?)$").unwrap());

/// Which input-id spelling a layout uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdShape {
    /// NR Electric / ERL style `BI_01`.
    Bi,
    /// SEL style `IN101` (board digit + two-digit input).
    In,
    /// Either of the above.
    Any,
}

/// How the input number of a row is obtained and what it may look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberShape {
    /// Its own cell, digits only.
    Numeric,
    /// Its own cell, digits with an optional letter suffix (`12A`).
    Ordinal,
    /// No cell; the digits of the input id are the number.
    FromId,
}

/// Parse a token as an input id of the given shape, returning the canonical
/// id (`BI_` ids zero-padded to two digits) and its numeric part.
pub fn parse_input_id(token: &str, shape: IdShape) -> Option<(String, u32)> {
    let token = token.trim();
    if matches!(shape, IdShape::Bi | IdShape::Any) {
        if let Some(caps) = BI_ID.captures(token) {
            let n: u32 = caps[1].parse().ok()?;
            return Some((format!("BI_{n:02}"), n));
        }
    }
    if matches!(shape, IdShape::In | IdShape::Any) {
        if let Some(caps) = IN_ID.captures(token) {
            let n: u32 = caps[1].parse().ok()?;
            return Some((token.to_string(), n));
        }
    }
    None
}

/// Whether the token is any input id at all.
pub fn is_input_id(token: &str) -> bool {
    parse_input_id(token, IdShape::Any).is_some()
}

/// Parse an input-number cell.
///
/// Returns `Ok(None)` for an empty cell (the normalizer rejects the row
/// later) and `Err` when the cell holds something of the wrong shape.
pub fn parse_input_number(cell: &str, shape: NumberShape) -> Result<Option<InputNumber>, String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    match shape {
        NumberShape::Numeric | NumberShape::FromId => cell
            .parse::<u32>()
            .map(|n| Some(InputNumber::Index(n)))
            .map_err(|_| format!("input number '{cell}' is not numeric")),
        NumberShape::Ordinal => {
            let caps = ORDINAL
                .captures(cell)
                .ok_or_else(|| format!("input number '{cell}' is not an ordinal"))?;
            if caps[2].is_empty() {
                let n: u32 = caps[1]
                    .parse()
                    .map_err(|_| format!("input number '{cell}' is out of range"))?;
                Ok(Some(InputNumber::Index(n)))
            } else {
                Ok(Some(InputNumber::Ordinal(cell.to_uppercase())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bi_id_is_zero_padded() {
        assert_eq!(parse_input_id("BI_1", IdShape::Bi), Some(("BI_01".into(), 1)));
        assert_eq!(parse_input_id("BI_12", IdShape::Bi), Some(("BI_12".into(), 12)));
        assert_eq!(parse_input_id("BI_105", IdShape::Any), Some(("BI_105".into(), 105)));
    }

    #[test]
    fn test_in_id_keeps_board_digit() {
        assert_eq!(parse_input_id("IN101", IdShape::In), Some(("IN101".into(), 101)));
        assert_eq!(parse_input_id("IN207", IdShape::Any), Some(("IN207".into(), 207)));
    }

    #[test]
    fn test_id_shape_is_respected() {
        assert!(parse_input_id("IN101", IdShape::Bi).is_none());
        assert!(parse_input_id("BI_01", IdShape::In).is_none());
        assert!(parse_input_id("BI_", IdShape::Any).is_none());
        assert!(parse_input_id("XBI_01", IdShape::Any).is_none());
    }

    #[test]
    fn test_numeric_number() {
        assert_eq!(
            parse_input_number("07", NumberShape::Numeric),
            Ok(Some(InputNumber::Index(7)))
        );
        assert_eq!(parse_input_number("  ", NumberShape::Numeric), Ok(None));
        assert!(parse_input_number("7a", NumberShape::Numeric).is_err());
    }

    #[test]
    fn test_ordinal_number() {
        assert_eq!(
            parse_input_number("12", NumberShape::Ordinal),
            Ok(Some(InputNumber::Index(12)))
        );
        assert_eq!(
            parse_input_number("12a", NumberShape::Ordinal),
            Ok(Some(InputNumber::Ordinal("12A".into())))
        );
        assert!(parse_input_number("Trip", NumberShape::Ordinal).is_err());
    }
}
