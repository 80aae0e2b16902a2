//! Recognisers for the non-data lines found around binary input tables.

use super::layout::split_segments;
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseKind {
    PageFooter,
    RevisionStamp,
    Legend,
    FrameGrid,
}

static NOISE: LazyLock<Vec<(NoiseKind, Regex)>> = LazyLock::new(|| {
    let rx = |p: &str| Regex::new(p).unwrap();
    vec![
        (
            NoiseKind::PageFooter,
            rx(r"(?i)^(page|p[aá]g\.?|p[aá]gina|hoja|sheet)\s*:?\s*\d+(\s*(of|de|/)\s*\d+)?$"),
        ),
        (NoiseKind::PageFooter, rx(r"^\d+\s*/\s*\d+$")),
        (
            NoiseKind::RevisionStamp,
            rx(r"(?i)^(rev\.?|revisi[oó]n|revision)\s*:?\s*[A-Z0-9]{1,3}\b"),
        ),
        (
            NoiseKind::RevisionStamp,
            rx(r"(?i)^(dibujado|revisado|aprobado|drawn|checked|approved)\b"),
        ),
        (
            NoiseKind::Legend,
            rx(r"(?i)^(legend|leyenda|notas?|notes?)\s*:"),
        ),
        // Drawing frame references: "A B C D E F G H" or "1 2 3 4 5 6 7 8".
        (NoiseKind::FrameGrid, rx(r"^[A-H](\s+[A-H]){3,}$")),
        (NoiseKind::FrameGrid, rx(r"^\d{1,2}(\s+\d{1,2}){3,}$")),
        (NoiseKind::FrameGrid, rx(r"(?i)^P\.?\s?Met")),
    ]
});

/// Classify a trimmed line as one of the known non-data patterns.
pub fn noise_kind(trimmed: &str) -> Option<NoiseKind> {
    NOISE
        .iter()
        .find(|(_, re)| re.is_match(trimmed))
        .map(|(kind, _)| *kind)
}

/// Detect a table's column-title row ("Input  No.  Description").
///
/// Titles sit in separate cells, so a single run of prose that happens to
/// contain two keywords ("Input board failure") does not count.
pub fn is_column_titles(line: &str) -> bool {
    if split_segments(line).len() < 2 {
        return false;
    }
    let lower = line.to_lowercase();
    let title_keywords = [
        "input",
        "entrada",
        "no.",
        "nº",
        "n°",
        "description",
        "descripción",
        "descripcion",
        "board",
        "tarjeta",
        "terminal",
        "borne",
    ];
    let count = title_keywords
        .iter()
        .filter(|kw| lower.contains(*kw))
        .count();
    count >= 2 && !line.contains("BI_") && !line.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_footers() {
        assert_eq!(noise_kind("Page 1 of 2"), Some(NoiseKind::PageFooter));
        assert_eq!(noise_kind("Hoja 3 de 12"), Some(NoiseKind::PageFooter));
        assert_eq!(noise_kind("Pág. 4"), Some(NoiseKind::PageFooter));
        assert_eq!(noise_kind("3/12"), Some(NoiseKind::PageFooter));
    }

    #[test]
    fn test_stamps_and_legends() {
        assert_eq!(noise_kind("REV: B"), Some(NoiseKind::RevisionStamp));
        assert_eq!(noise_kind("Revisado   J.P."), Some(NoiseKind::RevisionStamp));
        assert_eq!(noise_kind("Leyenda: NA normalmente abierto"), Some(NoiseKind::Legend));
        assert_eq!(noise_kind("A B C D E F G H"), Some(NoiseKind::FrameGrid));
        assert_eq!(noise_kind("1   2   3   4   5   6"), Some(NoiseKind::FrameGrid));
    }

    #[test]
    fn test_data_is_not_noise() {
        assert_eq!(noise_kind("BI_01   1   Breaker Open"), None);
        assert_eq!(noise_kind("Trip Signal"), None);
        assert_eq!(noise_kind("Reverse power alarm"), None);
    }

    #[test]
    fn test_is_column_titles() {
        assert!(is_column_titles("  Input      No.    Description"));
        assert!(is_column_titles("Entrada   Nº   Descripción"));
        assert!(!is_column_titles("  BI_01   1   Input Description"));
        assert!(!is_column_titles("Breaker Open"));
        assert!(!is_column_titles("            Input board failure"));
    }
}
