pub mod xlsx;

use crate::error::BiextractError;
use crate::model::BinaryInputRecord;
use std::collections::HashSet;
use std::path::Path;

pub use xlsx::XlsxEmitter;

/// Destination for finished documents: one sheet per document.
///
/// Each record becomes exactly one row with cells in `columns` order; string
/// content is written as-is.
pub trait SheetEmitter {
    fn emit_sheet(
        &mut self,
        name: &str,
        records: &[BinaryInputRecord],
        columns: &[&str],
    ) -> Result<(), BiextractError>;

    /// Commit everything emitted so far.
    fn finish(&mut self) -> Result<(), BiextractError>;

    /// Where `finish` writes to, if it writes a file.
    fn destination(&self) -> Option<&Path> {
        None
    }
}

/// Longest worksheet name Excel accepts.
pub const MAX_SHEET_NAME: usize = 31;

/// Hands out valid, unique worksheet names.
#[derive(Debug, Default)]
pub struct SheetNames {
    taken: HashSet<String>,
}

impl SheetNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitise `raw` into a legal sheet name not yet handed out. Clashes
    /// (compared case-insensitively, as Excel does) get `~2`, `~3`, ...
    pub fn assign(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.taken.contains(&candidate.to_lowercase()) {
            let suffix = format!("~{n}");
            let keep = MAX_SHEET_NAME - suffix.chars().count();
            candidate = format!("{}{suffix}", truncate_chars(&base, keep));
            n += 1;
        }
        self.taken.insert(candidate.to_lowercase());
        candidate
    }
}

/// Replace characters Excel forbids in sheet names and cut to length.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '\\' | '/' | '*' | '?' | ':' | '[' | ']' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim().trim_matches('\'');
    let name = truncate_chars(trimmed, MAX_SHEET_NAME);
    if name.trim().is_empty() {
        "Sheet".to_string()
    } else {
        name
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
