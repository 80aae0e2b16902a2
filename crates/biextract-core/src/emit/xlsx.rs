use super::{SheetEmitter, SheetNames};
use crate::error::BiextractError;
use crate::model::{BinaryInputRecord, InputNumber, COLUMNS};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::path::{Path, PathBuf};

/// Most characters Excel keeps in one cell.
const MAX_CELL_CHARS: usize = 32_767;

const HEADER_BLUE: u32 = 0x366092;
const BLOCK_SHADE: u32 = 0xDCE6F1;

/// Column widths in `COLUMNS` order.
const WIDTHS: [f64; 14] = [
    20.0, 15.0, 10.0, 12.0, 8.0, 22.0, 30.0, 10.0, 8.0, 8.0, 45.0, 40.0, 65.0, 6.0,
];

/// Writes documents to one xlsx workbook, saved on `finish`.
pub struct XlsxEmitter {
    path: PathBuf,
    workbook: Workbook,
    names: SheetNames,
    sheets: Vec<String>,
}

impl XlsxEmitter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            workbook: Workbook::new(),
            names: SheetNames::new(),
            sheets: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the sheets emitted so far, in order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheets
    }
}

struct Formats {
    header: Format,
    plain: Format,
    shaded: Format,
}

impl Formats {
    fn new() -> Self {
        let cell = Format::new()
            .set_font_name("Arial")
            .set_font_size(9)
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::Top)
            .set_text_wrap();
        Self {
            header: Format::new()
                .set_bold()
                .set_font_name("Arial")
                .set_font_size(10)
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_BLUE))
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center),
            shaded: cell.clone().set_background_color(Color::RGB(BLOCK_SHADE)),
            plain: cell,
        }
    }
}

impl SheetEmitter for XlsxEmitter {
    fn emit_sheet(
        &mut self,
        name: &str,
        records: &[BinaryInputRecord],
        columns: &[&str],
    ) -> Result<(), BiextractError> {
        let sheet_name = self.names.assign(name);
        let formats = Formats::new();
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name)?;

        for (col, title) in columns.iter().enumerate() {
            let col = col as u16;
            worksheet.write_string_with_format(0, col, *title, &formats.header)?;
            let width = WIDTHS.get(col as usize).copied().unwrap_or(12.0);
            worksheet.set_column_width(col, width)?;
        }
        worksheet.set_freeze_panes(1, 0)?;

        let mut shaded = false;
        let mut block: Option<(&str, &str)> = None;
        for (i, record) in records.iter().enumerate() {
            let key = (record.device.as_str(), record.board_slot.as_str());
            if block.is_some_and(|b| b != key) {
                shaded = !shaded;
            }
            block = Some(key);
            let format = if shaded {
                &formats.shaded
            } else {
                &formats.plain
            };
            write_record(worksheet, i as u32 + 1, record, columns, format)?;
        }

        let last_col = columns.len().saturating_sub(1) as u16;
        worksheet.autofilter(0, 0, records.len() as u32, last_col)?;

        log::info!("sheet '{sheet_name}': {} row(s)", records.len());
        self.sheets.push(sheet_name);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), BiextractError> {
        self.workbook.save(&self.path)?;
        log::info!("saved {}", self.path.display());
        Ok(())
    }

    fn destination(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

fn write_record(
    worksheet: &mut Worksheet,
    row: u32,
    record: &BinaryInputRecord,
    columns: &[&str],
    format: &Format,
) -> Result<(), BiextractError> {
    for (col, title) in columns.iter().enumerate() {
        let col = col as u16;
        match cell_value(record, title) {
            Cell::Number(n) => {
                worksheet.write_number_with_format(row, col, n, format)?;
            }
            Cell::Text(s) => {
                let text = fit_cell(s);
                if text.len() < s.len() {
                    log::warn!(
                        "{} {title} cut to {MAX_CELL_CHARS} characters",
                        record.input_id
                    );
                }
                worksheet.write_string_with_format(row, col, text, format)?;
            }
        }
    }
    Ok(())
}

enum Cell<'a> {
    Text(&'a str),
    Number(f64),
}

fn cell_value<'a>(record: &'a BinaryInputRecord, column: &str) -> Cell<'a> {
    let text = match column {
        "Substation" => record.substation.as_str(),
        "Bay" => record.bay.as_str(),
        "Voltage" => record.voltage.as_str(),
        "Switchgear" => record.switchgear.as_str(),
        "Device" => record.device.as_str(),
        "Model" => record.model.as_str(),
        "Function" => record.function.as_str(),
        "Board/Slot" => record.board_slot.as_str(),
        "Input_ID" => record.input_id.as_str(),
        "Input_Number" => match &record.input_number {
            InputNumber::Index(n) => return Cell::Number(f64::from(*n)),
            InputNumber::Ordinal(s) => s.as_str(),
        },
        "Description_Line1" => record.description_line1.as_str(),
        "Description_Line2" => record.description_line2.as_str(),
        "Full_Description" => record.full_description.as_str(),
        "Page" => return Cell::Number(record.page as f64),
        _ => "",
    };
    Cell::Text(text)
}

fn fit_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

/// Emit with the standard column set.
pub fn emit_standard(
    emitter: &mut dyn SheetEmitter,
    name: &str,
    records: &[BinaryInputRecord],
) -> Result<(), BiextractError> {
    emitter.emit_sheet(name, records, &COLUMNS)
}
