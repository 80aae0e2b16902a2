//! Header context tracking.
//!
//! Header fields are sparse: a drawing states the substation or the device
//! once and every table row after it inherits the value until the drawing
//! states a new one. `HeaderTracker` holds that state for one document.

use super::layout::split_segments;
use super::values::is_input_id;
use crate::model::{DeviceModel, HeaderContext};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// How sure the tracker is about a field value. A value is only replaced
/// by an observation of at least the same confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    /// Inferred from a recurring shape (`L-2201`, `220 kV`).
    Pattern,
    /// Stated explicitly (`Bay: L-2201`, a device title, a model token).
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    Substation,
    Bay,
    Voltage,
    Switchgear,
    Device,
    Model,
    Function,
    BoardSlot,
}

impl HeaderField {
    const ALL: [HeaderField; 8] = [
        HeaderField::Substation,
        HeaderField::Bay,
        HeaderField::Voltage,
        HeaderField::Switchgear,
        HeaderField::Device,
        HeaderField::Model,
        HeaderField::Function,
        HeaderField::BoardSlot,
    ];

    fn index(self) -> usize {
        HeaderField::ALL
            .iter()
            .position(|f| *f == self)
            .unwrap_or_default()
    }
}

/// Outcome of feeding one line to the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderUpdate {
    /// The line carried header information, even if nothing changed.
    pub recognised: bool,
    pub changed: Vec<HeaderField>,
}

impl HeaderUpdate {
    pub fn is_header_line(&self) -> bool {
        self.recognised || !self.changed.is_empty()
    }

    pub fn changed(&self, field: HeaderField) -> bool {
        self.changed.contains(&field)
    }

    fn merge(&mut self, other: HeaderUpdate) {
        self.recognised |= other.recognised;
        for f in other.changed {
            if !self.changed.contains(&f) {
                self.changed.push(f);
            }
        }
    }
}

static LABELS: LazyLock<Vec<(HeaderField, Regex)>> = LazyLock::new(|| {
    let label = |words: &str| Regex::new(&format!(r"(?i)^(?:{words})\s*:\s*(.*)$")).unwrap();
    vec![
        (HeaderField::Substation, label(r"substation|subestaci[oó]n")),
        (HeaderField::Bay, label(r"bay|bah[ií]a")),
        (HeaderField::Voltage, label(r"voltage|tensi[oó]n|nivel de tensi[oó]n")),
        (HeaderField::Switchgear, label(r"switchgear|tablero|celda")),
        (HeaderField::Device, label(r"device tag|device|equipo|s[ií]mbolo")),
        (HeaderField::Model, label(r"device model|model|modelo")),
        (HeaderField::Function, label(r"function|funci[oó]n")),
        (HeaderField::BoardSlot, label(r"board/slot|board|slot|tarjeta|ranura")),
    ]
});

static MODEL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(PCS[-\s]?931S|SEL[-\s]?411L|PCS[-\s]?9705S|UDF[-\s]?506|PCS[-\s]?915SD|TESLA[-\s]?4000)\b",
    )
    .unwrap()
});

static DEVICE_WITH_MODEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-[A-Z]\d+\w*)\s*\(([^)]+)\)(?:\s*:\s*([^-\n]+?)\s*(?:-|$))?").unwrap()
});

static DEVICE_TITLE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)(?:entradas|salidas)\s+binarias\s+de\s+(-[A-Z]\d+\w*)").unwrap(),
        Regex::new(r"(?i)binary\s+(?:inputs|outputs)\s+(?:of|for)\s+(-[A-Z]\d+\w*)").unwrap(),
    ]
});

static SUBSTATION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^S\.\s?E\.\s*").unwrap());
static TRAILING_VOLTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+([\d.,]+(?:/[\d.,]+)*)\s*kV\s*$").unwrap());
static VOLTAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}(?:[.,]\d+)?)(?:\s*/\s*\d{1,3}(?:[.,]\d+)?)*\s*kV\b").unwrap()
});
static SUBSTATION_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:T[IÍ]TULO|AMPLIACI[OÓ]N)\s*:?\s*(?:S\.E\.\s+)?([A-ZÁÉÍÓÚÑ][A-ZÁÉÍÓÚÑ ]+?)\s+\d")
        .unwrap()
});
static BAY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\b(L-[A-Z0-9][A-Z0-9-]*)\b").unwrap(),
        Regex::new(r"(?i:BAH[IÍ]A)\s+([A-ZÁÉÍÓÚÑ][A-ZÁÉÍÓÚÑ0-9 ]*[A-ZÁÉÍÓÚÑ0-9])").unwrap(),
        Regex::new(r"\b(TR-\d+)\b").unwrap(),
    ]
});
static SWITCHGEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=?\b(F\.Q\d+\.CP\d+)\b").unwrap());
static BOARD_ALONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(B\d{2}|P\d{1,2})$").unwrap());

/// Tracks header context for one document.
#[derive(Debug, Clone, Default)]
pub struct HeaderTracker {
    context: HeaderContext,
    confidence: [Option<Confidence>; 8],
    catalog: DeviceCatalog,
}

/// An input id among the first two tokens marks a data row.
fn leads_with_input_id(line: &str) -> bool {
    line.split_whitespace().take(2).any(is_input_id)
}

impl HeaderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &HeaderContext {
        &self.context
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    /// Feed a bill-of-materials line into the device catalog.
    pub fn observe_catalog_line(&mut self, line: &str) -> bool {
        self.catalog.observe_line(line)
    }

    /// Apply explicit header statements: `Label: value` cells, device
    /// titles and model tokens.
    ///
    /// Data rows are never header lines: a line with an input id among its
    /// first two tokens (a board or number column may precede the id) is left
    /// alone, whatever its description says.
    pub fn observe_explicit(&mut self, line: &str) -> HeaderUpdate {
        if leads_with_input_id(line) {
            return HeaderUpdate::default();
        }
        let mut update = self.observe_labels(line);

        if let Some(caps) = DEVICE_WITH_MODEL.captures(line) {
            if let Some(model) = DeviceModel::from_token(&caps[2]) {
                update.recognised = true;
                self.set_device(&caps[1], &mut update);
                self.set_model(model, &mut update);
                if let Some(function) = caps.get(3) {
                    let function = collapse(function.as_str());
                    self.set(HeaderField::Function, &function, Confidence::Label, &mut update);
                }
                return update;
            }
        }

        for re in DEVICE_TITLE.iter() {
            if let Some(caps) = re.captures(line) {
                update.recognised = true;
                self.set_device(&caps[1], &mut update);
                return update;
            }
        }

        let trimmed = line.trim();
        if let Some(m) = MODEL_TOKEN.find(trimmed) {
            if m.start() == 0 {
                if let Some(model) = DeviceModel::from_token(m.as_str()) {
                    update.recognised = true;
                    self.set_model(model, &mut update);
                }
            }
        }

        update
    }

    /// Apply lower-confidence shape matches. Only called for lines that are
    /// neither table rows nor wrapped descriptions.
    pub fn observe_patterns(&mut self, line: &str) -> HeaderUpdate {
        let mut update = HeaderUpdate::default();
        if leads_with_input_id(line) {
            return update;
        }
        let trimmed = line.trim();

        if let Some(caps) = SUBSTATION_TITLE.captures(trimmed) {
            let name = collapse(&caps[1]);
            self.set(HeaderField::Substation, &name, Confidence::Pattern, &mut update);
            update.recognised = true;
        }
        if let Some(caps) = VOLTAGE.captures(trimmed) {
            let voltage = format!("{} kV", &caps[1]);
            self.set(HeaderField::Voltage, &voltage, Confidence::Pattern, &mut update);
            update.recognised = true;
        }
        if let Some(caps) = BAY_PATTERNS.iter().find_map(|re| re.captures(trimmed)) {
            let bay = collapse(&caps[1]);
            self.set(HeaderField::Bay, &bay, Confidence::Pattern, &mut update);
            update.recognised = true;
        }
        if let Some(caps) = SWITCHGEAR.captures(trimmed) {
            self.set(HeaderField::Switchgear, &caps[1], Confidence::Pattern, &mut update);
            update.recognised = true;
        }
        if let Some(caps) = BOARD_ALONE.captures(trimmed) {
            self.set(HeaderField::BoardSlot, &caps[1], Confidence::Pattern, &mut update);
            update.recognised = true;
        }

        update
    }

    /// Record a board printed in a row's own board column.
    pub fn observe_board(&mut self, board: &str) -> HeaderUpdate {
        let mut update = HeaderUpdate::default();
        self.set(HeaderField::BoardSlot, board.trim(), Confidence::Label, &mut update);
        update
    }

    fn observe_labels(&mut self, line: &str) -> HeaderUpdate {
        let mut update = HeaderUpdate::default();
        let cells = split_segments(line);
        let mut i = 0;

        while i < cells.len() {
            let cell = cells[i].text;
            i += 1;
            let Some((field, caps)) = LABELS
                .iter()
                .find_map(|(field, re)| re.captures(cell).map(|c| (*field, c)))
            else {
                continue;
            };
            update.recognised = true;

            let mut value = caps[1].trim().to_string();
            // "Bay:   L-2201" puts the value in the next cell.
            if value.is_empty() && i < cells.len() && !is_label(cells[i].text) {
                value = cells[i].text.trim().to_string();
                i += 1;
            }
            if value.is_empty() {
                continue;
            }
            self.apply_label(field, &value, &mut update);
        }

        update
    }

    fn apply_label(&mut self, field: HeaderField, value: &str, update: &mut HeaderUpdate) {
        match field {
            HeaderField::Substation => {
                let mut name = SUBSTATION_PREFIX.replace(value, "").to_string();
                if let Some(caps) = TRAILING_VOLTAGE.captures(&name) {
                    let first = caps[1].split('/').next().unwrap_or_default().to_string();
                    let voltage = format!("{first} kV");
                    let start = caps.get(0).map_or(name.len(), |m| m.start());
                    name.truncate(start);
                    self.set(HeaderField::Voltage, &voltage, Confidence::Pattern, update);
                }
                self.set(HeaderField::Substation, &collapse(&name), Confidence::Label, update);
            }
            HeaderField::Voltage => {
                let voltage = VOLTAGE
                    .captures(value)
                    .map(|caps| format!("{} kV", &caps[1]))
                    .unwrap_or_else(|| collapse(value));
                self.set(HeaderField::Voltage, &voltage, Confidence::Label, update);
            }
            HeaderField::Switchgear => {
                let sw = value.trim_start_matches('=');
                self.set(HeaderField::Switchgear, &collapse(sw), Confidence::Label, update);
            }
            HeaderField::Device => self.set_device(value, update),
            HeaderField::Model => {
                match MODEL_TOKEN
                    .find(value)
                    .and_then(|m| DeviceModel::from_token(m.as_str()))
                {
                    Some(model) => self.set_model(model, update),
                    None => log::debug!("ignoring unsupported model '{value}'"),
                }
            }
            HeaderField::Function | HeaderField::Bay | HeaderField::BoardSlot => {
                self.set(field, &collapse(value), Confidence::Label, update);
            }
        }
    }

    fn set_device(&mut self, tag: &str, update: &mut HeaderUpdate) {
        let tag = tag.trim();
        self.set(HeaderField::Device, tag, Confidence::Label, update);
        if let Some(entry) = self.catalog.lookup(tag).cloned() {
            self.set_model(entry.model, update);
            self.set(HeaderField::Function, &entry.function, Confidence::Label, update);
        }
    }

    fn set_model(&mut self, model: DeviceModel, update: &mut HeaderUpdate) {
        let idx = HeaderField::Model.index();
        self.confidence[idx] = Some(Confidence::Label);
        if self.context.model != model {
            self.context.model = model;
            update.changed.push(HeaderField::Model);
        }
    }

    fn set(
        &mut self,
        field: HeaderField,
        value: &str,
        confidence: Confidence,
        update: &mut HeaderUpdate,
    ) {
        if value.is_empty() {
            return;
        }
        let idx = field.index();
        if let Some(held) = self.confidence[idx] {
            if confidence < held {
                log::debug!("keeping {field:?}, not overriding with pattern guess '{value}'");
                return;
            }
        }
        self.confidence[idx] = Some(confidence);

        let slot = match field {
            HeaderField::Substation => &mut self.context.substation,
            HeaderField::Bay => &mut self.context.bay,
            HeaderField::Voltage => &mut self.context.voltage,
            HeaderField::Switchgear => &mut self.context.switchgear,
            HeaderField::Device => &mut self.context.device,
            HeaderField::Function => &mut self.context.function,
            HeaderField::BoardSlot => &mut self.context.board_slot,
            HeaderField::Model => return,
        };
        if *slot != value {
            *slot = value.to_string();
            let mut changed = HeaderUpdate::default();
            changed.changed.push(field);
            update.merge(changed);
        }
    }
}

fn is_label(cell: &str) -> bool {
    LABELS.iter().any(|(_, re)| re.is_match(cell))
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Device tags listed in a drawing's bill of materials, with the model and
/// function stated next to them.
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub model: DeviceModel,
    pub function: String,
}

static CATALOG_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-[A-Z]\d+\w*(?:\s*;\s*-[A-Z]\d+\w*)*)").unwrap());

/// Function keywords as they appear in material lists, and the function name
/// reported for them.
const FUNCTION_KEYWORDS: [(&str, &str); 9] = [
    ("UNIDAD DE CONTROL", "Unidad de Control de Bahía"),
    ("CONTROLADOR", "Controlador de Bahía"),
    ("RELÉ DIFERENCIAL", "Relé Diferencial de Línea"),
    ("RELÉ DE BARRA", "Relé de Barra"),
    ("GRABADOR", "Grabador de Fallas"),
    ("REGISTRADOR", "Registrador de Fallas"),
    ("MEDIDOR", "Medidor Multifunción"),
    ("MÓDULO DE CORRIENTES", "Grabador de Fallas (Corrientes)"),
    ("MÓDULO DE VOLTAJES", "Grabador de Fallas (Voltajes)"),
];

impl DeviceCatalog {
    /// Whether a page is a bill of materials worth reading.
    pub fn is_catalog_page(page_text: &str) -> bool {
        let lower = page_text.to_lowercase();
        (lower.contains("lista de materiales") || lower.contains("bill of materials"))
            && !lower.contains("accesorios")
            && !lower.contains("accessories")
    }

    /// Read one material-list line (`-F01;-F02  RELÉ DIFERENCIAL  PCS-931S`).
    pub fn observe_line(&mut self, line: &str) -> bool {
        let upper = line.to_uppercase();
        if upper.contains("SÍMBOLO") || upper.contains("SYMBOL") || upper.contains("DESCRIPCIÓN")
        {
            return false;
        }
        let (Some(tags), Some(model_match)) = (CATALOG_TAGS.find(line), MODEL_TOKEN.find(line))
        else {
            return false;
        };
        let Some(model) = DeviceModel::from_token(model_match.as_str()) else {
            return false;
        };

        let between = if tags.end() <= model_match.start() {
            collapse(&line[tags.end()..model_match.start()])
        } else {
            String::new()
        };
        let function = normalize_function(&between);

        for tag in tags.as_str().split(';') {
            let tag = tag.trim();
            if !tag.is_empty() {
                self.entries.insert(
                    tag.to_string(),
                    CatalogEntry {
                        model,
                        function: function.clone(),
                    },
                );
            }
        }
        true
    }

    pub fn lookup(&self, tag: &str) -> Option<&CatalogEntry> {
        self.entries.get(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_function(text: &str) -> String {
    let upper = text.to_uppercase();
    FUNCTION_KEYWORDS
        .iter()
        .find(|(kw, _)| upper.contains(kw))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_set_fields() {
        let mut t = HeaderTracker::new();
        let u = t.observe_explicit("Substation: ALFA");
        assert!(u.changed(HeaderField::Substation));
        t.observe_explicit("Model: PCS-931S");
        t.observe_explicit("Bay: L-2201     Voltage: 220 kV");
        let ctx = t.context();
        assert_eq!(ctx.substation, "ALFA");
        assert_eq!(ctx.model, DeviceModel::Pcs931s);
        assert_eq!(ctx.bay, "L-2201");
        assert_eq!(ctx.voltage, "220 kV");
    }

    #[test]
    fn test_spanish_substation_label_strips_prefix_and_voltage() {
        let mut t = HeaderTracker::new();
        t.observe_explicit("SUBESTACIÓN: S.E. SAN JUAN 220/60 kV");
        assert_eq!(t.context().substation, "SAN JUAN");
        assert_eq!(t.context().voltage, "220 kV");
    }

    #[test]
    fn test_label_value_in_next_cell() {
        let mut t = HeaderTracker::new();
        t.observe_explicit("Switchgear:     =F.Q01.CP02");
        assert_eq!(t.context().switchgear, "F.Q01.CP02");
    }

    #[test]
    fn test_device_title_with_model_and_function() {
        let mut t = HeaderTracker::new();
        let u = t.observe_explicit("-F01 (PCS-931S): Protección Primaria PP/1 - Entradas Binarias");
        assert!(u.is_header_line());
        let ctx = t.context();
        assert_eq!(ctx.device, "-F01");
        assert_eq!(ctx.model, DeviceModel::Pcs931s);
        assert_eq!(ctx.function, "Protección Primaria PP/1");
    }

    #[test]
    fn test_model_token_at_line_start() {
        let mut t = HeaderTracker::new();
        let u = t.observe_explicit("SEL-411L   Schweitzer Engineering Laboratories");
        assert!(u.changed(HeaderField::Model));
        assert_eq!(t.context().model, DeviceModel::Sel411l);
    }

    #[test]
    fn test_model_token_inside_data_row_is_ignored() {
        let mut t = HeaderTracker::new();
        t.observe_explicit("Model: PCS-931S");
        let u = t.observe_explicit("BI_04   4   Trip from -F02 (SEL-411L)");
        assert!(!u.is_header_line());
        assert_eq!(t.context().model, DeviceModel::Pcs931s);
    }

    #[test]
    fn test_label_inside_data_row_is_ignored() {
        let mut t = HeaderTracker::new();
        t.observe_explicit("Tablero: =F.Q01.CP01");
        for line in [
            "BI_02   2     Tablero: falla alimentación",
            "B07     BI_03   3     Equipo: -F09",
            "  12    BI_12   Modelo: SEL-411L",
        ] {
            let u = t.observe_explicit(line);
            assert!(!u.is_header_line(), "{line}");
        }
        assert!(!t.observe_patterns("BI_05   Falla 220 kV L-2202").is_header_line());
        assert_eq!(t.context().bay, "");
        assert_eq!(t.context().switchgear, "F.Q01.CP01");
        assert_eq!(t.context().device, "");
        assert_eq!(t.context().model, DeviceModel::Unknown);
    }

    #[test]
    fn test_unsupported_model_label_does_not_mutate() {
        let mut t = HeaderTracker::new();
        t.observe_explicit("Model: PCS-931S");
        let u = t.observe_explicit("Model: PCS-978");
        assert!(u.recognised);
        assert!(u.changed.is_empty());
        assert_eq!(t.context().model, DeviceModel::Pcs931s);
    }

    #[test]
    fn test_pattern_does_not_override_label() {
        let mut t = HeaderTracker::new();
        t.observe_explicit("Bay: L-2201");
        let u = t.observe_patterns("Ver plano de TR-1");
        assert!(!u.changed(HeaderField::Bay));
        assert_eq!(t.context().bay, "L-2201");
    }

    #[test]
    fn test_pattern_fills_empty_fields_and_label_overrides_pattern() {
        let mut t = HeaderTracker::new();
        t.observe_patterns("TABLERO DE CONTROL Y PROTECCIÓN L-2201 =F.Q01.CP01 220 kV");
        assert_eq!(t.context().bay, "L-2201");
        assert_eq!(t.context().switchgear, "F.Q01.CP01");
        assert_eq!(t.context().voltage, "220 kV");
        t.observe_explicit("Bay: L-2202");
        assert_eq!(t.context().bay, "L-2202");
    }

    #[test]
    fn test_board_sources() {
        let mut t = HeaderTracker::new();
        t.observe_explicit("SLOT:B07");
        assert_eq!(t.context().board_slot, "B07");
        t.observe_patterns("  B09  ");
        assert_eq!(t.context().board_slot, "B07");
        t.observe_board("B09");
        assert_eq!(t.context().board_slot, "B09");
    }

    #[test]
    fn test_catalog_resolves_device_title() {
        let mut t = HeaderTracker::new();
        assert!(t.observe_catalog_line("  -C01;-C02   CONTROLADOR DE BAHÍA   PCS-9705S   NR"));
        assert!(!t.observe_catalog_line("  SÍMBOLO   DESCRIPCIÓN   MODELO"));
        t.observe_explicit("Circuito de Entradas Binarias de -C02");
        let ctx = t.context();
        assert_eq!(ctx.device, "-C02");
        assert_eq!(ctx.model, DeviceModel::Pcs9705s);
        assert_eq!(ctx.function, "Controlador de Bahía");
    }

    #[test]
    fn test_catalog_page_detection() {
        assert!(DeviceCatalog::is_catalog_page("LISTA DE MATERIALES\n-F01 ..."));
        assert!(!DeviceCatalog::is_catalog_page(
            "Lista de Materiales - Accesorios"
        ));
        assert!(!DeviceCatalog::is_catalog_page("BI_01  1  Breaker"));
    }
}
