use super::layout::split_segments;
use super::values::{parse_input_id, IdShape};
use crate::model::DeviceModel;

/// Decides which device model's row strategy applies at the current line.
///
/// Explicit tokens (fed from the header tracker) always win. Layout cues are
/// only consulted while the document has not named a model at all.
#[derive(Debug, Clone, Default)]
pub struct ModelDetector {
    page_model: Option<DeviceModel>,
    last_confirmed: Option<DeviceModel>,
    explicit_seen: bool,
}

impl ModelDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new page: the page's own model is forgotten, but it stays
    /// available as the fallback for pages that never name one.
    pub fn begin_page(&mut self) {
        if let Some(model) = self.page_model.take() {
            self.last_confirmed = Some(model);
        }
    }

    pub fn observe_explicit(&mut self, model: DeviceModel) {
        if model.is_known() {
            self.page_model = Some(model);
            self.explicit_seen = true;
        }
    }

    /// Infer a model from the shape of a line's input ids.
    pub fn observe_cues(&mut self, line: &str) -> Option<DeviceModel> {
        if self.explicit_seen {
            return None;
        }
        let tokens: Vec<&str> = split_segments(line)
            .iter()
            .flat_map(|s| s.text.split_whitespace())
            .collect();

        let cue = if tokens
            .first()
            .is_some_and(|t| parse_input_id(t, IdShape::In).is_some())
        {
            Some(DeviceModel::Sel411l)
        } else if tokens.len() >= 2
            && tokens
                .iter()
                .all(|t| parse_input_id(t, IdShape::Bi).is_some())
        {
            Some(DeviceModel::Tesla4000)
        } else {
            None
        };

        if let Some(model) = cue {
            if self.page_model != Some(model) {
                log::debug!("layout cue suggests {model}");
            }
            self.page_model = Some(model);
        }
        cue
    }

    pub fn resolve(&self) -> DeviceModel {
        self.page_model
            .or(self.last_confirmed)
            .unwrap_or(DeviceModel::Unknown)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolve().is_known()
    }
}
