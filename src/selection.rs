use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Catalog, ColorSelector, ProductLineConfig, ProductLineId, WoodColor};

pub const PICK_A_COLOR_HINT: &str = "Selecione uma cor acima";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Color '{color}' is not offered by line '{line}'")]
    ColorNotInLine { line: String, color: String },
    #[error("No color selected")]
    NoColor,
}

/// What `choose_line` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineChange {
    Selected,
    /// The requested id is not in the catalog; the default line was used.
    FellBack { requested: String },
}

/// The selected product line and finish of one page session.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    line: ProductLineId,
    color: Option<WoodColor>,
}

/// The summary panel beside the configurator.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SelectionSummary {
    pub line_display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<WoodColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl Selection {
    /// Starts on `initial` (or the catalog default if unknown), no color.
    pub fn new(catalog: &Catalog, initial: &str) -> Self {
        let resolved = catalog.resolve(initial);
        if resolved.fell_back {
            warn!(requested = initial, "Unknown initial line, using default");
        }
        Self {
            line: resolved.config.id.clone(),
            color: None,
        }
    }

    pub fn line(&self) -> &ProductLineId {
        &self.line
    }

    pub fn color(&self) -> Option<&WoodColor> {
        self.color.as_ref()
    }

    pub fn config<'c>(&self, catalog: &'c Catalog) -> &'c ProductLineConfig {
        catalog.resolve(self.line.as_str()).config
    }

    /// Switches line and always clears the color, even for the same line.
    pub fn choose_line(&mut self, catalog: &Catalog, requested: &str) -> LineChange {
        let resolved = catalog.resolve(requested);
        self.line = resolved.config.id.clone();
        self.color = None;
        debug!(line = %self.line, "Line chosen, color cleared");

        if resolved.fell_back {
            warn!(requested, fallback = %self.line, "Unknown product line");
            LineChange::FellBack {
                requested: requested.to_string(),
            }
        } else {
            LineChange::Selected
        }
    }

    /// Selects a finish by id. Ids foreign to the current line are refused and
    /// leave the state untouched.
    pub fn choose_color(&mut self, catalog: &Catalog, color_id: &str) -> Result<&WoodColor, SelectionError> {
        let mut picked = None;
        ColorSelector::new(self.config(catalog), None).pick(color_id, |color| picked = Some(color));
        let color = picked.ok_or_else(|| SelectionError::ColorNotInLine {
            line: self.line.to_string(),
            color: color_id.to_string(),
        })?;
        debug!(line = %self.line, color = %color.id, "Color chosen");
        Ok(self.color.insert(color.clone()))
    }

    pub fn require_color(&self) -> Result<&WoodColor, SelectionError> {
        self.color.as_ref().ok_or(SelectionError::NoColor)
    }

    pub fn summary(&self, catalog: &Catalog) -> SelectionSummary {
        SelectionSummary {
            line_display_name: self.config(catalog).display_name.clone(),
            color: self.color.clone(),
            hint: self.color.is_none().then_some(PICK_A_COLOR_HINT),
        }
    }
}
