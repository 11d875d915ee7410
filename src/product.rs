use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Rgb;

/// Identifier of a product line. Any string is accepted here; whether it
/// names a catalog entry is decided by `Catalog::lookup`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ProductLineId(String);

impl ProductLineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductLineId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ProductLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColorCategory {
    Wood,
    Solid,
}

impl ColorCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Wood => "Cor Amadeirado",
            Self::Solid => "Cor Sólida",
        }
    }
}

/// A selectable finish. `hex_code` is kept verbatim, even when malformed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WoodColor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    pub category: ColorCategory,
}

impl WoodColor {
    pub fn rgb(&self) -> Option<Rgb> {
        self.hex_code.as_deref().and_then(Rgb::parse_hex)
    }

    /// True when there is something to paint a swatch with.
    pub fn is_renderable(&self) -> bool {
        self.hex_code.as_deref().is_some_and(|hex| !hex.trim().is_empty())
            || self.image_name.as_deref().is_some_and(|name| !name.trim().is_empty())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Bonus {
    pub title: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProductLineConfig {
    pub id: ProductLineId,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub colors: Vec<WoodColor>,
    pub solid_colors: Vec<WoodColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<Bonus>,
}

impl ProductLineConfig {
    /// Config with no colors, used when neither the requested line nor the
    /// catalog default exists.
    pub fn empty() -> Self {
        Self {
            id: ProductLineId::new(""),
            name: String::new(),
            display_name: String::new(),
            description: String::new(),
            colors: Vec::new(),
            solid_colors: Vec::new(),
            bonus: None,
        }
    }

    /// Both lists in display order, `colors` first.
    pub fn all_colors(&self) -> impl Iterator<Item = &WoodColor> {
        self.colors.iter().chain(self.solid_colors.iter())
    }

    pub fn find_color(&self, color_id: &str) -> Option<&WoodColor> {
        self.all_colors().find(|color| color.id == color_id)
    }
}

/// Short form of a line for pickers and summaries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LineSummary {
    pub id: ProductLineId,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub has_bonus: bool,
}

impl From<&ProductLineConfig> for LineSummary {
    fn from(config: &ProductLineConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            display_name: config.display_name.clone(),
            description: config.description.clone(),
            has_bonus: config.bonus.is_some(),
        }
    }
}
