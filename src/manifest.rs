use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::{Bonus, ProductLineConfig, ProductLineId, WoodColor};

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to parse catalog manifest: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Line '{line}' references unknown palette '{palette}'")]
    UnknownPalette { line: String, palette: String },
    #[error("Line '{0}' is declared more than once")]
    DuplicateLine(String),
}

/// Either the name of a shared palette or an inline list of colors.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum ColorList {
    Palette(String),
    Inline(Vec<WoodColor>),
}

impl Default for ColorList {
    fn default() -> Self {
        Self::Inline(Vec::new())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestLine {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub colors: ColorList,
    #[serde(default)]
    pub solid_colors: ColorList,
    pub bonus: Option<Bonus>,
}

/// The catalog document, as written in `catalog/*.yaml`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogManifest {
    pub default_line: String,
    #[serde(default)]
    pub palettes: HashMap<String, Vec<WoodColor>>,
    pub lines: Vec<ManifestLine>,
}

impl CatalogManifest {
    pub fn from_yaml(raw: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Expands palette references into concrete line configs, keeping
    /// declaration order.
    pub fn resolve(self) -> Result<(ProductLineId, Vec<ProductLineConfig>), ManifestError> {
        let mut seen = HashSet::new();
        let mut lines = Vec::with_capacity(self.lines.len());

        for line in self.lines {
            if !seen.insert(line.id.clone()) {
                return Err(ManifestError::DuplicateLine(line.id));
            }
            let colors = expand(&self.palettes, &line.id, line.colors)?;
            let solid_colors = expand(&self.palettes, &line.id, line.solid_colors)?;
            lines.push(ProductLineConfig {
                id: ProductLineId::new(line.id),
                name: line.name,
                display_name: line.display_name,
                description: line.description,
                colors,
                solid_colors,
                bonus: line.bonus,
            });
        }

        Ok((ProductLineId::new(self.default_line), lines))
    }
}

fn expand(
    palettes: &HashMap<String, Vec<WoodColor>>,
    line: &str,
    list: ColorList,
) -> Result<Vec<WoodColor>, ManifestError> {
    match list {
        ColorList::Inline(colors) => Ok(colors),
        ColorList::Palette(name) => palettes
            .get(&name)
            .cloned()
            .ok_or_else(|| ManifestError::UnknownPalette {
                line: line.to_string(),
                palette: name,
            }),
    }
}
