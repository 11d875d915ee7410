use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{CatalogManifest, ColorCategory, LineSummary, ManifestError, ProductLineConfig, ProductLineId};

const BUILTIN_MANIFEST: &str = include_str!("../catalog/default.yaml");

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown product line '{0}'")]
    UnknownLine(String),
}

/// Something in the catalog that would render poorly. Never fatal.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    pub line: String,
    pub message: String,
}

/// Outcome of a lenient lookup.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    pub config: &'a ProductLineConfig,
    pub fell_back: bool,
}

/// Immutable registry of product lines, loaded once at startup.
pub struct Catalog {
    lines: Vec<ProductLineConfig>,
    index: HashMap<ProductLineId, usize>,
    default_line: ProductLineId,
    empty: ProductLineConfig,
}

impl Catalog {
    pub fn new(default_line: ProductLineId, lines: Vec<ProductLineConfig>) -> Self {
        let index = lines
            .iter()
            .enumerate()
            .map(|(position, line)| (line.id.clone(), position))
            .collect();
        Self {
            lines,
            index,
            default_line,
            empty: ProductLineConfig::empty(),
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ManifestError> {
        let (default_line, lines) = CatalogManifest::from_yaml(raw)?.resolve()?;
        Ok(Self::new(default_line, lines))
    }

    /// The catalog that ships with the site.
    pub fn builtin() -> Result<Self, ManifestError> {
        Self::from_yaml(BUILTIN_MANIFEST)
    }

    /// Loads a manifest from disk, or the built-in one when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let catalog = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read catalog {}", path.display()))?;
                Self::from_yaml(&raw)
                    .with_context(|| format!("Invalid catalog {}", path.display()))?
            }
            None => Self::builtin().context("Built-in catalog is invalid")?,
        };

        for issue in catalog.issues() {
            warn!(line = %issue.line, "{}", issue.message);
        }
        debug!(lines = catalog.lines.len(), default = %catalog.default_line, "Catalog loaded");
        Ok(catalog)
    }

    pub fn lookup(&self, id: &str) -> Result<&ProductLineConfig, CatalogError> {
        self.index
            .get(&ProductLineId::from(id))
            .map(|&position| &self.lines[position])
            .ok_or_else(|| CatalogError::UnknownLine(id.to_string()))
    }

    /// Like `lookup`, but unknown ids land on the default line, and on an
    /// empty config if the default is missing as well.
    pub fn resolve(&self, id: &str) -> Resolved<'_> {
        match self.lookup(id) {
            Ok(config) => Resolved { config, fell_back: false },
            Err(_) => {
                let config = self.lookup(self.default_line.as_str()).unwrap_or(&self.empty);
                Resolved { config, fell_back: true }
            }
        }
    }

    pub fn default_line(&self) -> &ProductLineId {
        &self.default_line
    }

    pub fn lines(&self) -> impl Iterator<Item = &ProductLineConfig> {
        self.lines.iter()
    }

    pub fn summaries(&self) -> Vec<LineSummary> {
        self.lines.iter().map(LineSummary::from).collect()
    }

    pub fn issues(&self) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();
        if self.lookup(self.default_line.as_str()).is_err() {
            issues.push(CatalogIssue {
                line: self.default_line.to_string(),
                message: "default line is not declared".into(),
            });
        }

        for line in &self.lines {
            let mut push = |message: String| {
                issues.push(CatalogIssue {
                    line: line.id.to_string(),
                    message,
                })
            };

            if line.display_name.trim().is_empty() {
                push("empty display name".into());
            }

            let listed = line
                .colors
                .iter()
                .map(|color| (color, ColorCategory::Wood))
                .chain(line.solid_colors.iter().map(|color| (color, ColorCategory::Solid)));
            for (color, expected) in listed {
                if color.category != expected {
                    push(format!(
                        "color '{}' is {:?} but listed among {:?} colors",
                        color.id, color.category, expected
                    ));
                }
            }

            let mut ids: HashMap<&str, &crate::WoodColor> = HashMap::new();
            let mut reported = HashSet::new();
            for color in line.all_colors() {
                if color.name.trim().is_empty() {
                    push(format!("color '{}' has no name", color.id));
                }
                if !color.is_renderable() {
                    push(format!("color '{}' has neither hex code nor image", color.id));
                }
                if let Some(previous) = ids.insert(&color.id, color) {
                    if previous != color && reported.insert(color.id.as_str()) {
                        push(format!("color id '{}' is used by different finishes", color.id));
                    }
                }
            }
        }
        issues
    }
}
