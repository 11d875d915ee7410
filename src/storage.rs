use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::Serialize;
use tracing::debug;

use crate::WoodColor;

/// URL prefix the assets directory is served under.
pub const IMAGES_ROUTE: &str = "/images";

/// How a finish is painted in a tile or summary.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Swatch {
    Image { url: String },
    Fill { hex: String },
    Unavailable,
}

/// Read-only view of the public images directory.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a file name inside the store. Names that would escape the
    /// directory resolve to nothing.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let plain = relative
            .components()
            .all(|component| matches!(component, std::path::Component::Normal(_)));
        if name.is_empty() || !plain {
            return None;
        }
        let path = self.root.join(relative);
        path.is_file().then_some(path)
    }

    /// Image swatch when the file exists, otherwise a plain fill from the hex
    /// code, otherwise nothing to show.
    pub fn swatch(&self, color: &WoodColor) -> Swatch {
        if let Some(name) = color.image_name.as_deref() {
            if self.locate(name).is_some() {
                return Swatch::Image {
                    url: format!("{IMAGES_ROUTE}/{name}"),
                };
            }
            debug!(color = %color.id, image = name, "Swatch image missing, using fill");
        }
        match color.rgb() {
            Some(rgb) => Swatch::Fill { hex: rgb.to_hex() },
            None => Swatch::Unavailable,
        }
    }

    pub fn open_image(&self, name: &str) -> Option<RgbaImage> {
        let path = self.locate(name)?;
        match image::open(&path) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                debug!(path = %path.display(), "Failed to decode image: {}", e);
                None
            }
        }
    }
}
