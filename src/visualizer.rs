//! Preview of the selected finish over the showcase photograph.
//!
//! Frames are found with a brightness plus channel-similarity heuristic and
//! blended toward the chosen color. The heuristic is approximate: anything
//! dark and grey counts as metal, including shadows.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{AssetStore, ColorCategory, ProductLineConfig, Rgb, Swatch, WoodColor};

/// Pixels with a mean channel value at or above this are never recolored.
pub const METALLIC_MAX_BRIGHTNESS: f32 = 100.0;
/// Max difference between R/G and G/B for a pixel to count as grey metal.
pub const CHANNEL_SIMILARITY: i16 = 30;
/// Weight of the target color in the blend.
pub const BLEND_FACTOR: f32 = 0.6;

pub const FALLBACK_WIDTH: u32 = 320;
pub const FALLBACK_HEIGHT: u32 = 180;

pub const DISCLAIMER: &str =
    "* Imagem ilustrativa. As cores podem variar conforme iluminação, acabamento e material aplicado.";

pub fn is_metallic(pixel: &Rgba<u8>) -> bool {
    let [r, g, b, _] = pixel.0;
    let brightness = (f32::from(r) + f32::from(g) + f32::from(b)) / 3.0;
    let (r, g, b) = (i16::from(r), i16::from(g), i16::from(b));
    brightness < METALLIC_MAX_BRIGHTNESS
        && (r - g).abs() < CHANNEL_SIMILARITY
        && (g - b).abs() < CHANNEL_SIMILARITY
}

fn blend(channel: u8, target: u8) -> u8 {
    let mixed = f32::from(channel) * (1.0 - BLEND_FACTOR) + f32::from(target) * BLEND_FACTOR;
    mixed.round().clamp(0.0, 255.0) as u8
}

/// Recolors metallic pixels in place and returns how many were touched.
pub fn recolor_frames(img: &mut RgbaImage, target: Rgb) -> usize {
    let mut touched = 0;
    for pixel in img.pixels_mut() {
        if is_metallic(pixel) {
            pixel[0] = blend(pixel[0], target.r);
            pixel[1] = blend(pixel[1], target.g);
            pixel[2] = blend(pixel[2], target.b);
            touched += 1;
        }
    }
    touched
}

pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Text and swatch shown around the rendered preview.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PreviewInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swatch: Option<Swatch>,
    pub photographic: bool,
    pub disclaimer: &'static str,
}

pub struct Visualizer {
    base: Option<RgbaImage>,
}

impl Visualizer {
    pub fn new(base: Option<RgbaImage>) -> Self {
        Self { base }
    }

    /// Loads the base photograph from the store. A missing or unreadable
    /// file leaves the visualizer in swatch mode.
    pub fn from_assets(assets: &AssetStore, base_image: &str) -> Self {
        let base = assets.open_image(base_image);
        match &base {
            Some(img) => debug!(image = base_image, width = img.width(), height = img.height(), "Preview base loaded"),
            None => warn!(image = base_image, "Preview base image unavailable, falling back to swatches"),
        }
        Self::new(base)
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Renders the preview for `color`. Never mutates its inputs.
    pub fn render(&self, color: Option<&WoodColor>) -> RgbaImage {
        let target = color.and_then(WoodColor::rgb);
        match &self.base {
            Some(base) => {
                let mut img = base.clone();
                if let Some(target) = target {
                    let touched = recolor_frames(&mut img, target);
                    debug!(touched, "Preview recolored");
                }
                img
            }
            None => {
                let fill = target.unwrap_or(Rgb::NEUTRAL);
                RgbaImage::from_pixel(
                    FALLBACK_WIDTH,
                    FALLBACK_HEIGHT,
                    Rgba([fill.r, fill.g, fill.b, 255]),
                )
            }
        }
    }

    pub fn info(&self, line: &ProductLineConfig, color: Option<&WoodColor>, assets: &AssetStore) -> PreviewInfo {
        PreviewInfo {
            caption: color.map(|color| format!("{} - {}", line.display_name, color.name)),
            tip: color.map(tip_for),
            swatch: color.map(|color| assets.swatch(color)),
            photographic: self.has_base(),
            disclaimer: DISCLAIMER,
        }
    }
}

pub fn tip_for(color: &WoodColor) -> String {
    let suited = match color.category {
        ColorCategory::Wood => "ambientes que buscam aconchego e sofisticação natural",
        ColorCategory::Solid => "projetos modernos e minimalistas",
    };
    format!("A cor {} é ideal para {}.", color.name, suited)
}
