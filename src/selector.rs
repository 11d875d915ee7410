use std::collections::HashSet;

use serde::Serialize;

use crate::{AssetStore, ColorCategory, ProductLineConfig, Swatch, WoodColor};

pub const EMPTY_WOOD_GROUP: &str = "Nenhuma cor amadeirado disponível para esta linha";
pub const EMPTY_SOLID_GROUP: &str = "Nenhuma cor sólida disponível para esta linha";

/// Groups a line's finishes into wood and solid tiles and reports the one the
/// visitor picks.
pub struct ColorSelector<'a> {
    line: &'a ProductLineConfig,
    selected: Option<&'a WoodColor>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ColorTile {
    pub color: WoodColor,
    pub selected: bool,
    pub swatch: Swatch,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ColorGroup {
    pub category: ColorCategory,
    pub title: &'static str,
    pub tiles: Vec<ColorTile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SelectorView {
    pub line_display_name: String,
    pub wood: ColorGroup,
    pub solid: ColorGroup,
}

impl<'a> ColorSelector<'a> {
    pub fn new(line: &'a ProductLineConfig, selected: Option<&'a WoodColor>) -> Self {
        Self { line, selected }
    }

    /// Finishes of one category, in display order. A repeated id keeps its
    /// first occurrence.
    pub fn group(&self, category: ColorCategory) -> Vec<&'a WoodColor> {
        let mut seen = HashSet::new();
        self.line
            .all_colors()
            .filter(|color| color.category == category)
            .filter(|color| seen.insert(color.id.clone()))
            .collect()
    }

    pub fn is_selected(&self, color: &WoodColor) -> bool {
        self.selected.is_some_and(|selected| selected.id == color.id)
    }

    /// Hands the full record of tile `color_id` to `on_select`. Returns
    /// false, without calling back, when no tile has that id.
    pub fn pick<F>(&self, color_id: &str, on_select: F) -> bool
    where
        F: FnOnce(&'a WoodColor),
    {
        let line: &'a ProductLineConfig = self.line;
        match line.find_color(color_id) {
            Some(color) => {
                on_select(color);
                true
            }
            None => false,
        }
    }

    pub fn view(&self, assets: &AssetStore) -> SelectorView {
        SelectorView {
            line_display_name: self.line.display_name.clone(),
            wood: self.build_group(ColorCategory::Wood, assets),
            solid: self.build_group(ColorCategory::Solid, assets),
        }
    }

    fn build_group(&self, category: ColorCategory, assets: &AssetStore) -> ColorGroup {
        let tiles: Vec<ColorTile> = self
            .group(category)
            .into_iter()
            .map(|color| ColorTile {
                color: color.clone(),
                selected: self.is_selected(color),
                swatch: assets.swatch(color),
            })
            .collect();

        let placeholder = match (tiles.is_empty(), category) {
            (false, _) => None,
            (true, ColorCategory::Wood) => Some(EMPTY_WOOD_GROUP),
            (true, ColorCategory::Solid) => Some(EMPTY_SOLID_GROUP),
        };

        ColorGroup {
            category,
            title: category.label(),
            tiles,
            placeholder,
        }
    }
}
