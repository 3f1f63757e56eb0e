//! Fixed label catalog for advertisement annotation.

use serde::{Deserialize, Serialize};

/// Fill used for annotations whose category is unknown.
pub const NEUTRAL_FILL: &str = "rgba(128, 128, 128, 0.2)";
pub const NEUTRAL_BORDER: &str = "rgba(128, 128, 128, 0.7)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    pub supercategory: String,
    /// Translucent fill drawn inside the box.
    pub color: String,
    /// Opaque variant for the outline and the label tag.
    pub border_color: String,
}

/// Category entry as written to the persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCategory {
    pub id: u32,
    pub name: String,
    pub supercategory: String,
}

/// Immutable table of categories. Built once and handed to whoever needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelCatalog {
    categories: Vec<Category>,
}

fn category(id: u32, name: &str, rgb: (u8, u8, u8)) -> Category {
    let (r, g, b) = rgb;
    Category {
        id,
        name: name.to_string(),
        supercategory: name.to_string(),
        color: format!("rgba({r}, {g}, {b}, 0.2)"),
        border_color: format!("rgba({r}, {g}, {b}, 0.7)"),
    }
}

impl Default for LabelCatalog {
    fn default() -> Self {
        Self {
            categories: vec![
                category(1, "Logo", (255, 100, 100)),
                category(2, "Text", (100, 100, 255)),
                category(3, "Background", (100, 255, 100)),
                category(4, "Symbol Element", (255, 140, 0)),
                category(5, "Emphasized Text", (255, 100, 255)),
            ],
        }
    }
}

impl LabelCatalog {
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, id: u32) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    /// Category name, or `Label {id}` for ids outside the table.
    pub fn name_of(&self, id: u32) -> String {
        self.get(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("Label {id}"))
    }

    pub fn fill_color_of(&self, id: u32) -> &str {
        self.get(id).map(|c| c.color.as_str()).unwrap_or(NEUTRAL_FILL)
    }

    pub fn border_color_of(&self, id: u32) -> &str {
        self.get(id)
            .map(|c| c.border_color.as_str())
            .unwrap_or(NEUTRAL_BORDER)
    }

    pub fn to_persisted(&self) -> Vec<PersistedCategory> {
        self.categories
            .iter()
            .map(|c| PersistedCategory {
                id: c.id,
                name: c.name.clone(),
                supercategory: c.supercategory.clone(),
            })
            .collect()
    }
}

/// Parse an `rgba(r, g, b, a)` or `#rrggbb` colour into 8-bit channels.
pub fn parse_rgba(color: &str) -> Option<(u8, u8, u8, u8)> {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        return Some((r, g, b, 255));
    }

    let inner = color
        .strip_prefix("rgba(")
        .or_else(|| color.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    let channel = |s: &str| s.parse::<u8>().ok();
    match parts.as_slice() {
        [r, g, b] => Some((channel(r)?, channel(g)?, channel(b)?, 255)),
        [r, g, b, a] => {
            let alpha: f32 = a.parse().ok()?;
            let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
            Some((channel(r)?, channel(g)?, channel(b)?, alpha))
        }
        _ => None,
    }
}
