use crate::text_metrics::FontSpec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub title_font: FontSpec,
    pub tag_font: FontSpec,
    pub node_fill: String,
    pub node_border: String,
    pub node_border_width: f32,
    pub title_color: String,
    pub edge_outline_color: String,
    pub edge_outline_width: f32,
    pub edge_inline_color: String,
    pub edge_inline_width: f32,
    pub arrow_fill: String,
    pub arrow_stroke: String,
    pub arrow_stroke_width: f32,
    pub arrow_length: f32,
    pub arrow_half_angle: f32,
    pub tag_corner_radius: f32,
    /// Only used by exporters; a live surface is cleared to transparent.
    pub background: Option<String>,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            title_font: FontSpec::new(14.0, "Inter, sans-serif"),
            tag_font: FontSpec::new(10.0, "Inter, sans-serif"),
            node_fill: "#1F2937".to_string(),
            node_border: "#374151".to_string(),
            node_border_width: 2.0,
            title_color: "#FFFFFF".to_string(),
            edge_outline_color: "#000000".to_string(),
            edge_outline_width: 8.0,
            edge_inline_color: "#FFFFFF".to_string(),
            edge_inline_width: 4.0,
            arrow_fill: "#FFFFFF".to_string(),
            arrow_stroke: "#000000".to_string(),
            arrow_stroke_width: 2.0,
            arrow_length: 15.0,
            arrow_half_angle: std::f32::consts::FRAC_PI_6,
            tag_corner_radius: 8.0,
            background: None,
        }
    }

    /// Dark theme on an opaque backdrop, for standalone SVG/PNG files.
    pub fn export() -> Self {
        Self {
            background: Some("#111827".to_string()),
            ..Self::dark()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
