use crate::error::{Error, Result, read_to_string};
use crate::geometry::Point;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Node box metrics and the default grid used for unpositioned nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub padding: f32,
    pub line_height: f32,
    pub max_title_lines: usize,
    pub section_spacing: f32,
    pub tag_height: f32,
    pub tag_spacing: f32,
    /// Extra width added to the measured tag text to get the chip width.
    pub tag_padding: f32,
    pub tag_text_inset_x: f32,
    pub tag_text_inset_y: f32,
    pub min_node_height: f32,
    pub grid_columns: usize,
    pub grid_column_width: f32,
    pub grid_row_height: f32,
    pub grid_origin: Point,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 200.0,
            padding: 8.0,
            line_height: 18.0,
            max_title_lines: 3,
            section_spacing: 8.0,
            tag_height: 16.0,
            tag_spacing: 4.0,
            tag_padding: 12.0,
            tag_text_inset_x: 6.0,
            tag_text_inset_y: 3.0,
            min_node_height: 80.0,
            grid_columns: 3,
            grid_column_width: 300.0,
            grid_row_height: 200.0,
            grid_origin: Point::new(100.0, 100.0),
        }
    }
}

impl LayoutConfig {
    pub fn usable_width(&self) -> f32 {
        self.node_width - self.padding * 2.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    pub wheel_zoom_in: f32,
    pub wheel_zoom_out: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 3.0,
            wheel_zoom_in: 1.1,
            wheel_zoom_out: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub fast_text_metrics: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            fast_text_metrics: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub view: ViewConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutOverrides>,
    view: Option<ViewOverrides>,
    render: Option<RenderOverrides>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    title_font_size: Option<f32>,
    tag_font_size: Option<f32>,
    node_fill: Option<String>,
    node_border: Option<String>,
    title_color: Option<String>,
    edge_outline_color: Option<String>,
    edge_inline_color: Option<String>,
    arrow_fill: Option<String>,
    arrow_stroke: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOverrides {
    node_width: Option<f32>,
    padding: Option<f32>,
    line_height: Option<f32>,
    max_title_lines: Option<usize>,
    min_node_height: Option<f32>,
    grid_columns: Option<usize>,
    grid_column_width: Option<f32>,
    grid_row_height: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewOverrides {
    min_scale: Option<f32>,
    max_scale: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderOverrides {
    width: Option<f32>,
    height: Option<f32>,
    fast_text: Option<bool>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(apply_config_file(Config::default(), parsed))
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let parsed: ConfigFile = serde_json::from_str(contents)?;
    Ok(apply_config_file(Config::default(), parsed))
}

fn apply_config_file(mut config: Config, parsed: ConfigFile) -> Config {
    match parsed.theme.as_deref() {
        Some("export") => config.theme = Theme::export(),
        Some("dark") | Some("default") => config.theme = Theme::dark(),
        Some(other) => tracing::warn!(theme = other, "unknown theme name, keeping default"),
        None => {}
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.title_font.family = v.clone();
            config.theme.tag_font.family = v;
        }
        if let Some(v) = vars.title_font_size {
            config.theme.title_font.size = v;
        }
        if let Some(v) = vars.tag_font_size {
            config.theme.tag_font.size = v;
        }
        if let Some(v) = vars.node_fill {
            config.theme.node_fill = v;
        }
        if let Some(v) = vars.node_border {
            config.theme.node_border = v;
        }
        if let Some(v) = vars.title_color {
            config.theme.title_color = v;
        }
        if let Some(v) = vars.edge_outline_color {
            config.theme.edge_outline_color = v;
        }
        if let Some(v) = vars.edge_inline_color {
            config.theme.edge_inline_color = v;
        }
        if let Some(v) = vars.arrow_fill {
            config.theme.arrow_fill = v;
        }
        if let Some(v) = vars.arrow_stroke {
            config.theme.arrow_stroke = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = Some(v);
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.node_width {
            config.layout.node_width = v;
        }
        if let Some(v) = layout.padding {
            config.layout.padding = v;
        }
        if let Some(v) = layout.line_height {
            config.layout.line_height = v;
        }
        if let Some(v) = layout.max_title_lines {
            config.layout.max_title_lines = v;
        }
        if let Some(v) = layout.min_node_height {
            config.layout.min_node_height = v;
        }
        if let Some(v) = layout.grid_columns {
            config.layout.grid_columns = v.max(1);
        }
        if let Some(v) = layout.grid_column_width {
            config.layout.grid_column_width = v;
        }
        if let Some(v) = layout.grid_row_height {
            config.layout.grid_row_height = v;
        }
    }

    if let Some(view) = parsed.view {
        if let Some(v) = view.min_scale {
            config.view.min_scale = v;
        }
        if let Some(v) = view.max_scale {
            config.view.max_scale = v;
        }
        if config.view.min_scale > config.view.max_scale {
            tracing::warn!(
                min = config.view.min_scale,
                max = config.view.max_scale,
                "minScale above maxScale, swapping"
            );
            std::mem::swap(&mut config.view.min_scale, &mut config.view.max_scale);
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.fast_text {
            config.render.fast_text_metrics = v;
        }
    }

    config
}
