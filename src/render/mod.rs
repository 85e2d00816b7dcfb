mod edge;
#[cfg(feature = "png")]
mod png;
mod svg;

pub use edge::{CURVATURE_RATIO, EdgeCurve, MAX_CURVATURE};
#[cfg(feature = "png")]
pub use png::{rasterize_png, write_output_png};
pub use svg::{SvgCanvas, write_output_svg};

use crate::config::LayoutConfig;
use crate::layout::{LayoutSet, NodeLayout};
use crate::model::StoryNode;
use crate::tag_color::color_of;
use crate::text_metrics::FontSpec;
use crate::theme::Theme;
use crate::view::ViewTransform;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    Middle,
    Alphabetic,
}

/// Immediate-mode 2D drawing surface in the style of an HTML canvas context.
///
/// Path and text coordinates are interpreted in the current transform, which
/// `save`/`restore` push and pop together with the style state.
pub trait Canvas {
    /// Wipes the whole surface.
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn scale(&mut self, sx: f32, sy: f32);
    fn rotate(&mut self, angle: f32);

    fn set_fill_style(&mut self, color: &str);
    fn set_stroke_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f32);
    fn set_font(&mut self, font: &FontSpec);
    fn set_text_align(&mut self, align: TextAlign);
    fn set_text_baseline(&mut self, baseline: TextBaseline);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn bezier_curve_to(&mut self, cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32);
    fn round_rect(&mut self, x: f32, y: f32, width: f32, height: f32, radius: f32);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn fill_text(&mut self, text: &str, x: f32, y: f32);
}

/// Paints one full frame. Same inputs always issue the same drawing calls.
pub fn render_scene(
    canvas: &mut dyn Canvas,
    nodes: &[StoryNode],
    layouts: &LayoutSet,
    view: &ViewTransform,
    theme: &Theme,
    config: &LayoutConfig,
) {
    canvas.clear();
    canvas.save();
    canvas.translate(view.offset_x, view.offset_y);
    canvas.scale(view.scale, view.scale);

    for node in nodes {
        let Some(child) = layouts.get(&node.id) else {
            continue;
        };
        for cause in &node.causes {
            let Some(parent) = layouts.get(cause) else {
                continue;
            };
            draw_edge(canvas, &EdgeCurve::between(&parent.rect(), &child.rect()), theme);
        }
    }

    let present: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    for layout in layouts {
        if present.contains(layout.id.as_str()) {
            draw_node(canvas, layout, theme, config);
        }
    }

    canvas.restore();
}

fn trace_curve(canvas: &mut dyn Canvas, curve: &EdgeCurve) {
    canvas.begin_path();
    canvas.move_to(curve.start.x, curve.start.y);
    canvas.bezier_curve_to(
        curve.cp1.x,
        curve.cp1.y,
        curve.cp2.x,
        curve.cp2.y,
        curve.end.x,
        curve.end.y,
    );
}

pub fn draw_edge(canvas: &mut dyn Canvas, curve: &EdgeCurve, theme: &Theme) {
    // wide dark pass, then a thinner light pass on top for the bordered look
    canvas.set_line_width(theme.edge_outline_width);
    canvas.set_stroke_style(&theme.edge_outline_color);
    trace_curve(canvas, curve);
    canvas.stroke();

    canvas.set_line_width(theme.edge_inline_width);
    canvas.set_stroke_style(&theme.edge_inline_color);
    trace_curve(canvas, curve);
    canvas.stroke();

    draw_arrowhead(canvas, curve, theme);
}

fn draw_arrowhead(canvas: &mut dyn Canvas, curve: &EdgeCurve, theme: &Theme) {
    let [tip, left, right] = EdgeCurve::arrowhead(theme.arrow_length, theme.arrow_half_angle);

    canvas.save();
    canvas.translate(curve.end.x, curve.end.y);
    canvas.rotate(curve.arrow_angle());
    canvas.set_stroke_style(&theme.arrow_stroke);
    canvas.set_fill_style(&theme.arrow_fill);
    canvas.set_line_width(theme.arrow_stroke_width);

    canvas.begin_path();
    canvas.move_to(tip.x, tip.y);
    canvas.line_to(left.x, left.y);
    canvas.line_to(right.x, right.y);
    canvas.close_path();
    canvas.fill();
    canvas.stroke();

    canvas.restore();
}

pub fn draw_node(canvas: &mut dyn Canvas, layout: &NodeLayout, theme: &Theme, config: &LayoutConfig) {
    canvas.set_fill_style(&theme.node_fill);
    canvas.set_stroke_style(&theme.node_border);
    canvas.set_line_width(theme.node_border_width);
    canvas.fill_rect(layout.x, layout.y, layout.width, layout.height);
    canvas.stroke_rect(layout.x, layout.y, layout.width, layout.height);

    let text_x = layout.x + config.padding;
    let mut cursor_y = layout.y + config.padding;

    canvas.set_fill_style(&theme.title_color);
    canvas.set_font(&theme.title_font);
    canvas.set_text_align(TextAlign::Left);
    canvas.set_text_baseline(TextBaseline::Top);
    for (idx, line) in layout.title_lines.iter().enumerate() {
        canvas.fill_text(line, text_x, cursor_y + idx as f32 * config.line_height);
    }
    cursor_y += layout.title_lines.len() as f32 * config.line_height + config.section_spacing;

    if layout.tag_rows.is_empty() {
        return;
    }
    canvas.set_font(&theme.tag_font);
    for (row_idx, row) in layout.tag_rows.iter().enumerate() {
        let chip_y = cursor_y + row_idx as f32 * (config.tag_height + config.tag_spacing);
        let mut chip_x = text_x;
        for chip in row {
            let colors = color_of(&chip.text);
            canvas.set_fill_style(colors.background);
            canvas.begin_path();
            canvas.round_rect(chip_x, chip_y, chip.width, config.tag_height, theme.tag_corner_radius);
            canvas.fill();

            canvas.set_fill_style(colors.foreground);
            canvas.fill_text(
                &chip.text,
                chip_x + config.tag_text_inset_x,
                chip_y + config.tag_text_inset_y,
            );
            chip_x += chip.width + config.tag_spacing;
        }
    }
}
