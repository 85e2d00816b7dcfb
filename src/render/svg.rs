use super::{Canvas, TextAlign, TextBaseline};
use crate::error::{Result, write_bytes};
use crate::text_metrics::FontSpec;
use std::fmt::Write as _;
use std::path::Path;

/// 2D affine matrix in canvas order: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += self.a * tx + self.c * ty;
        self.f += self.b * tx + self.d * ty;
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.a *= sx;
        self.b *= sx;
        self.c *= sy;
        self.d *= sy;
    }

    fn rotate(&mut self, angle: f32) {
        let (sin, cos) = angle.sin_cos();
        let Matrix { a, b, c, d, .. } = *self;
        self.a = a * cos + c * sin;
        self.b = b * cos + d * sin;
        self.c = c * cos - a * sin;
        self.d = d * cos - b * sin;
    }

    fn attr(&self) -> String {
        if *self == Matrix::IDENTITY {
            return String::new();
        }
        format!(
            " transform=\"matrix({:.4} {:.4} {:.4} {:.4} {:.2} {:.2})\"",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}

#[derive(Debug, Clone)]
struct DrawState {
    matrix: Matrix,
    fill: String,
    stroke: String,
    line_width: f32,
    font: FontSpec,
    align: TextAlign,
    baseline: TextBaseline,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            fill: "#000000".to_string(),
            stroke: "#000000".to_string(),
            line_width: 1.0,
            font: FontSpec::new(10.0, "sans-serif"),
            align: TextAlign::Left,
            baseline: TextBaseline::Alphabetic,
        }
    }
}

/// Canvas backend that records drawing calls as SVG elements.
///
/// Each path keeps the transform that was current when it was started, so a
/// transform change in the middle of a path is not supported.
pub struct SvgCanvas {
    width: f32,
    height: f32,
    background: Option<String>,
    state: DrawState,
    stack: Vec<DrawState>,
    path: String,
    path_matrix: Matrix,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            background: None,
            state: DrawState::default(),
            stack: Vec::new(),
            path: String::new(),
            path_matrix: Matrix::IDENTITY,
            body: String::new(),
        }
    }

    pub fn with_background(mut self, background: Option<String>) -> Self {
        self.background = background;
        self
    }

    /// The complete document for everything drawn since the last clear.
    pub fn finish(&self) -> String {
        let (width, height) = (self.width, self.height);
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
        );
        if let Some(background) = &self.background {
            let _ = write!(
                svg,
                "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
                escape_xml(background)
            );
        }
        svg.push_str(&self.body);
        svg.push_str("</svg>");
        svg
    }

    fn push_path_command(&mut self, command: &str) {
        if self.path.is_empty() {
            self.path_matrix = self.state.matrix;
        } else {
            self.path.push(' ');
        }
        self.path.push_str(command);
    }
}

impl Canvas for SvgCanvas {
    fn clear(&mut self) {
        self.body.clear();
        self.path.clear();
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state.matrix.translate(x, y);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.state.matrix.scale(sx, sy);
    }

    fn rotate(&mut self, angle: f32) {
        self.state.matrix.rotate(angle);
    }

    fn set_fill_style(&mut self, color: &str) {
        self.state.fill = color.to_string();
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.state.stroke = color.to_string();
    }

    fn set_line_width(&mut self, width: f32) {
        self.state.line_width = width;
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.state.font = font.clone();
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.state.align = align;
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.baseline = baseline;
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.push_path_command(&format!("M {x:.2} {y:.2}"));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push_path_command(&format!("L {x:.2} {y:.2}"));
    }

    fn bezier_curve_to(&mut self, cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32) {
        self.push_path_command(&format!(
            "C {cp1x:.2} {cp1y:.2} {cp2x:.2} {cp2y:.2} {x:.2} {y:.2}"
        ));
    }

    fn round_rect(&mut self, x: f32, y: f32, width: f32, height: f32, radius: f32) {
        let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
        let (right, bottom) = (x + width, y + height);
        self.push_path_command(&format!(
            "M {:.2} {y:.2} L {:.2} {y:.2} A {r:.2} {r:.2} 0 0 1 {right:.2} {:.2} \
             L {right:.2} {:.2} A {r:.2} {r:.2} 0 0 1 {:.2} {bottom:.2} \
             L {:.2} {bottom:.2} A {r:.2} {r:.2} 0 0 1 {x:.2} {:.2} \
             L {x:.2} {:.2} A {r:.2} {r:.2} 0 0 1 {:.2} {y:.2} Z",
            x + r,
            right - r,
            y + r,
            bottom - r,
            right - r,
            x + r,
            bottom - r,
            y + r,
            x + r,
        ));
    }

    fn close_path(&mut self) {
        if !self.path.is_empty() {
            self.path.push_str(" Z");
        }
    }

    fn fill(&mut self) {
        if self.path.is_empty() {
            return;
        }
        let _ = write!(
            self.body,
            "<path d=\"{}\" fill=\"{}\" stroke=\"none\"{}/>",
            self.path,
            escape_xml(&self.state.fill),
            self.path_matrix.attr()
        );
    }

    fn stroke(&mut self) {
        if self.path.is_empty() {
            return;
        }
        let _ = write!(
            self.body,
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"{}/>",
            self.path,
            escape_xml(&self.state.stroke),
            self.state.line_width,
            self.path_matrix.attr()
        );
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let _ = write!(
            self.body,
            "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{}\"{}/>",
            escape_xml(&self.state.fill),
            self.state.matrix.attr()
        );
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let _ = write!(
            self.body,
            "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"{}/>",
            escape_xml(&self.state.stroke),
            self.state.line_width,
            self.state.matrix.attr()
        );
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        let anchor = match self.state.align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        };
        let baseline = match self.state.baseline {
            TextBaseline::Top => "hanging",
            TextBaseline::Middle => "central",
            TextBaseline::Alphabetic => "alphabetic",
        };
        let _ = write!(
            self.body,
            "<text x=\"{x:.2}\" y=\"{y:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\" text-anchor=\"{anchor}\" dominant-baseline=\"{baseline}\"{}>{}</text>",
            escape_xml(&self.state.font.family),
            self.state.font.size,
            escape_xml(&self.state.fill),
            self.state.matrix.attr(),
            escape_xml(text)
        );
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => write_bytes(path, svg)?,
        None => print!("{svg}"),
    }
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
