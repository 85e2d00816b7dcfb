use storygraph::Canvas;
use storygraph::render::{TextAlign, TextBaseline};
use storygraph::text_metrics::{FontSpec, TextMeasure, approx_text_width};
use web_sys::CanvasRenderingContext2d;

/// [`Canvas`] over a browser 2D context. Failed context calls are dropped;
/// a frame with a bad call is simply repainted on the next redraw.
pub struct Context2d {
    ctx: CanvasRenderingContext2d,
}

impl Context2d {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl Canvas for Context2d {
    fn clear(&mut self) {
        let (width, height) = self
            .ctx
            .canvas()
            .map(|canvas| (f64::from(canvas.width()), f64::from(canvas.height())))
            .unwrap_or((0.0, 0.0));
        self.ctx.clear_rect(0.0, 0.0, width, height);
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, x: f32, y: f32) {
        let _ = self.ctx.translate(x.into(), y.into());
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        let _ = self.ctx.scale(sx.into(), sy.into());
    }

    fn rotate(&mut self, angle: f32) {
        let _ = self.ctx.rotate(angle.into());
    }

    fn set_fill_style(&mut self, color: &str) {
        self.ctx.set_fill_style_str(color);
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.ctx.set_stroke_style_str(color);
    }

    fn set_line_width(&mut self, width: f32) {
        self.ctx.set_line_width(width.into());
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.ctx.set_font(&font.css());
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.ctx.set_text_align(match align {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        });
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.ctx.set_text_baseline(match baseline {
            TextBaseline::Top => "top",
            TextBaseline::Middle => "middle",
            TextBaseline::Alphabetic => "alphabetic",
        });
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.ctx.move_to(x.into(), y.into());
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.ctx.line_to(x.into(), y.into());
    }

    fn bezier_curve_to(&mut self, cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32) {
        self.ctx.bezier_curve_to(
            cp1x.into(),
            cp1y.into(),
            cp2x.into(),
            cp2y.into(),
            x.into(),
            y.into(),
        );
    }

    fn round_rect(&mut self, x: f32, y: f32, width: f32, height: f32, radius: f32) {
        let _ = self.ctx.round_rect_with_f64(
            x.into(),
            y.into(),
            width.into(),
            height.into(),
            radius.into(),
        );
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.ctx.fill_rect(x.into(), y.into(), width.into(), height.into());
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.ctx.stroke_rect(x.into(), y.into(), width.into(), height.into());
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        let _ = self.ctx.fill_text(text, x.into(), y.into());
    }
}

/// Measures with the browser's own text shaping, so wrapped titles match
/// what the context draws.
pub struct ContextMetrics {
    ctx: CanvasRenderingContext2d,
}

impl ContextMetrics {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl TextMeasure for ContextMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        self.ctx.save();
        self.ctx.set_font(&font.css());
        let width = self
            .ctx
            .measure_text(text)
            .map(|metrics| metrics.width() as f32)
            .unwrap_or_else(|_| approx_text_width(text, font.size));
        self.ctx.restore();
        width
    }
}
