use crate::config::ViewConfig;
use crate::geometry::Point;
use serde::Serialize;

/// Pan/zoom state: `screen = world * scale + offset`.
///
/// The offset is deliberately left unbounded; zooming far out can push the
/// content off the surface with no re-centering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTransform {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
    #[serde(skip)]
    min_scale: f32,
    #[serde(skip)]
    max_scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(&ViewConfig::default())
    }
}

impl ViewTransform {
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0f32.clamp(config.min_scale, config.max_scale),
            min_scale: config.min_scale,
            max_scale: config.max_scale,
        }
    }

    pub fn with_state(config: &ViewConfig, offset_x: f32, offset_y: f32, scale: f32) -> Self {
        Self {
            offset_x,
            offset_y,
            scale: scale.clamp(config.min_scale, config.max_scale),
            min_scale: config.min_scale,
            max_scale: config.max_scale,
        }
    }

    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.offset_x,
            world.y * self.scale + self.offset_y,
        )
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset_x) / self.scale,
            (screen.y - self.offset_y) / self.scale,
        )
    }

    pub fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Multiply the scale by `factor` (clamped) keeping the world point under
    /// `anchor` fixed on screen.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32) {
        let world = self.screen_to_world(anchor);
        self.scale = self.clamp_scale(self.scale * factor);
        self.offset_x = anchor.x - world.x * self.scale;
        self.offset_y = anchor.y - world.y * self.scale;
    }

    /// Wheel zoom anchored at the cursor. Returns false for a zero delta.
    pub fn wheel_zoom(&mut self, cursor: Point, delta_y: f32, config: &ViewConfig) -> bool {
        let factor = if delta_y > 0.0 {
            config.wheel_zoom_out
        } else if delta_y < 0.0 {
            config.wheel_zoom_in
        } else {
            return false;
        };
        self.zoom_at(cursor, factor);
        true
    }

    /// One pinch increment: scale by the finger-distance ratio around the new
    /// midpoint, then follow the midpoint's own movement so pan and zoom
    /// compose within the same gesture.
    pub fn pinch(
        &mut self,
        last_distance: f32,
        last_midpoint: Point,
        distance: f32,
        midpoint: Point,
    ) -> bool {
        if last_distance <= f32::EPSILON || !distance.is_finite() {
            return false;
        }
        self.zoom_at(midpoint, distance / last_distance);
        self.pan_by(midpoint.x - last_midpoint.x, midpoint.y - last_midpoint.y);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn round_trip_screen_world() {
        let config = ViewConfig::default();
        let view = ViewTransform::with_state(&config, 37.5, -120.0, 1.7);
        for p in [Point::new(0.0, 0.0), Point::new(812.0, 33.3), Point::new(-50.0, 400.0)] {
            assert_close(view.world_to_screen(view.screen_to_world(p)), p);
        }
    }

    #[test]
    fn zoom_in_clamps_at_max() {
        let config = ViewConfig::default();
        let mut view = ViewTransform::new(&config);
        for _ in 0..50 {
            view.wheel_zoom(Point::new(300.0, 200.0), -1.0, &config);
        }
        assert_eq!(view.scale, 3.0);
    }

    #[test]
    fn zoom_out_clamps_at_min() {
        let config = ViewConfig::default();
        let mut view = ViewTransform::new(&config);
        for _ in 0..50 {
            view.wheel_zoom(Point::new(300.0, 200.0), 1.0, &config);
        }
        assert_eq!(view.scale, 0.1);
    }

    #[test]
    fn wheel_zoom_keeps_cursor_anchor() {
        let config = ViewConfig::default();
        let mut view = ViewTransform::with_state(&config, 40.0, 25.0, 1.3);
        let cursor = Point::new(420.0, 310.0);
        let before = view.screen_to_world(cursor);
        assert!(view.wheel_zoom(cursor, -120.0, &config));
        assert_close(view.screen_to_world(cursor), before);
        assert!(view.wheel_zoom(cursor, 120.0, &config));
        assert_close(view.screen_to_world(cursor), before);
    }

    #[test]
    fn zero_wheel_delta_is_ignored() {
        let config = ViewConfig::default();
        let mut view = ViewTransform::new(&config);
        assert!(!view.wheel_zoom(Point::new(1.0, 1.0), 0.0, &config));
        assert_eq!(view.scale, 1.0);
    }

    #[test]
    fn pinch_scales_by_distance_ratio() {
        let config = ViewConfig::default();
        let mut view = ViewTransform::new(&config);
        let mid = Point::new(200.0, 200.0);
        let before = view.screen_to_world(mid);
        assert!(view.pinch(100.0, mid, 150.0, mid));
        assert!((view.scale - 1.5).abs() < 1e-6);
        assert_close(view.screen_to_world(mid), before);
    }

    #[test]
    fn pinch_follows_midpoint_translation() {
        let config = ViewConfig::default();
        let mut view = ViewTransform::new(&config);
        assert!(view.pinch(100.0, Point::new(200.0, 200.0), 100.0, Point::new(230.0, 190.0)));
        assert_eq!(view.scale, 1.0);
        assert_close(view.offset(), Point::new(30.0, -10.0));
    }

    #[test]
    fn degenerate_pinch_is_ignored() {
        let mut view = ViewTransform::default();
        assert!(!view.pinch(0.0, Point::default(), 10.0, Point::default()));
        assert_eq!(view, ViewTransform::default());
    }
}
