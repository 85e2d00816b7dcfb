use crate::geometry::{Point, Rect};

/// Control points are pushed this fraction of the endpoint distance away
/// from each endpoint, up to [`MAX_CURVATURE`].
pub const CURVATURE_RATIO: f32 = 0.3;
pub const MAX_CURVATURE: f32 = 100.0;

/// Cubic S-curve from the bottom-center of a parent box to the top-center of
/// a child box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCurve {
    pub start: Point,
    pub cp1: Point,
    pub cp2: Point,
    pub end: Point,
}

impl EdgeCurve {
    pub fn between(parent: &Rect, child: &Rect) -> Self {
        Self::from_endpoints(parent.bottom_center(), child.top_center())
    }

    pub fn from_endpoints(start: Point, end: Point) -> Self {
        let curvature = (start.distance(end) * CURVATURE_RATIO).min(MAX_CURVATURE);
        Self {
            start,
            cp1: Point::new(start.x, start.y + curvature),
            cp2: Point::new(end.x, end.y - curvature),
            end,
        }
    }

    /// Direction the curve arrives at `end`, from the second control point.
    pub fn arrow_angle(&self) -> f32 {
        (self.end.y - self.cp2.y).atan2(self.end.x - self.cp2.x)
    }

    /// Triangle vertices for an arrowhead with its tip at the origin, pointing
    /// along +x. Callers translate to `end` and rotate by [`Self::arrow_angle`].
    pub fn arrowhead(length: f32, half_angle: f32) -> [Point; 3] {
        [
            Point::new(0.0, 0.0),
            Point::new(-length * half_angle.cos(), -length * half_angle.sin()),
            Point::new(-length * (-half_angle).cos(), -length * (-half_angle).sin()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_6};

    #[test]
    fn vertical_edge_points_straight_down() {
        let parent = Rect { x: 50.0, y: 100.0, width: 200.0, height: 80.0 };
        let child = Rect { x: 50.0, y: 300.0, width: 200.0, height: 80.0 };
        let curve = EdgeCurve::between(&parent, &child);
        assert_eq!(curve.start, Point::new(150.0, 180.0));
        assert_eq!(curve.end, Point::new(150.0, 300.0));
        assert_eq!(curve.cp1.x, 150.0);
        assert_eq!(curve.cp2.x, 150.0);
        assert!((curve.cp1.y - 216.0).abs() < 1e-4);
        assert!((curve.cp2.y - 264.0).abs() < 1e-4);
        assert!((curve.arrow_angle() - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn curvature_is_capped() {
        let curve = EdgeCurve::from_endpoints(Point::new(0.0, 0.0), Point::new(0.0, 1000.0));
        assert_eq!(curve.cp1, Point::new(0.0, 100.0));
        assert_eq!(curve.cp2, Point::new(0.0, 900.0));
    }

    #[test]
    fn diagonal_edge_keeps_vertical_tangents() {
        let curve = EdgeCurve::from_endpoints(Point::new(0.0, 0.0), Point::new(300.0, 400.0));
        // distance 500, curvature capped at 100
        assert_eq!(curve.cp1, Point::new(0.0, 100.0));
        assert_eq!(curve.cp2, Point::new(300.0, 300.0));
        assert!((curve.arrow_angle() - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn arrowhead_is_symmetric() {
        let [tip, left, right] = EdgeCurve::arrowhead(15.0, FRAC_PI_6);
        assert_eq!(tip, Point::new(0.0, 0.0));
        assert!((left.x - right.x).abs() < 1e-6);
        assert!((left.y + right.y).abs() < 1e-6);
        assert!((left.x + 15.0 * FRAC_PI_6.cos()).abs() < 1e-5);
    }
}
