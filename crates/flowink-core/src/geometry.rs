//! Integer diagram coordinates and small geometric helpers.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;

/// Preferred exit side of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectorDirection {
    #[default]
    None,
    Up,
    Right,
    Left,
    Down,
}

impl ConnectorDirection {
    /// The four edge directions in anchor order (clockwise from the top).
    pub const EDGES: [ConnectorDirection; 4] = [
        ConnectorDirection::Up,
        ConnectorDirection::Right,
        ConnectorDirection::Down,
        ConnectorDirection::Left,
    ];
}

/// Integer (x, y) position with a direction tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DiagramPoint {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub direction: ConnectorDirection,
}

impl DiagramPoint {
    pub const ORIGIN: DiagramPoint = DiagramPoint {
        x: 0,
        y: 0,
        direction: ConnectorDirection::None,
    };

    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            direction: ConnectorDirection::None,
        }
    }

    /// Copy of this point carrying `direction`.
    pub fn with_direction(self, direction: ConnectorDirection) -> Self {
        Self { direction, ..self }
    }

    /// Return a new point moved by `(dx, dy)`, clamped to the `i32` range.
    /// The direction tag is kept.
    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            direction: self.direction,
        }
    }

    /// Move by an [`Offset`].
    pub fn offset(self, offset: Offset) -> Self {
        self.translate(offset.dx, offset.dy)
    }

    /// Convert to a floating point kurbo point.
    pub fn to_kurbo(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }

    /// Round a kurbo point to the nearest integer position.
    pub fn from_kurbo(point: Point) -> Self {
        Self::new(point.x.round() as i32, point.y.round() as i32)
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: DiagramPoint) -> f64 {
        self.to_kurbo().distance(other.to_kurbo())
    }
}

impl fmt::Display for DiagramPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Integer displacement between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

impl Sub for DiagramPoint {
    type Output = Offset;

    fn sub(self, rhs: DiagramPoint) -> Offset {
        Offset::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    point.distance(proj)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_keeps_direction() {
        let p = DiagramPoint::new(10, 20).with_direction(ConnectorDirection::Left);
        let moved = p.translate(5, -3);
        assert_eq!(moved.x, 15);
        assert_eq!(moved.y, 17);
        assert_eq!(moved.direction, ConnectorDirection::Left);
        // Original is untouched.
        assert_eq!(p.x, 10);
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(DiagramPoint::new(1, 2), DiagramPoint::new(1, 2));
        assert_ne!(
            DiagramPoint::new(1, 2),
            DiagramPoint::new(1, 2).with_direction(ConnectorDirection::Up)
        );
    }

    #[test]
    fn test_sub_gives_offset() {
        let delta = DiagramPoint::new(30, 40) - DiagramPoint::new(10, 5);
        assert_eq!(delta, Offset::new(20, 35));
        assert_eq!(DiagramPoint::new(10, 5).offset(delta), DiagramPoint::new(30, 40));
    }

    #[test]
    fn test_arithmetic_saturates() {
        let far = DiagramPoint::new(i32::MAX - 10, i32::MIN + 10);
        assert_eq!(far.translate(100, -100), DiagramPoint::new(i32::MAX, i32::MIN));
        let delta = far - DiagramPoint::new(-100, 100);
        assert_eq!(delta, Offset::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn test_from_kurbo_rounds() {
        let p = DiagramPoint::from_kurbo(Point::new(10.6, -2.4));
        assert_eq!(p, DiagramPoint::new(11, -2));
    }

    #[test]
    fn test_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((point_to_segment_dist(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-9);
        assert!((point_to_segment_dist(Point::new(-4.0, 3.0), a, b) - 5.0).abs() < 1e-9);
        // Degenerate segment
        assert!((point_to_segment_dist(Point::new(3.0, 4.0), a, a) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_display() {
        assert_eq!(DiagramPoint::new(-3, 7).to_string(), "-3,7");
    }
}
