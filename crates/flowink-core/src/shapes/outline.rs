//! Outline geometry for shape kinds.

use kurbo::{BezPath, Ellipse, Point, Rect, RoundedRect, Shape as KurboShape};

/// Geometric outline of a shape, evaluated inside its bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outline {
    Rectangle,
    RoundedRectangle { radius: f64 },
    Ellipse,
    Diamond,
}

impl Outline {
    /// Check if a point lies inside the outline drawn in `bounds`.
    pub fn contains(&self, bounds: Rect, point: Point) -> bool {
        if !bounds.contains(point) {
            return false;
        }
        match *self {
            Outline::Rectangle => true,
            Outline::RoundedRectangle { radius } => {
                RoundedRect::from_rect(bounds, radius).contains(point)
            }
            Outline::Ellipse => Ellipse::from_rect(bounds).contains(point),
            Outline::Diamond => {
                let center = bounds.center();
                let half_w = bounds.width() / 2.0;
                let half_h = bounds.height() / 2.0;
                if half_w <= 0.0 || half_h <= 0.0 {
                    return false;
                }
                (point.x - center.x).abs() / half_w + (point.y - center.y).abs() / half_h <= 1.0
            }
        }
    }

    /// Get the path representation for rendering.
    pub fn to_path(&self, bounds: Rect) -> BezPath {
        match *self {
            Outline::Rectangle => bounds.to_path(0.1),
            Outline::RoundedRectangle { radius } => {
                RoundedRect::from_rect(bounds, radius).to_path(0.1)
            }
            Outline::Ellipse => Ellipse::from_rect(bounds).to_path(0.1),
            Outline::Diamond => {
                let center = bounds.center();
                let mut path = BezPath::new();
                path.move_to(Point::new(center.x, bounds.y0));
                path.line_to(Point::new(bounds.x1, center.y));
                path.line_to(Point::new(center.x, bounds.y1));
                path.line_to(Point::new(bounds.x0, center.y));
                path.close_path();
                path
            }
        }
    }
}
