//! Drawing surface abstraction.
//!
//! The engine never talks to a graphics backend directly. Entities paint
//! themselves through [`Surface`], in screen coordinates, and a host provides
//! the implementation (a GPU scene builder, an SVG writer, a test recorder).

use crate::collections::ShapeCollection;
use crate::geometry::DiagramPoint;
use crate::shapes::SerializableColor;
use kurbo::{Affine, BezPath, Point, Rect, Size, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Stroke width used for connection lines.
pub const LINE_WIDTH: f64 = 2.0;
/// Radius of the marker drawn at connection endpoints.
pub const ENDPOINT_MARKER_RADIUS: f64 = 3.0;
/// Radius of the marker drawn at shape connectors.
pub const CONNECTOR_MARKER_RADIUS: f64 = 4.0;
/// Radius of grid dots.
pub const GRID_DOT_RADIUS: f64 = 0.5;

/// Trait for drawing backends.
pub trait Surface {
    /// Fill a closed path.
    fn fill_path(&mut self, path: &BezPath, color: Color);

    /// Stroke a path outline.
    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64);

    /// Draw a straight line.
    fn line(&mut self, from: Point, to: Point, color: Color, width: f64);

    /// Draw a filled circular marker.
    fn dot(&mut self, center: Point, radius: f64, color: Color);

    /// Draw text centered in `bounds`.
    fn text(&mut self, text: &str, bounds: Rect, color: Color);
}

/// Colors used to draw connection lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePalette {
    pub line: SerializableColor,
    pub selected: SerializableColor,
    pub hovered: SerializableColor,
}

impl LinePalette {
    /// Pick the line color for an entity state. Selection wins over hover.
    pub fn pick(&self, selected: bool, hovered: bool) -> Color {
        if selected {
            self.selected.into()
        } else if hovered {
            self.hovered.into()
        } else {
            self.line.into()
        }
    }
}

impl Default for LinePalette {
    fn default() -> Self {
        Self {
            line: SerializableColor::new(192, 192, 192, 255),
            selected: SerializableColor::new(0, 128, 0, 255),
            hovered: SerializableColor::new(0, 0, 255, 255),
        }
    }
}

/// Context for a single paint pass.
pub struct PaintContext<'a> {
    /// Target surface.
    pub surface: &'a mut dyn Surface,
    /// Shapes, for resolving attached connection endpoints.
    pub shapes: &'a ShapeCollection,
    /// Line colors.
    pub palette: LinePalette,
    /// World to screen transform (the view origin translation).
    pub transform: Affine,
}

impl<'a> PaintContext<'a> {
    pub fn new(
        surface: &'a mut dyn Surface,
        shapes: &'a ShapeCollection,
        palette: LinePalette,
        view_origin: DiagramPoint,
    ) -> Self {
        Self {
            surface,
            shapes,
            palette,
            transform: Affine::translate(Vec2::new(view_origin.x as f64, view_origin.y as f64)),
        }
    }

    /// Convert a world position to screen coordinates.
    pub fn to_screen(&self, point: DiagramPoint) -> Point {
        self.transform * point.to_kurbo()
    }

    /// Convert a world rectangle to screen coordinates.
    pub fn rect_to_screen(&self, rect: Rect) -> Rect {
        self.transform.transform_rect_bbox(rect)
    }

    /// Convert a world path to screen coordinates.
    pub fn path_to_screen(&self, path: &BezPath) -> BezPath {
        let mut path = path.clone();
        path.apply_affine(self.transform);
        path
    }
}

/// Paint a dot grid covering `viewport`, aligned to the view origin.
pub fn paint_grid(
    surface: &mut dyn Surface,
    viewport: Size,
    view_origin: DiagramPoint,
    grid_size: i32,
    color: Color,
) {
    if grid_size <= 0 {
        return;
    }
    let step = grid_size as f64;
    let start_x = (view_origin.x.rem_euclid(grid_size)) as f64;
    let start_y = (view_origin.y.rem_euclid(grid_size)) as f64;
    let mut y = start_y;
    while y <= viewport.height {
        let mut x = start_x;
        while x <= viewport.width {
            surface.dot(Point::new(x, y), GRID_DOT_RADIUS, color);
            x += step;
        }
        y += step;
    }
}

/// A single recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillPath { bounds: Rect, color: SerializableColor },
    StrokePath { bounds: Rect, color: SerializableColor, width: f64 },
    Line { from: Point, to: Point, color: SerializableColor, width: f64 },
    Dot { center: Point, radius: f64, color: SerializableColor },
    Text { text: String, bounds: Rect, color: SerializableColor },
}

/// Surface that records draw calls instead of rasterizing them.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded draw calls.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Recorded text draws, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn fill_path(&mut self, path: &BezPath, color: Color) {
        use kurbo::Shape as _;
        self.commands.push(DrawCommand::FillPath {
            bounds: path.bounding_box(),
            color: color.into(),
        });
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64) {
        use kurbo::Shape as _;
        self.commands.push(DrawCommand::StrokePath {
            bounds: path.bounding_box(),
            color: color.into(),
            width,
        });
    }

    fn line(&mut self, from: Point, to: Point, color: Color, width: f64) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color: color.into(),
            width,
        });
    }

    fn dot(&mut self, center: Point, radius: f64, color: Color) {
        self.commands.push(DrawCommand::Dot {
            center,
            radius,
            color: color.into(),
        });
    }

    fn text(&mut self, text: &str, bounds: Rect, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            bounds,
            color: color.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_priority() {
        let palette = LinePalette::default();
        let pick = |selected, hovered| SerializableColor::from(palette.pick(selected, hovered));
        assert_eq!(pick(true, true), palette.selected);
        assert_eq!(pick(false, true), palette.hovered);
        assert_eq!(pick(false, false), palette.line);
    }

    #[test]
    fn test_grid_dots_follow_origin() {
        let mut surface = RecordingSurface::new();
        paint_grid(
            &mut surface,
            Size::new(20.0, 20.0),
            DiagramPoint::new(15, 0),
            10,
            Color::from_rgba8(0, 0, 0, 255),
        );
        // x in {5, 15}, y in {0, 10, 20}
        assert_eq!(surface.len(), 6);
        match &surface.commands[0] {
            DrawCommand::Dot { center, .. } => assert_eq!(*center, Point::new(5.0, 0.0)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_grid_disabled_for_non_positive_size() {
        let mut surface = RecordingSurface::new();
        paint_grid(
            &mut surface,
            Size::new(100.0, 100.0),
            DiagramPoint::ORIGIN,
            0,
            Color::from_rgba8(0, 0, 0, 255),
        );
        assert!(surface.is_empty());
    }
}
