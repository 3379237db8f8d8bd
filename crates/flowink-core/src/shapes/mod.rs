//! Shape definitions for the diagram.

mod connector;
mod outline;
mod registry;

pub use connector::{Connector, ConnectorRole, EndpointRef};
pub use outline::Outline;
pub use registry::{ShapeFactory, ShapeRegistry, kinds};

use crate::entity::{Entity, EntityId, ShapeId, SiteId};
use crate::geometry::{ConnectorDirection, DiagramPoint};
use crate::render::PaintContext;
use kurbo::Rect;
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Default border color of a selected shape (yellow-green).
pub const DEFAULT_BORDER_SELECTED_COLOR: SerializableColor = SerializableColor::new(173, 255, 47, 255);

/// Which of the eight connector anchors a shape offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectorFlags {
    pub top_source: bool,
    pub right_source: bool,
    pub bottom_source: bool,
    pub left_source: bool,
    pub top_target: bool,
    pub right_target: bool,
    pub bottom_target: bool,
    pub left_target: bool,
}

impl ConnectorFlags {
    pub const fn all() -> Self {
        Self {
            top_source: true,
            right_source: true,
            bottom_source: true,
            left_source: true,
            top_target: true,
            right_target: true,
            bottom_target: true,
            left_target: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            top_source: false,
            right_source: false,
            bottom_source: false,
            left_source: false,
            top_target: false,
            right_target: false,
            bottom_target: false,
            left_target: false,
        }
    }

    /// Check whether the anchor for `direction` and `role` is enabled.
    pub fn is_enabled(&self, direction: ConnectorDirection, role: ConnectorRole) -> bool {
        match (direction, role) {
            (ConnectorDirection::Up, ConnectorRole::Source) => self.top_source,
            (ConnectorDirection::Right, ConnectorRole::Source) => self.right_source,
            (ConnectorDirection::Down, ConnectorRole::Source) => self.bottom_source,
            (ConnectorDirection::Left, ConnectorRole::Source) => self.left_source,
            (ConnectorDirection::Up, ConnectorRole::Target) => self.top_target,
            (ConnectorDirection::Right, ConnectorRole::Target) => self.right_target,
            (ConnectorDirection::Down, ConnectorRole::Target) => self.bottom_target,
            (ConnectorDirection::Left, ConnectorRole::Target) => self.left_target,
            (ConnectorDirection::None, _) => false,
        }
    }

    /// Enable or disable the anchor for `direction` and `role`.
    pub fn set(&mut self, direction: ConnectorDirection, role: ConnectorRole, enabled: bool) {
        let flag = match (direction, role) {
            (ConnectorDirection::Up, ConnectorRole::Source) => &mut self.top_source,
            (ConnectorDirection::Right, ConnectorRole::Source) => &mut self.right_source,
            (ConnectorDirection::Down, ConnectorRole::Source) => &mut self.bottom_source,
            (ConnectorDirection::Left, ConnectorRole::Source) => &mut self.left_source,
            (ConnectorDirection::Up, ConnectorRole::Target) => &mut self.top_target,
            (ConnectorDirection::Right, ConnectorRole::Target) => &mut self.right_target,
            (ConnectorDirection::Down, ConnectorRole::Target) => &mut self.bottom_target,
            (ConnectorDirection::Left, ConnectorRole::Target) => &mut self.left_target,
            (ConnectorDirection::None, _) => return,
        };
        *flag = enabled;
    }
}

impl Default for ConnectorFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// A box on the canvas that connections can be wired to.
#[derive(Debug, Clone)]
pub struct Shape {
    pub(crate) id: ShapeId,
    /// Registry key of the shape kind.
    pub(crate) kind: String,
    /// Outline geometry.
    pub outline: Outline,
    /// Top-left corner in world coordinates.
    pub position: DiagramPoint,
    pub width: i32,
    pub height: i32,
    /// Display text, drawn centered.
    pub text: String,
    pub fill_color: SerializableColor,
    pub border_color: SerializableColor,
    pub border_selected_color: SerializableColor,
    pub show_border: bool,
    pub connector_flags: ConnectorFlags,
    connectors: Vec<Connector>,
    selected: bool,
    hovered: bool,
    site: Option<SiteId>,
}

impl Shape {
    /// Number of connector anchors every shape carries.
    pub const CONNECTOR_COUNT: usize = 8;

    /// Create a new shape of the given kind at the origin.
    pub fn new(kind: impl Into<String>, outline: Outline, width: i32, height: i32) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            kind: kind.into(),
            outline,
            position: DiagramPoint::ORIGIN,
            width,
            height,
            text: String::new(),
            fill_color: SerializableColor::white(),
            border_color: SerializableColor::black(),
            border_selected_color: DEFAULT_BORDER_SELECTED_COLOR,
            show_border: true,
            connector_flags: ConnectorFlags::default(),
            connectors: Self::anchor_connectors(id),
            selected: false,
            hovered: false,
            site: None,
        }
    }

    /// Builder-style text setter.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder-style position setter.
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.position = DiagramPoint::new(x, y);
        self
    }

    fn anchor_connectors(id: ShapeId) -> Vec<Connector> {
        let mut connectors = Vec::with_capacity(Self::CONNECTOR_COUNT);
        for role in ConnectorRole::ALL {
            for direction in ConnectorDirection::EDGES {
                connectors.push(Connector::new(id, connectors.len(), direction, role));
            }
        }
        connectors
    }

    /// Index of the anchor for `direction` and `role` in [`Shape::connectors`].
    ///
    /// Sources come first, then targets; within a role the order is
    /// top, right, bottom, left.
    pub fn connector_index(direction: ConnectorDirection, role: ConnectorRole) -> Option<usize> {
        let edge = ConnectorDirection::EDGES
            .iter()
            .position(|&d| d == direction)?;
        let base = match role {
            ConnectorRole::Source => 0,
            ConnectorRole::Target => ConnectorDirection::EDGES.len(),
        };
        Some(base + edge)
    }

    /// Registry key of this shape's kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Replace the identifier (used when restoring persisted shapes).
    pub(crate) fn set_id(&mut self, id: ShapeId) {
        self.id = id;
        for connector in &mut self.connectors {
            connector.shape = id;
        }
    }

    pub(crate) fn set_kind(&mut self, kind: &str) {
        kind.clone_into(&mut self.kind);
    }

    /// Get the bounding box in world coordinates.
    pub fn bounds(&self) -> Rect {
        let x = self.position.x as f64;
        let y = self.position.y as f64;
        Rect::new(x, y, x + self.width as f64, y + self.height as f64)
    }

    /// Check if a world point hits this shape.
    pub fn hit(&self, point: DiagramPoint) -> bool {
        self.outline.contains(self.bounds(), point.to_kurbo())
    }

    /// The connector list, in anchor order.
    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn connector(&self, index: usize) -> Option<&Connector> {
        self.connectors.get(index)
    }

    pub(crate) fn connector_mut(&mut self, index: usize) -> Option<&mut Connector> {
        self.connectors.get_mut(index)
    }

    /// Whether the connector at `index` is offered by this shape.
    pub fn is_connector_enabled(&self, index: usize) -> bool {
        self.connectors
            .get(index)
            .is_some_and(|c| self.connector_flags.is_enabled(c.direction, c.role))
    }

    /// World position of the connector at `index`, tagged with its direction.
    ///
    /// Sources sit one third along their edge and targets two thirds, so the
    /// two anchors on the same side never overlap.
    pub fn connector_point(&self, index: usize) -> Option<DiagramPoint> {
        let connector = self.connectors.get(index)?;
        let thirds = match connector.role {
            ConnectorRole::Source => 1,
            ConnectorRole::Target => 2,
        };
        let (w, h) = (self.width, self.height);
        let (dx, dy) = match connector.direction {
            ConnectorDirection::Up => (w.saturating_mul(thirds) / 3, 0),
            ConnectorDirection::Down => (w.saturating_mul(thirds) / 3, h),
            ConnectorDirection::Left => (0, h.saturating_mul(thirds) / 3),
            ConnectorDirection::Right => (w, h.saturating_mul(thirds) / 3),
            ConnectorDirection::None => return None,
        };
        Some(
            self.position
                .translate(dx, dy)
                .with_direction(connector.direction),
        )
    }

    /// Find an enabled connector within `radius` of `point`.
    ///
    /// `role` restricts the search to one role; `free_only` skips connectors
    /// that already hold an endpoint.
    pub fn hit_connector(
        &self,
        point: DiagramPoint,
        radius: f64,
        role: Option<ConnectorRole>,
        free_only: bool,
    ) -> Option<usize> {
        let target = point.to_kurbo();
        self.connectors
            .iter()
            .filter(|c| role.is_none_or(|r| c.role == r))
            .filter(|c| !free_only || c.is_free())
            .filter(|c| self.connector_flags.is_enabled(c.direction, c.role))
            .find(|c| {
                self.connector_point(c.index)
                    .is_some_and(|p| p.to_kurbo().distance(target) <= radius)
            })
            .map(|c| c.index)
    }

}

impl Entity for Shape {
    fn id(&self) -> EntityId {
        self.id
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    fn is_hovered(&self) -> bool {
        self.hovered
    }

    fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    fn site(&self) -> Option<SiteId> {
        self.site
    }

    fn set_site(&mut self, site: Option<SiteId>) {
        self.site = site;
        for connector in &mut self.connectors {
            connector.set_site(site);
        }
    }

    fn translate(&mut self, dx: i32, dy: i32) {
        self.position = self.position.translate(dx, dy);
    }

    fn paint(&self, ctx: &mut PaintContext<'_>) {
        let path = ctx.path_to_screen(&self.outline.to_path(self.bounds()));
        ctx.surface.fill_path(&path, self.fill_color.into());

        if self.show_border || self.selected {
            let (color, width) = if self.selected {
                (self.border_selected_color, 2.0)
            } else if self.hovered {
                (self.border_color, 2.0)
            } else {
                (self.border_color, 1.0)
            };
            ctx.surface.stroke_path(&path, color.into(), width);
        }

        if !self.text.is_empty() {
            let bounds = ctx.rect_to_screen(self.bounds());
            ctx.surface.text(&self.text, bounds, self.border_color.into());
        }

        // Anchors are only shown while they can be used: on the selected
        // shape, or where a dragged endpoint is hovering.
        for connector in &self.connectors {
            if !self.connector_flags.is_enabled(connector.direction, connector.role) {
                continue;
            }
            if self.selected || connector.is_hovered() {
                connector.paint(ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_shape() -> Shape {
        Shape::new(kinds::RECTANGLE, Outline::Rectangle, 90, 60).at(10, 20)
    }

    #[test]
    fn test_shape_creation() {
        let shape = rect_shape();
        assert_eq!(shape.kind(), kinds::RECTANGLE);
        assert_eq!(shape.connectors().len(), Shape::CONNECTOR_COUNT);
        assert!(shape.show_border);
        assert_eq!(shape.connector_flags, ConnectorFlags::all());
    }

    #[test]
    fn test_connectors_refer_back_to_shape() {
        let shape = rect_shape();
        for (i, connector) in shape.connectors().iter().enumerate() {
            assert_eq!(connector.shape(), shape.id());
            assert_eq!(connector.index(), i);
        }
    }

    #[test]
    fn test_set_id_updates_connectors() {
        let mut shape = rect_shape();
        let id = Uuid::new_v4();
        shape.set_id(id);
        assert!(shape.connectors().iter().all(|c| c.shape() == id));
    }

    #[test]
    fn test_connector_index_layout() {
        assert_eq!(
            Shape::connector_index(ConnectorDirection::Up, ConnectorRole::Source),
            Some(0)
        );
        assert_eq!(
            Shape::connector_index(ConnectorDirection::Right, ConnectorRole::Source),
            Some(1)
        );
        assert_eq!(
            Shape::connector_index(ConnectorDirection::Left, ConnectorRole::Target),
            Some(7)
        );
        assert_eq!(
            Shape::connector_index(ConnectorDirection::None, ConnectorRole::Target),
            None
        );
        let shape = rect_shape();
        let idx = Shape::connector_index(ConnectorDirection::Down, ConnectorRole::Target).unwrap();
        let connector = shape.connector(idx).unwrap();
        assert_eq!(connector.direction, ConnectorDirection::Down);
        assert_eq!(connector.role, ConnectorRole::Target);
    }

    #[test]
    fn test_connector_points() {
        let shape = rect_shape();
        let right_source =
            Shape::connector_index(ConnectorDirection::Right, ConnectorRole::Source).unwrap();
        let right_target =
            Shape::connector_index(ConnectorDirection::Right, ConnectorRole::Target).unwrap();
        let top_source =
            Shape::connector_index(ConnectorDirection::Up, ConnectorRole::Source).unwrap();
        assert_eq!(
            shape.connector_point(right_source),
            Some(DiagramPoint::new(100, 40).with_direction(ConnectorDirection::Right))
        );
        assert_eq!(
            shape.connector_point(right_target),
            Some(DiagramPoint::new(100, 60).with_direction(ConnectorDirection::Right))
        );
        assert_eq!(
            shape.connector_point(top_source),
            Some(DiagramPoint::new(40, 20).with_direction(ConnectorDirection::Up))
        );
        assert_eq!(shape.connector_point(99), None);
    }

    #[test]
    fn test_connector_point_follows_shape() {
        let mut shape = rect_shape();
        let idx = Shape::connector_index(ConnectorDirection::Left, ConnectorRole::Target).unwrap();
        let before = shape.connector_point(idx).unwrap();
        shape.translate(15, -5);
        let after = shape.connector_point(idx).unwrap();
        assert_eq!(after - before, crate::geometry::Offset::new(15, -5));
    }

    #[test]
    fn test_hit() {
        let shape = rect_shape();
        assert!(shape.hit(DiagramPoint::new(50, 50)));
        assert!(!shape.hit(DiagramPoint::new(5, 50)));
        assert!(!shape.hit(DiagramPoint::new(50, 100)));
    }

    #[test]
    fn test_hit_connector_respects_flags_and_role() {
        let mut shape = rect_shape();
        let at_right_source = DiagramPoint::new(102, 41);
        let idx = Shape::connector_index(ConnectorDirection::Right, ConnectorRole::Source);
        assert_eq!(shape.hit_connector(at_right_source, 5.0, None, true), idx);
        assert_eq!(
            shape.hit_connector(at_right_source, 5.0, Some(ConnectorRole::Target), true),
            None
        );

        shape
            .connector_flags
            .set(ConnectorDirection::Right, ConnectorRole::Source, false);
        assert_eq!(shape.hit_connector(at_right_source, 5.0, None, true), None);
    }

    #[test]
    fn test_hit_connector_skips_occupied() {
        let mut shape = rect_shape();
        let idx = Shape::connector_index(ConnectorDirection::Up, ConnectorRole::Source).unwrap();
        shape.connector_mut(idx).unwrap().attached = Some(EndpointRef {
            connection: Uuid::new_v4(),
            end: crate::entity::End::From,
        });
        let point = shape.connector_point(idx).unwrap();
        assert_eq!(shape.hit_connector(point, 3.0, None, true), None);
        assert_eq!(shape.hit_connector(point, 3.0, None, false), Some(idx));
    }

    #[test]
    fn test_flags_roundtrip_set() {
        let mut flags = ConnectorFlags::none();
        for role in ConnectorRole::ALL {
            for direction in ConnectorDirection::EDGES {
                assert!(!flags.is_enabled(direction, role));
                flags.set(direction, role, true);
                assert!(flags.is_enabled(direction, role));
            }
        }
        assert_eq!(flags, ConnectorFlags::all());
    }
}
