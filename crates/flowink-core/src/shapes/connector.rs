//! Connector anchors on shape edges.

use crate::entity::{ConnectionId, End, Entity, EntityId, ShapeId, SiteId};
use crate::geometry::ConnectorDirection;
use crate::render::{CONNECTOR_MARKER_RADIUS, PaintContext};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a connector can be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorRole {
    /// Connections start here (the `from` endpoint attaches).
    Source,
    /// Connections end here (the `to` endpoint attaches).
    Target,
}

impl ConnectorRole {
    pub const ALL: [ConnectorRole; 2] = [ConnectorRole::Source, ConnectorRole::Target];

    /// The role an endpoint needs to attach to.
    pub fn for_end(end: End) -> Self {
        match end {
            End::From => ConnectorRole::Source,
            End::To => ConnectorRole::Target,
        }
    }
}

/// A connection endpoint that is attached to a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointRef {
    pub connection: ConnectionId,
    pub end: End,
}

/// A fixed anchor point on one edge of a shape.
///
/// The position is not stored: it is derived from the owning shape's bounds
/// every time it is needed, so moving the shape moves every wire attached to it.
#[derive(Debug, Clone)]
pub struct Connector {
    pub(crate) id: EntityId,
    pub(crate) shape: ShapeId,
    pub(crate) index: usize,
    pub direction: ConnectorDirection,
    pub role: ConnectorRole,
    pub(crate) attached: Option<EndpointRef>,
    hovered: bool,
    selected: bool,
    site: Option<SiteId>,
}

impl Connector {
    pub(crate) fn new(
        shape: ShapeId,
        index: usize,
        direction: ConnectorDirection,
        role: ConnectorRole,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            shape,
            index,
            direction,
            role,
            attached: None,
            hovered: false,
            selected: false,
            site: None,
        }
    }

    /// The shape this connector belongs to.
    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    /// Position in the owning shape's connector list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The endpoint currently attached here, if any.
    pub fn attached(&self) -> Option<EndpointRef> {
        self.attached
    }

    pub fn is_free(&self) -> bool {
        self.attached.is_none()
    }
}

impl Entity for Connector {
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
    }

    /// Connectors follow their shape; they cannot be moved on their own.
    fn translate(&mut self, _dx: i32, _dy: i32) {}

    fn paint(&self, ctx: &mut PaintContext<'_>) {
        let Some(shape) = ctx.shapes.get(self.shape) else {
            return;
        };
        let Some(point) = shape.connector_point(self.index) else {
            return;
        };
        let color = if self.hovered {
            ctx.palette.hovered.into()
        } else {
            shape.border_color.into()
        };
        let center = ctx.to_screen(point);
        ctx.surface.dot(center, CONNECTOR_MARKER_RADIUS, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_for_end() {
        assert_eq!(ConnectorRole::for_end(End::From), ConnectorRole::Source);
        assert_eq!(ConnectorRole::for_end(End::To), ConnectorRole::Target);
    }

    #[test]
    fn test_new_connector_is_free() {
        let connector = Connector::new(
            Uuid::new_v4(),
            3,
            ConnectorDirection::Left,
            ConnectorRole::Source,
        );
        assert!(connector.is_free());
        assert_eq!(connector.index(), 3);
        assert!(!connector.is_hovered());
    }
}
