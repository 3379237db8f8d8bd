//! Spatial queries: which entity lies under a world position.
//!
//! Everything here is pure. The interaction layer decides what a hit means.

use crate::collections::{ConnectionCollection, ShapeCollection};
use crate::config::DiagramConfig;
use crate::entity::{End, Entity, EntityRef, ShapeId};
use crate::geometry::DiagramPoint;
use crate::shapes::ConnectorRole;

/// Pick radii used by [`hit_test`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRadii {
    pub connector: f64,
    pub endpoint: f64,
    pub line: f64,
}

impl From<&DiagramConfig> for HitRadii {
    fn from(config: &DiagramConfig) -> Self {
        Self {
            connector: config.connector_hit_radius,
            endpoint: config.endpoint_hit_radius,
            line: config.line_hit_radius,
        }
    }
}

/// Find the entity under `point`.
///
/// Priority: shape outlines (collection order), then the free source
/// connectors of `selected_shape`, then connections (line, `from`, `to`).
pub fn hit_test(
    shapes: &ShapeCollection,
    connections: &ConnectionCollection,
    selected_shape: Option<ShapeId>,
    point: DiagramPoint,
    radii: HitRadii,
) -> Option<EntityRef> {
    if let Some(shape) = shapes.iter().find(|s| s.hit(point)) {
        return Some(EntityRef::Shape(shape.id()));
    }

    // Only sources spawn connections, and only where nothing is wired yet.
    if let Some(shape) = selected_shape.and_then(|id| shapes.get(id)) {
        if let Some(index) =
            shape.hit_connector(point, radii.connector, Some(ConnectorRole::Source), true)
        {
            return Some(EntityRef::Connector {
                shape: shape.id(),
                index,
            });
        }
    }

    for connection in connections {
        if connection.hit_line(point, shapes, radii.line, radii.endpoint) {
            return Some(EntityRef::Connection(connection.id()));
        }
        for end in [End::From, End::To] {
            if connection.endpoint(end).hit(point, shapes, radii.endpoint) {
                return Some(EntityRef::Endpoint {
                    connection: connection.id(),
                    end,
                });
            }
        }
    }

    None
}

/// Find the first shape connector within `radius` of `point`.
///
/// Shapes are searched in collection order. `role` and `free_only` narrow the
/// candidates the same way as [`Shape::hit_connector`](crate::shapes::Shape::hit_connector).
pub fn connector_at(
    shapes: &ShapeCollection,
    point: DiagramPoint,
    radius: f64,
    role: Option<ConnectorRole>,
    free_only: bool,
) -> Option<EntityRef> {
    shapes.iter().find_map(|shape| {
        shape
            .hit_connector(point, radius, role, free_only)
            .map(|index| EntityRef::Connector {
                shape: shape.id(),
                index,
            })
    })
}
