//! Entity identity and the capability set shared by everything on the canvas.

use crate::render::PaintContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for entities. Stable across save/load.
pub type EntityId = Uuid;

/// Unique identifier for shapes.
pub type ShapeId = EntityId;

/// Unique identifier for connections.
pub type ConnectionId = EntityId;

/// Identifies the diagram surface that owns an entity.
///
/// Entities carry this instead of a pointer back to the diagram; it is used
/// to tell which surface an entity was added to, never to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteId(Uuid);

impl SiteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SiteId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum End {
    From,
    To,
}

impl fmt::Display for End {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            End::From => f.write_str("from"),
            End::To => f.write_str("to"),
        }
    }
}

/// Address of an entity inside a diagram.
///
/// `None` wherever an `Option<EntityRef>` is used means "the canvas itself".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Shape(ShapeId),
    Connector { shape: ShapeId, index: usize },
    Connection(ConnectionId),
    Endpoint { connection: ConnectionId, end: End },
}

impl EntityRef {
    /// Whether this reference points at (or into) the given shape.
    pub fn belongs_to_shape(&self, id: ShapeId) -> bool {
        match *self {
            EntityRef::Shape(shape) | EntityRef::Connector { shape, .. } => shape == id,
            _ => false,
        }
    }

    /// Whether this reference points at (or into) the given connection.
    pub fn belongs_to_connection(&self, id: ConnectionId) -> bool {
        match *self {
            EntityRef::Connection(connection) | EntityRef::Endpoint { connection, .. } => {
                connection == id
            }
            _ => false,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Shape(id) => write!(f, "shape {id}"),
            EntityRef::Connector { shape, index } => write!(f, "connector {index} of shape {shape}"),
            EntityRef::Connection(id) => write!(f, "connection {id}"),
            EntityRef::Endpoint { connection, end } => {
                write!(f, "{end} endpoint of connection {connection}")
            }
        }
    }
}

/// Capabilities shared by every entity on the canvas.
pub trait Entity {
    /// Get the unique identifier.
    fn id(&self) -> EntityId;

    fn is_selected(&self) -> bool;

    fn set_selected(&mut self, selected: bool);

    fn is_hovered(&self) -> bool;

    fn set_hovered(&mut self, hovered: bool);

    /// The surface this entity was added to, if any.
    fn site(&self) -> Option<SiteId>;

    fn set_site(&mut self, site: Option<SiteId>);

    /// Move by a delta in world units.
    fn translate(&mut self, dx: i32, dy: i32);

    /// Draw onto the paint context's surface.
    fn paint(&self, ctx: &mut PaintContext<'_>);
}
