//! FlowInk Core Library
//!
//! Diagram interaction engine: shapes with connector anchors, connections
//! wired between them, hit-testing, pointer gestures and signed persistence.
//! Drawing goes through the [`Surface`] trait so any backend can host it.

pub mod collections;
pub mod config;
pub mod connection;
pub mod diagram;
pub mod entity;
pub mod error;
pub mod events;
pub mod geometry;
pub mod hit;
pub mod input;
pub mod interaction;
pub mod persist;
pub mod render;
pub mod shapes;
pub mod storage;

pub use collections::{ConnectionCollection, EntityCollection, ShapeCollection};
pub use config::{ConfigError, DiagramConfig};
pub use connection::{Attachment, Connection, Endpoint};
pub use diagram::Diagram;
pub use entity::{ConnectionId, End, Entity, EntityId, EntityRef, ShapeId, SiteId};
pub use error::{DiagramError, DiagramResult};
pub use events::{DeletingArgs, DiagramEvent, DiagramListener, EventLog};
pub use geometry::{ConnectorDirection, DiagramPoint, Offset};
pub use input::{Key, KeyEvent, MouseButton, PointerEvent};
pub use interaction::{DragTarget, InteractionState};
pub use persist::{
    DiagramRecord, ImportOptions, ImportSummary, IntegrityError, PersistError, PersistResult,
};
pub use render::{DrawCommand, LinePalette, RecordingSurface, Surface};
pub use shapes::{
    Connector, ConnectorFlags, ConnectorRole, Outline, SerializableColor, Shape, ShapeRegistry,
};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
