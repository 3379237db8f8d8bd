//! Errors raised by diagram mutations.

use crate::entity::{ConnectionId, EntityId, ShapeId};
use thiserror::Error;

/// Diagram errors.
#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("Duplicate entity id: {0}")]
    DuplicateId(EntityId),
    #[error("Unknown shape kind: {0}")]
    UnknownShapeKind(String),
    #[error("Shape not found: {0}")]
    ShapeNotFound(ShapeId),
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),
    #[error("Connector {index} not found on shape {shape}")]
    ConnectorNotFound { shape: ShapeId, index: usize },
    #[error("Connector {index} on shape {shape} is disabled")]
    ConnectorDisabled { shape: ShapeId, index: usize },
    #[error("Connector {index} on shape {shape} does not accept the {end} endpoint")]
    RoleMismatch {
        shape: ShapeId,
        index: usize,
        end: crate::entity::End,
    },
    #[error("Connector {index} on shape {shape} is already occupied")]
    ConnectorOccupied { shape: ShapeId, index: usize },
}

/// Result type for diagram operations.
pub type DiagramResult<T> = Result<T, DiagramError>;
