//! Storage backends for sealed diagram documents.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::config::DiagramConfig;
use crate::diagram::Diagram;
use crate::persist::PersistError;
use crate::shapes::ShapeRegistry;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for document storage backends.
///
/// Backends store opaque sealed bytes under string ids. Integrity checking
/// happens when a document is loaded, not when it is read.
pub trait Storage: Send + Sync {
    /// Store a document, replacing any previous one under `id`.
    fn write(&self, id: &str, bytes: &[u8]) -> StorageResult<()>;

    /// Read a stored document.
    fn read(&self, id: &str) -> StorageResult<Vec<u8>>;

    /// Delete a document. Deleting a missing document is not an error.
    fn delete(&self, id: &str) -> StorageResult<()>;

    /// List all document IDs.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Check if a document exists.
    fn exists(&self, id: &str) -> StorageResult<bool>;

    /// Seal and store a diagram.
    fn save(&self, id: &str, diagram: &Diagram) -> StorageResult<()> {
        let bytes = diagram.save()?;
        self.write(id, &bytes)
    }

    /// Read, verify and rebuild a diagram.
    fn load(
        &self,
        id: &str,
        registry: &ShapeRegistry,
        config: DiagramConfig,
    ) -> StorageResult<Diagram> {
        let bytes = self.read(id)?;
        Ok(Diagram::load(&bytes, registry, config)?)
    }
}
