//! Saving and restoring diagrams.
//!
//! A diagram is projected into a [`DiagramRecord`], written as pretty JSON and
//! sealed with a signature trailer (see [`signature`]). Loading verifies the
//! trailer before anything is parsed, then rebuilds every shape from the
//! [`ShapeRegistry`] by its kind key and rewires connections by
//! (shape id, connector index).

pub mod signature;

pub use signature::IntegrityError;

use crate::config::DiagramConfig;
use crate::connection::{Connection, Endpoint};
use crate::diagram::Diagram;
use crate::entity::{ConnectionId, End, Entity, EntityId, ShapeId};
use crate::error::DiagramError;
use crate::geometry::DiagramPoint;
use crate::render::LinePalette;
use crate::shapes::{ConnectorFlags, SerializableColor, Shape, ShapeRegistry};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error("Invalid diagram data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u32),
    #[error("Unknown shape kind: {0}")]
    UnknownShapeKind(String),
    #[error(transparent)]
    Diagram(#[from] DiagramError),
}

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

fn default_grid_size() -> i32 {
    DiagramConfig::default().grid_size
}

/// Persisted form of a whole diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramRecord {
    pub format_version: u32,
    pub view_origin: DiagramPoint,
    pub line_color: SerializableColor,
    pub selected_line_color: SerializableColor,
    pub hovered_line_color: SerializableColor,
    pub background_color: SerializableColor,
    pub show_grid: bool,
    #[serde(default = "default_grid_size")]
    pub grid_size: i32,
    #[serde(default)]
    pub shapes: Vec<ShapeRecord>,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
}

/// Persisted form of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub id: ShapeId,
    /// Registry key used to rebuild the shape.
    pub kind: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub text: String,
    pub fill_color: SerializableColor,
    pub border_color: SerializableColor,
    pub border_selected_color: SerializableColor,
    pub show_border: bool,
    #[serde(flatten)]
    pub connectors: ConnectorFlags,
}

/// Persisted form of a fully attached connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    pub from_id: EntityId,
    pub from_shape_id: ShapeId,
    pub from_index: usize,
    pub to_id: EntityId,
    pub to_shape_id: ShapeId,
    pub to_index: usize,
}

impl ShapeRecord {
    pub fn from_shape(shape: &Shape) -> Self {
        Self {
            id: shape.id(),
            kind: shape.kind().to_string(),
            x: shape.position.x,
            y: shape.position.y,
            width: shape.width,
            height: shape.height,
            text: shape.text.clone(),
            fill_color: shape.fill_color,
            border_color: shape.border_color,
            border_selected_color: shape.border_selected_color,
            show_border: shape.show_border,
            connectors: shape.connector_flags,
        }
    }

    /// Copy the persisted fields onto a freshly built shape of this kind.
    pub fn apply_to(&self, shape: &mut Shape) {
        shape.set_id(self.id);
        shape.position = DiagramPoint::new(self.x, self.y);
        shape.width = self.width;
        shape.height = self.height;
        shape.text.clone_from(&self.text);
        shape.fill_color = self.fill_color;
        shape.border_color = self.border_color;
        shape.border_selected_color = self.border_selected_color;
        shape.show_border = self.show_border;
        shape.connector_flags = self.connectors;
    }
}

impl ConnectionRecord {
    /// Project a connection. Connections with a free endpoint are transient
    /// drag state and have no record.
    pub fn from_connection(connection: &Connection) -> Option<Self> {
        let from = connection.from.attachment()?;
        let to = connection.to.attachment()?;
        Some(Self {
            id: connection.id(),
            from_id: connection.from.id(),
            from_shape_id: from.shape,
            from_index: from.index,
            to_id: connection.to.id(),
            to_shape_id: to.shape,
            to_index: to.index,
        })
    }
}

impl DiagramRecord {
    pub fn from_diagram(diagram: &Diagram) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            view_origin: diagram.view_origin,
            line_color: diagram.palette.line,
            selected_line_color: diagram.palette.selected,
            hovered_line_color: diagram.palette.hovered,
            background_color: diagram.background_color,
            show_grid: diagram.show_grid,
            grid_size: diagram.grid_size,
            shapes: diagram.shapes().iter().map(ShapeRecord::from_shape).collect(),
            connections: diagram
                .connections()
                .iter()
                .filter_map(ConnectionRecord::from_connection)
                .collect(),
        }
    }

    /// Copy the control parameters (view, colors, grid) onto a diagram.
    pub fn apply_control(&self, diagram: &mut Diagram) {
        diagram.view_origin = self.view_origin;
        diagram.palette = LinePalette {
            line: self.line_color,
            selected: self.selected_line_color,
            hovered: self.hovered_line_color,
        };
        diagram.background_color = self.background_color;
        diagram.show_grid = self.show_grid;
        diagram.grid_size = self.grid_size;
        diagram.request_repaint();
    }
}

/// What to take from an imported document. By default only the shapes and
/// connections are merged; the current view and colors are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Merge shapes and connections.
    pub shapes: bool,
    /// Copy view origin, colors and grid settings.
    pub control: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            shapes: true,
            control: false,
        }
    }
}

/// Counts of entities brought in by a load or import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub shapes: usize,
    pub connections: usize,
}

/// Serialize and seal a diagram.
pub fn save(diagram: &Diagram) -> PersistResult<Vec<u8>> {
    let record = DiagramRecord::from_diagram(diagram);
    let body = serde_json::to_vec_pretty(&record)?;
    info!(
        "Saved diagram: {} shapes, {} connections",
        record.shapes.len(),
        record.connections.len()
    );
    Ok(signature::seal(&body, &diagram.config().signing_key))
}

/// Verify and parse a sealed document without building a diagram.
pub fn read_record(bytes: &[u8], key: &str) -> PersistResult<DiagramRecord> {
    let body = signature::open(bytes, key)?;
    let record: DiagramRecord = serde_json::from_slice(body)?;
    if record.format_version > FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion(record.format_version));
    }
    Ok(record)
}

/// Build a diagram from a sealed document.
pub fn load(bytes: &[u8], registry: &ShapeRegistry, config: DiagramConfig) -> PersistResult<Diagram> {
    let record = read_record(bytes, &config.signing_key)?;
    let mut diagram = Diagram::new(config);
    record.apply_control(&mut diagram);
    let summary = populate(&mut diagram, &record, registry)?;
    diagram.take_repaint_request();
    info!(
        "Loaded diagram: {} of {} shapes, {} of {} connections",
        summary.shapes,
        record.shapes.len(),
        summary.connections,
        record.connections.len()
    );
    Ok(diagram)
}

/// Add the record's shapes and connections to `diagram`.
fn populate(
    diagram: &mut Diagram,
    record: &DiagramRecord,
    registry: &ShapeRegistry,
) -> PersistResult<ImportSummary> {
    let strict = diagram.config().strict_load;
    let mut summary = ImportSummary::default();

    for shape_record in &record.shapes {
        let Some(mut shape) = registry.create(&shape_record.kind) else {
            if strict {
                return Err(PersistError::UnknownShapeKind(shape_record.kind.clone()));
            }
            warn!(
                "Skipping shape {}: unknown kind '{}'",
                shape_record.id, shape_record.kind
            );
            continue;
        };
        shape_record.apply_to(&mut shape);
        match diagram.add_shape(shape) {
            Ok(_) => summary.shapes += 1,
            Err(err) if !strict => warn!("Skipping shape {}: {}", shape_record.id, err),
            Err(err) => return Err(err.into()),
        }
    }

    for conn in &record.connections {
        // Saved attachments are restored even onto connectors disabled since.
        let from =
            diagram.check_connector(conn.from_shape_id, conn.from_index, End::From, false);
        let to = diagram.check_connector(conn.to_shape_id, conn.to_index, End::To, false);
        let (from, to) = match (from, to) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(err), _) | (_, Err(err)) => {
                warn!("Skipping connection {}: {}", conn.id, err);
                continue;
            }
        };
        let connection = Connection::with_ids(
            conn.id,
            Endpoint::with_id(conn.from_id, from),
            Endpoint::with_id(conn.to_id, to),
        );
        match diagram.add_connection(connection) {
            Ok(_) => {}
            Err(err) if !strict => {
                warn!("Skipping connection {}: {}", conn.id, err);
                continue;
            }
            Err(err) => return Err(err.into()),
        }
        diagram.wire_endpoint(conn.id, End::From, conn.from_shape_id, conn.from_index, false)?;
        diagram.wire_endpoint(conn.id, End::To, conn.to_shape_id, conn.to_index, false)?;
        summary.connections += 1;
    }

    Ok(summary)
}

impl Diagram {
    /// Serialize and seal this diagram.
    pub fn save(&self) -> PersistResult<Vec<u8>> {
        save(self)
    }

    /// Build a diagram from a sealed document.
    pub fn load(bytes: &[u8], registry: &ShapeRegistry, config: DiagramConfig) -> PersistResult<Self> {
        load(bytes, registry, config)
    }

    /// Merge a sealed document into this diagram.
    ///
    /// The document is verified and fully staged before anything is
    /// committed, so an error leaves this diagram untouched. Entities whose
    /// ids already exist here are skipped (with connections wired to skipped
    /// shapes), or rejected under strict loading.
    pub fn import(
        &mut self,
        bytes: &[u8],
        registry: &ShapeRegistry,
        options: ImportOptions,
    ) -> PersistResult<ImportSummary> {
        let record = read_record(bytes, &self.config().signing_key)?;
        let mut summary = ImportSummary::default();

        if options.shapes {
            let mut staged = Diagram::new(self.config().clone());
            populate(&mut staged, &record, registry)?;
            summary = self.merge(staged)?;
        }
        if options.control {
            record.apply_control(self);
        }
        info!(
            "Imported {} shapes and {} connections",
            summary.shapes, summary.connections
        );
        Ok(summary)
    }

    fn merge(&mut self, mut staged: Diagram) -> PersistResult<ImportSummary> {
        let clashing_shapes: Vec<ShapeId> = staged
            .shapes
            .ids()
            .into_iter()
            .filter(|id| self.shapes.contains(*id))
            .collect();
        let clashing_connections: Vec<ConnectionId> = staged
            .connections
            .iter()
            .filter(|c| {
                self.connections.contains(c.id())
                    || clashing_shapes.iter().any(|s| c.touches_shape(*s))
            })
            .map(|c| c.id())
            .collect();

        if self.config().strict_load {
            if let Some(id) = clashing_shapes.first().or(clashing_connections.first()) {
                return Err(DiagramError::DuplicateId(*id).into());
            }
        }
        for id in clashing_connections {
            warn!("Import skips connection {}: id or shape already present", id);
            staged.remove_connection(id);
        }
        for id in clashing_shapes {
            warn!("Import skips shape {}: id already present", id);
            staged.remove_shape(id);
        }

        let mut summary = ImportSummary::default();
        for id in staged.shapes.ids() {
            if let Some(shape) = staged.shapes.remove(id) {
                self.shapes.add(shape)?;
                summary.shapes += 1;
            }
        }
        for id in staged.connections.ids() {
            if let Some(connection) = staged.connections.remove(id) {
                self.connections.add(connection)?;
                summary.connections += 1;
            }
        }
        self.sync_repaint();
        Ok(summary)
    }
}
