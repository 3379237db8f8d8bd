//! The diagram surface: owns the graph and mediates every mutation.

use crate::collections::{ConnectionCollection, ShapeCollection};
use crate::config::DiagramConfig;
use crate::connection::{Attachment, Connection};
use crate::entity::{ConnectionId, End, Entity, EntityRef, ShapeId, SiteId};
use crate::error::{DiagramError, DiagramResult};
use crate::events::{DeletingArgs, DiagramListener};
use crate::geometry::DiagramPoint;
use crate::hit::{self, HitRadii};
use crate::input::PointerState;
use crate::interaction::{DragTarget, InteractionState};
use crate::render::{LinePalette, PaintContext, Surface, paint_grid};
use crate::shapes::{ConnectorRole, EndpointRef, SerializableColor, Shape, ShapeRegistry};
use kurbo::{Point, Rect, Shape as _, Size};
use log::{debug, warn};

/// An interactive diagram.
///
/// Entities are only reachable through the diagram, so every change to the
/// graph goes through a method that keeps selection, hover and connector
/// occupancy consistent.
pub struct Diagram {
    site: SiteId,
    pub(crate) shapes: ShapeCollection,
    pub(crate) connections: ConnectionCollection,
    /// Screen position of the world origin.
    pub view_origin: DiagramPoint,
    /// Connection line colors.
    pub palette: LinePalette,
    pub background_color: SerializableColor,
    pub show_grid: bool,
    pub grid_size: i32,
    pub(crate) config: DiagramConfig,
    selected: Option<EntityRef>,
    hovered: Option<EntityRef>,
    pub(crate) interaction: InteractionState,
    pub(crate) pointer: PointerState,
    listeners: Vec<Box<dyn DiagramListener>>,
    repaint: bool,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new(DiagramConfig::default())
    }
}

impl std::fmt::Debug for Diagram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagram")
            .field("shapes", &self.shapes.len())
            .field("connections", &self.connections.len())
            .field("view_origin", &self.view_origin)
            .field("selected", &self.selected)
            .field("interaction", &self.interaction)
            .finish()
    }
}

impl Diagram {
    /// Create an empty diagram.
    pub fn new(config: DiagramConfig) -> Self {
        let site = SiteId::new();
        Self {
            site,
            shapes: ShapeCollection::new(site),
            connections: ConnectionCollection::new(site),
            view_origin: DiagramPoint::ORIGIN,
            palette: config.palette,
            background_color: config.background_color,
            show_grid: config.show_grid,
            grid_size: config.grid_size,
            config,
            selected: None,
            hovered: None,
            interaction: InteractionState::Idle,
            pointer: PointerState::new(),
            listeners: Vec::new(),
            repaint: false,
        }
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    pub fn shapes(&self) -> &ShapeCollection {
        &self.shapes
    }

    pub fn connections(&self) -> &ConnectionCollection {
        &self.connections
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    /// Mutable access to a shape's plain fields (text, colors, size).
    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.repaint = true;
        self.shapes.get_mut(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// The selected entity. `None` means the canvas.
    pub fn selected(&self) -> Option<EntityRef> {
        self.selected
    }

    pub fn hovered(&self) -> Option<EntityRef> {
        self.hovered
    }

    /// The selected shape, if the selection is a shape.
    pub fn selected_shape(&self) -> Option<ShapeId> {
        match self.selected {
            Some(EntityRef::Shape(id)) => Some(id),
            _ => None,
        }
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    /// No gesture is in progress. Hosts should only save or load when idle.
    pub fn is_idle(&self) -> bool {
        matches!(self.interaction, InteractionState::Idle)
    }

    /// Register a listener.
    pub fn add_listener(&mut self, listener: impl DiagramListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Convert a screen position to world coordinates.
    pub fn to_world(&self, screen: Point) -> DiagramPoint {
        DiagramPoint::from_kurbo(screen).translate(
            self.view_origin.x.saturating_neg(),
            self.view_origin.y.saturating_neg(),
        )
    }

    /// Convert a world position to screen coordinates.
    pub fn to_screen(&self, world: DiagramPoint) -> Point {
        world
            .translate(self.view_origin.x, self.view_origin.y)
            .to_kurbo()
    }

    pub(crate) fn hit_radii(&self) -> HitRadii {
        HitRadii::from(&self.config)
    }

    /// Entity under a world position, by hit-test priority.
    pub fn hit_test(&self, point: DiagramPoint) -> Option<EntityRef> {
        hit::hit_test(
            &self.shapes,
            &self.connections,
            self.selected_shape(),
            point,
            self.hit_radii(),
        )
    }

    pub fn entity(&self, entity: EntityRef) -> Option<&dyn Entity> {
        match entity {
            EntityRef::Shape(id) => self.shapes.get(id).map(|s| s as &dyn Entity),
            EntityRef::Connector { shape, index } => self
                .shapes
                .get(shape)?
                .connector(index)
                .map(|c| c as &dyn Entity),
            EntityRef::Connection(id) => self.connections.get(id).map(|c| c as &dyn Entity),
            EntityRef::Endpoint { connection, end } => self
                .connections
                .get(connection)
                .map(|c| c.endpoint(end) as &dyn Entity),
        }
    }

    pub(crate) fn entity_mut(&mut self, entity: EntityRef) -> Option<&mut dyn Entity> {
        match entity {
            EntityRef::Shape(id) => self.shapes.get_mut(id).map(|s| s as &mut dyn Entity),
            EntityRef::Connector { shape, index } => self
                .shapes
                .get_mut(shape)?
                .connector_mut(index)
                .map(|c| c as &mut dyn Entity),
            EntityRef::Connection(id) => self
                .connections
                .get_mut(id)
                .map(|c| c as &mut dyn Entity),
            EntityRef::Endpoint { connection, end } => self
                .connections
                .get_mut(connection)
                .map(|c| c.endpoint_mut(end) as &mut dyn Entity),
        }
    }

    // --- Repaint -----------------------------------------------------------

    /// Ask the host to redraw.
    pub fn request_repaint(&mut self) {
        self.repaint = true;
        for listener in &mut self.listeners {
            listener.repaint_requested();
        }
    }

    /// Forward repaint requests raised by the collections.
    pub(crate) fn sync_repaint(&mut self) {
        let shapes = self.shapes.take_repaint_request();
        let connections = self.connections.take_repaint_request();
        if shapes || connections {
            self.request_repaint();
        }
    }

    /// Return and clear the pending repaint request.
    pub fn take_repaint_request(&mut self) -> bool {
        self.sync_repaint();
        std::mem::take(&mut self.repaint)
    }

    // --- Building ----------------------------------------------------------

    /// Add a shape.
    pub fn add_shape(&mut self, shape: Shape) -> DiagramResult<ShapeId> {
        let id = self.shapes.add(shape)?.id();
        self.sync_repaint();
        Ok(id)
    }

    /// Add a connection. Its endpoints must be free; wire them with
    /// [`Diagram::attach_endpoint`] or use [`Diagram::add_connection_between`].
    pub fn add_connection(&mut self, connection: Connection) -> DiagramResult<ConnectionId> {
        let id = self.connections.add(connection)?.id();
        self.sync_repaint();
        Ok(id)
    }

    /// Wire a new connection from a source connector to a target connector.
    ///
    /// Both connectors are checked before anything is added, so an error
    /// leaves the diagram unchanged.
    pub fn add_connection_between(
        &mut self,
        from: (ShapeId, usize),
        to: (ShapeId, usize),
    ) -> DiagramResult<ConnectionId> {
        let from_point = self.check_connector(from.0, from.1, End::From, true)?;
        let to_point = self.check_connector(to.0, to.1, End::To, true)?;
        let id = self.add_connection(Connection::new(from_point, to_point))?;
        self.attach_endpoint(id, End::From, from.0, from.1)?;
        self.attach_endpoint(id, End::To, to.0, to.1)?;
        debug!("Connected {} -> {} as {}", from.0, to.0, id);
        Ok(id)
    }

    /// Verify that `end` may attach to a connector and return its position.
    ///
    /// Restoring a saved attachment passes `require_enabled = false`: enable
    /// flags only gate new wiring.
    pub(crate) fn check_connector(
        &self,
        shape: ShapeId,
        index: usize,
        end: End,
        require_enabled: bool,
    ) -> DiagramResult<DiagramPoint> {
        let owner = self
            .shapes
            .get(shape)
            .ok_or(DiagramError::ShapeNotFound(shape))?;
        let connector = owner
            .connector(index)
            .ok_or(DiagramError::ConnectorNotFound { shape, index })?;
        if connector.role != ConnectorRole::for_end(end) {
            return Err(DiagramError::RoleMismatch { shape, index, end });
        }
        if require_enabled && !owner.is_connector_enabled(index) {
            return Err(DiagramError::ConnectorDisabled { shape, index });
        }
        if !connector.is_free() {
            return Err(DiagramError::ConnectorOccupied { shape, index });
        }
        owner
            .connector_point(index)
            .ok_or(DiagramError::ConnectorNotFound { shape, index })
    }

    /// Attach one end of a connection to a connector, releasing whatever
    /// connector that end held before.
    pub fn attach_endpoint(
        &mut self,
        connection: ConnectionId,
        end: End,
        shape: ShapeId,
        index: usize,
    ) -> DiagramResult<()> {
        self.wire_endpoint(connection, end, shape, index, true)
    }

    pub(crate) fn wire_endpoint(
        &mut self,
        connection: ConnectionId,
        end: End,
        shape: ShapeId,
        index: usize,
        require_enabled: bool,
    ) -> DiagramResult<()> {
        if !self.connections.contains(connection) {
            return Err(DiagramError::ConnectionNotFound(connection));
        }
        let point = self.check_connector(shape, index, end, require_enabled)?;
        self.detach_endpoint(connection, end);

        if let Some(conn) = self.connections.get_mut(connection) {
            conn.endpoint_mut(end).attach(Attachment { shape, index }, point);
        }
        if let Some(connector) = self
            .shapes
            .get_mut(shape)
            .and_then(|s| s.connector_mut(index))
        {
            connector.attached = Some(EndpointRef { connection, end });
        }
        self.request_repaint();
        Ok(())
    }

    /// Detach one end of a connection, leaving it floating where it was.
    pub fn detach_endpoint(&mut self, connection: ConnectionId, end: End) -> Option<Attachment> {
        let conn = self.connections.get_mut(connection)?;
        let endpoint = conn.endpoint_mut(end);
        let position = endpoint.resolve(&self.shapes);
        let attachment = endpoint.detach()?;
        endpoint.point = position;
        self.release_connector(attachment, EndpointRef { connection, end });
        Some(attachment)
    }

    fn release_connector(&mut self, attachment: Attachment, owner: EndpointRef) {
        if let Some(connector) = self
            .shapes
            .get_mut(attachment.shape)
            .and_then(|s| s.connector_mut(attachment.index))
        {
            if connector.attached == Some(owner) {
                connector.attached = None;
            }
        }
    }

    /// Begin a connection drag at a screen position.
    ///
    /// The `from` end attaches to a free source connector under the pointer
    /// when there is one and floats otherwise. The `to` end is selected and
    /// follows the pointer until release.
    pub fn start_connection(&mut self, screen: Point) -> DiagramResult<ConnectionId> {
        let world = self.to_world(screen);
        let source = hit::connector_at(
            &self.shapes,
            world,
            self.config.connector_hit_radius,
            Some(ConnectorRole::Source),
            true,
        );
        let id = self.add_connection(Connection::new(world, world))?;
        if let Some(EntityRef::Connector { shape, index }) = source {
            self.attach_endpoint(id, End::From, shape, index)?;
        }
        // Drag deltas are measured from here.
        self.pointer.position = screen;
        self.begin_endpoint_drag(id);
        Ok(id)
    }

    /// Create a connection from a selected shape's source connector and
    /// start dragging its `to` end.
    pub(crate) fn spawn_connection(
        &mut self,
        shape: ShapeId,
        index: usize,
        screen: Point,
    ) -> DiagramResult<ConnectionId> {
        let point = self.check_connector(shape, index, End::From, true)?;
        let id = self.add_connection(Connection::new(point, self.to_world(screen)))?;
        self.attach_endpoint(id, End::From, shape, index)?;
        debug!("Spawned connection {} from connector {} of {}", id, index, shape);
        self.begin_endpoint_drag(id);
        Ok(id)
    }

    fn begin_endpoint_drag(&mut self, connection: ConnectionId) {
        let end = End::To;
        self.select(Some(EntityRef::Endpoint { connection, end }));
        self.interaction = InteractionState::DraggingEntity(DragTarget::Endpoint { connection, end });
    }

    /// Construct a registered shape and drop it with its top-left corner at
    /// a screen position.
    pub fn drop_shape(
        &mut self,
        kind: &str,
        screen: Point,
        registry: &ShapeRegistry,
    ) -> DiagramResult<ShapeId> {
        let mut shape = registry
            .create(kind)
            .ok_or_else(|| DiagramError::UnknownShapeKind(kind.to_string()))?;
        shape.position = self.to_world(screen);
        let id = self.add_shape(shape)?;
        debug!("Dropped '{}' shape {} at {}", kind, id, self.to_world(screen));
        Ok(id)
    }

    // --- Selection & hover ---------------------------------------------------

    /// Select an entity, or the canvas with `None`.
    ///
    /// Clears the previous selection so at most one entity is selected.
    /// References to entities that are not in the diagram select the canvas.
    pub fn select(&mut self, entity: Option<EntityRef>) {
        let current = entity.filter(|e| self.entity(*e).is_some());
        let previous = self.selected;
        if current == previous {
            return;
        }
        if let Some(e) = previous.and_then(|p| self.entity_mut(p)) {
            e.set_selected(false);
        }
        if let Some(e) = current.and_then(|c| self.entity_mut(c)) {
            e.set_selected(true);
        }
        self.selected = current;
        for listener in &mut self.listeners {
            listener.selection_changed(previous, current);
        }
        self.request_repaint();
    }

    /// Move the hover mark. Like selection, at most one entity is hovered.
    pub fn update_hovered(&mut self, entity: Option<EntityRef>) {
        let current = entity.filter(|e| self.entity(*e).is_some());
        if current == self.hovered {
            return;
        }
        if let Some(e) = self.hovered.and_then(|p| self.entity_mut(p)) {
            e.set_hovered(false);
        }
        if let Some(e) = current.and_then(|c| self.entity_mut(c)) {
            e.set_hovered(true);
        }
        self.hovered = current;
        self.request_repaint();
    }

    // --- Deletion ------------------------------------------------------------

    /// Delete an entity through the two-phase protocol.
    ///
    /// Listeners first receive a cancelable `element_deleting`; a cancel
    /// aborts with nothing changed. Endpoints delete their connection and
    /// connectors cannot be deleted. Returns whether anything was removed.
    pub fn delete(&mut self, entity: EntityRef) -> bool {
        let target = match entity {
            EntityRef::Endpoint { connection, .. } => EntityRef::Connection(connection),
            EntityRef::Connector { .. } => return false,
            other => other,
        };
        if self.entity(target).is_none() {
            return false;
        }

        let mut args = DeletingArgs::default();
        for listener in &mut self.listeners {
            listener.element_deleting(target, &mut args);
        }
        if args.cancel {
            debug!("Deletion of {} cancelled", target);
            return false;
        }

        match target {
            EntityRef::Shape(id) => self.remove_shape(id).is_some(),
            EntityRef::Connection(id) => self.remove_connection(id).is_some(),
            EntityRef::Connector { .. } | EntityRef::Endpoint { .. } => false,
        }
    }

    /// Delete the selected entity, if any.
    pub fn delete_selected(&mut self) -> bool {
        match self.selected {
            Some(entity) => self.delete(entity),
            None => false,
        }
    }

    /// Drop selection, hover and drag references matched by `belongs`.
    fn forget_refs(&mut self, belongs: impl Fn(&EntityRef) -> bool) {
        if self.selected.as_ref().is_some_and(&belongs) {
            self.select(None);
        }
        if self.hovered.as_ref().is_some_and(&belongs) {
            self.hovered = None;
        }
        if let InteractionState::DraggingEntity(target) = self.interaction {
            if belongs(&target.entity()) {
                self.interaction = InteractionState::Idle;
            }
        }
    }

    /// Remove a connection, free its connectors and emit `element_deleted`.
    pub(crate) fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        if !self.connections.contains(id) {
            return None;
        }
        self.forget_refs(|r| r.belongs_to_connection(id));
        self.detach_endpoint(id, End::From);
        self.detach_endpoint(id, End::To);
        let connection = self.connections.remove(id)?;
        for listener in &mut self.listeners {
            listener.element_deleted(EntityRef::Connection(id));
        }
        self.sync_repaint();
        Some(connection)
    }

    /// Remove a shape and emit `element_deleted`.
    ///
    /// Connections wired to it are deleted with it when cascading, and left
    /// floating at their last position otherwise.
    pub(crate) fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        if !self.shapes.contains(id) {
            return None;
        }
        self.forget_refs(|r| r.belongs_to_shape(id));

        let wired: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|c| c.touches_shape(id))
            .map(|c| c.id())
            .collect();
        for connection in wired {
            if self.config.cascade_delete {
                self.remove_connection(connection);
            } else {
                for end in [End::From, End::To] {
                    let attached_here = self
                        .connections
                        .get(connection)
                        .and_then(|c| c.endpoint(end).attachment())
                        .is_some_and(|a| a.shape == id);
                    if attached_here {
                        self.detach_endpoint(connection, end);
                    }
                }
            }
        }

        let shape = self.shapes.remove(id)?;
        for listener in &mut self.listeners {
            listener.element_deleted(EntityRef::Shape(id));
        }
        self.sync_repaint();
        Some(shape)
    }

    // --- Painting ------------------------------------------------------------

    /// Paint the diagram: background, grid, connections with their
    /// endpoints, then shapes on top.
    pub fn paint(&self, surface: &mut dyn Surface, viewport: Size) {
        let background = Rect::from_origin_size(Point::ZERO, viewport).to_path(0.1);
        surface.fill_path(&background, self.background_color.into());

        if self.show_grid {
            paint_grid(
                surface,
                viewport,
                self.view_origin,
                self.grid_size,
                self.config.grid_color.into(),
            );
        }

        let mut ctx = PaintContext::new(surface, &self.shapes, self.palette, self.view_origin);
        for connection in &self.connections {
            connection.paint(&mut ctx);
            connection.from.paint(&mut ctx);
            connection.to.paint(&mut ctx);
        }
        for shape in &self.shapes {
            shape.paint(&mut ctx);
        }
    }

    /// Warn about connector occupancy that disagrees with the endpoints.
    /// Returns the number of inconsistencies found.
    pub fn check_wiring(&self) -> usize {
        let mut problems = 0;
        for shape in &self.shapes {
            for connector in shape.connectors() {
                let Some(owner) = connector.attached() else {
                    continue;
                };
                let agrees = self
                    .connections
                    .get(owner.connection)
                    .and_then(|c| c.endpoint(owner.end).attachment())
                    == Some(Attachment {
                        shape: shape.id(),
                        index: connector.index(),
                    });
                if !agrees {
                    warn!(
                        "Connector {} of {} claims {} which is not attached there",
                        connector.index(),
                        shape.id(),
                        owner.connection
                    );
                    problems += 1;
                }
            }
        }
        for connection in &self.connections {
            for end in [End::From, End::To] {
                let Some(a) = connection.endpoint(end).attachment() else {
                    continue;
                };
                let claimed = self
                    .shapes
                    .get(a.shape)
                    .and_then(|s| s.connector(a.index))
                    .and_then(|c| c.attached());
                if claimed
                    != Some(EndpointRef {
                        connection: connection.id(),
                        end,
                    })
                {
                    warn!("{} endpoint of {} has no matching connector", end, connection.id());
                    problems += 1;
                }
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{DiagramEvent, EventLog};
    use crate::geometry::ConnectorDirection;
    use crate::render::RecordingSurface;
    use crate::shapes::{Outline, kinds};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn index(direction: ConnectorDirection, role: ConnectorRole) -> usize {
        Shape::connector_index(direction, role).unwrap()
    }

    fn two_shapes(diagram: &mut Diagram) -> (ShapeId, ShapeId) {
        let a = diagram
            .add_shape(Shape::new(kinds::RECTANGLE, Outline::Rectangle, 90, 60).at(0, 0))
            .unwrap();
        let b = diagram
            .add_shape(Shape::new(kinds::RECTANGLE, Outline::Rectangle, 90, 60).at(200, 0))
            .unwrap();
        (a, b)
    }

    fn wire(diagram: &mut Diagram, a: ShapeId, b: ShapeId) -> ConnectionId {
        diagram
            .add_connection_between(
                (a, index(ConnectorDirection::Right, ConnectorRole::Source)),
                (b, index(ConnectorDirection::Left, ConnectorRole::Target)),
            )
            .unwrap()
    }

    #[test]
    fn test_add_connection_between_occupies_connectors() {
        let mut diagram = Diagram::default();
        let (a, b) = two_shapes(&mut diagram);
        let id = wire(&mut diagram, a, b);

        let conn = diagram.connection(id).unwrap();
        assert!(conn.is_fully_attached());
        let source = diagram
            .shape(a)
            .unwrap()
            .connector(index(ConnectorDirection::Right, ConnectorRole::Source))
            .unwrap();
        assert_eq!(
            source.attached(),
            Some(EndpointRef {
                connection: id,
                end: End::From
            })
        );
        assert_eq!(diagram.check_wiring(), 0);
    }

    #[test]
    fn test_add_connection_between_validates() {
        let mut diagram = Diagram::default();
        let (a, b) = two_shapes(&mut diagram);
        wire(&mut diagram, a, b);

        let occupied = diagram.add_connection_between(
            (a, index(ConnectorDirection::Right, ConnectorRole::Source)),
            (b, index(ConnectorDirection::Up, ConnectorRole::Target)),
        );
        assert!(matches!(occupied, Err(DiagramError::ConnectorOccupied { .. })));

        let wrong_role = diagram.add_connection_between(
            (a, index(ConnectorDirection::Down, ConnectorRole::Target)),
            (b, index(ConnectorDirection::Up, ConnectorRole::Target)),
        );
        assert!(matches!(wrong_role, Err(DiagramError::RoleMismatch { .. })));

        diagram
            .shape_mut(b)
            .unwrap()
            .connector_flags
            .set(ConnectorDirection::Up, ConnectorRole::Target, false);
        let disabled = diagram.add_connection_between(
            (a, index(ConnectorDirection::Down, ConnectorRole::Source)),
            (b, index(ConnectorDirection::Up, ConnectorRole::Target)),
        );
        assert!(matches!(disabled, Err(DiagramError::ConnectorDisabled { .. })));

        assert_eq!(diagram.connections().len(), 1);
    }

    #[test]
    fn test_selection_is_exclusive() {
        let mut diagram = Diagram::default();
        let (a, b) = two_shapes(&mut diagram);
        diagram.select(Some(EntityRef::Shape(a)));
        diagram.select(Some(EntityRef::Shape(b)));
        assert!(!diagram.shape(a).unwrap().is_selected());
        assert!(diagram.shape(b).unwrap().is_selected());
        assert_eq!(diagram.selected(), Some(EntityRef::Shape(b)));

        diagram.select(None);
        assert!(!diagram.shape(b).unwrap().is_selected());
    }

    #[test]
    fn test_select_missing_entity_selects_canvas() {
        let mut diagram = Diagram::default();
        let (a, _) = two_shapes(&mut diagram);
        diagram.select(Some(EntityRef::Shape(a)));
        diagram.select(Some(EntityRef::Shape(uuid::Uuid::new_v4())));
        assert_eq!(diagram.selected(), None);
    }

    #[test]
    fn test_delete_cancelled_by_listener() {
        let mut diagram = Diagram::default();
        let (a, _) = two_shapes(&mut diagram);
        let log = Rc::new(RefCell::new(EventLog::new()));
        log.borrow_mut().veto.push(EntityRef::Shape(a));
        diagram.add_listener(log.clone());

        assert!(!diagram.delete(EntityRef::Shape(a)));
        assert!(diagram.shape(a).is_some());
        assert_eq!(
            log.borrow().without_repaints(),
            vec![DiagramEvent::Deleting(EntityRef::Shape(a))]
        );
    }

    #[test]
    fn test_delete_shape_cascades() {
        let mut diagram = Diagram::default();
        let (a, b) = two_shapes(&mut diagram);
        let conn = wire(&mut diagram, a, b);
        let log = Rc::new(RefCell::new(EventLog::new()));
        diagram.add_listener(log.clone());

        assert!(diagram.delete(EntityRef::Shape(a)));
        assert!(diagram.connection(conn).is_none());
        assert!(diagram.shape(b).unwrap().connectors().iter().all(|c| c.is_free()));
        assert_eq!(
            log.borrow().without_repaints(),
            vec![
                DiagramEvent::Deleting(EntityRef::Shape(a)),
                DiagramEvent::Deleted(EntityRef::Connection(conn)),
                DiagramEvent::Deleted(EntityRef::Shape(a)),
            ]
        );
    }

    #[test]
    fn test_delete_shape_without_cascade_leaves_floating_connection() {
        let config = DiagramConfig {
            cascade_delete: false,
            ..DiagramConfig::default()
        };
        let mut diagram = Diagram::new(config);
        let (a, b) = two_shapes(&mut diagram);
        let conn = wire(&mut diagram, a, b);
        let before = diagram.connection(conn).unwrap().from.resolve(diagram.shapes());

        assert!(diagram.delete(EntityRef::Shape(a)));
        let connection = diagram.connection(conn).unwrap();
        assert!(!connection.from.is_attached());
        assert!(connection.to.is_attached());
        assert_eq!(connection.from.point, before);
        assert_eq!(diagram.check_wiring(), 0);
    }

    #[test]
    fn test_delete_endpoint_deletes_connection() {
        let mut diagram = Diagram::default();
        let (a, b) = two_shapes(&mut diagram);
        let conn = wire(&mut diagram, a, b);
        diagram.select(Some(EntityRef::Endpoint {
            connection: conn,
            end: End::To,
        }));
        assert!(diagram.delete_selected());
        assert!(diagram.connections().is_empty());
        assert_eq!(diagram.selected(), None);
        assert!(diagram.shape(b).unwrap().connectors().iter().all(|c| c.is_free()));
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut diagram = Diagram::default();
        assert!(!diagram.delete(EntityRef::Shape(uuid::Uuid::new_v4())));
        assert!(!diagram.delete_selected());
    }

    #[test]
    fn test_drop_shape_subtracts_view_origin() {
        let mut diagram = Diagram::default();
        diagram.view_origin = DiagramPoint::new(30, -10);
        let registry = ShapeRegistry::default();
        let id = diagram
            .drop_shape(kinds::ELLIPSE, Point::new(130.0, 90.0), &registry)
            .unwrap();
        let shape = diagram.shape(id).unwrap();
        assert_eq!(shape.position, DiagramPoint::new(100, 100));
        assert_eq!(shape.kind(), kinds::ELLIPSE);
        assert_eq!(shape.site(), Some(diagram.site()));

        assert!(matches!(
            diagram.drop_shape("nope", Point::ZERO, &registry),
            Err(DiagramError::UnknownShapeKind(_))
        ));
    }

    #[test]
    fn test_repaint_requests() {
        let mut diagram = Diagram::default();
        assert!(!diagram.take_repaint_request());
        two_shapes(&mut diagram);
        assert!(diagram.take_repaint_request());
        assert!(!diagram.take_repaint_request());
    }

    #[test]
    fn test_paint_order() {
        let mut diagram = Diagram::default();
        let (a, b) = two_shapes(&mut diagram);
        diagram.shape_mut(a).unwrap().text = "a1".to_string();
        diagram.shape_mut(b).unwrap().text = "a2".to_string();
        wire(&mut diagram, a, b);
        diagram.show_grid = true;

        let mut surface = RecordingSurface::new();
        diagram.paint(&mut surface, Size::new(40.0, 40.0));

        use crate::render::DrawCommand;
        let first_line = surface
            .commands
            .iter()
            .position(|c| matches!(c, DrawCommand::Line { .. }))
            .unwrap();
        let first_shape_fill = surface
            .commands
            .iter()
            .skip(1)
            .position(|c| matches!(c, DrawCommand::FillPath { .. }))
            .unwrap()
            + 1;
        assert!(first_line < first_shape_fill);
        assert_eq!(surface.texts(), vec!["a1", "a2"]);
    }
}
