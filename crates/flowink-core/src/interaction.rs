//! Pointer and keyboard gesture handling.
//!
//! A gesture starts on a left-button press and ends on its release. Between
//! the two the diagram is either panning or dragging exactly one entity.

use crate::diagram::Diagram;
use crate::entity::{ConnectionId, End, Entity, EntityRef, ShapeId};
use crate::geometry::DiagramPoint;
use crate::hit;
use crate::input::{Key, KeyEvent, MouseButton, PointerEvent};
use crate::shapes::ConnectorRole;
use kurbo::Point;
use log::{debug, warn};

/// What a drag moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Shape(ShapeId),
    Connection(ConnectionId),
    Endpoint { connection: ConnectionId, end: End },
}

impl DragTarget {
    pub fn entity(self) -> EntityRef {
        match self {
            DragTarget::Shape(id) => EntityRef::Shape(id),
            DragTarget::Connection(id) => EntityRef::Connection(id),
            DragTarget::Endpoint { connection, end } => EntityRef::Endpoint { connection, end },
        }
    }
}

/// Gesture state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractionState {
    #[default]
    Idle,
    PanningCanvas,
    DraggingEntity(DragTarget),
}

impl Diagram {
    /// Feed a pointer event in screen coordinates.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        let previous = self.pointer.update(&event);
        match event {
            PointerEvent::Down { position, button } => self.pointer_down(position, button),
            PointerEvent::Move { position } => self.pointer_move(previous, position),
            PointerEvent::Up { position, button } => self.pointer_up(position, button),
        }
    }

    /// Feed a key event.
    pub fn handle_key_event(&mut self, event: KeyEvent) {
        let KeyEvent::Pressed(key) = event else {
            return;
        };
        match key {
            Key::Delete => {
                if self.delete_selected() {
                    debug!("Deleted selection from keyboard");
                }
            }
            Key::Escape if self.is_idle() => self.select(None),
            _ => {}
        }
    }

    fn pointer_down(&mut self, screen: Point, button: MouseButton) {
        if button != MouseButton::Left || !self.is_idle() {
            return;
        }
        let world = self.to_world(screen);
        match self.hit_test(world) {
            None => {
                self.select(None);
                self.interaction = InteractionState::PanningCanvas;
            }
            Some(EntityRef::Shape(id)) => {
                self.select(Some(EntityRef::Shape(id)));
                self.interaction = InteractionState::DraggingEntity(DragTarget::Shape(id));
            }
            Some(EntityRef::Connection(id)) => {
                self.select(Some(EntityRef::Connection(id)));
                self.interaction = InteractionState::DraggingEntity(DragTarget::Connection(id));
            }
            Some(EntityRef::Endpoint { connection, end }) => {
                self.detach_endpoint(connection, end);
                self.select(Some(EntityRef::Endpoint { connection, end }));
                self.interaction =
                    InteractionState::DraggingEntity(DragTarget::Endpoint { connection, end });
            }
            Some(EntityRef::Connector { shape, index }) => {
                if let Err(err) = self.spawn_connection(shape, index, screen) {
                    warn!("Could not start connection: {}", err);
                }
            }
        }
        debug!("Pointer down at {} -> {:?}", world, self.interaction);
    }

    fn pointer_move(&mut self, previous: Point, screen: Point) {
        let delta = DiagramPoint::from_kurbo(screen) - DiagramPoint::from_kurbo(previous);
        match self.interaction {
            InteractionState::Idle => {
                let hit = self.hit_test(self.to_world(screen));
                self.update_hovered(hit);
            }
            InteractionState::PanningCanvas => {
                if !delta.is_zero() {
                    self.view_origin = self.view_origin.offset(delta);
                    self.request_repaint();
                }
            }
            InteractionState::DraggingEntity(target) => {
                if !delta.is_zero() {
                    if let Some(entity) = self.entity_mut(target.entity()) {
                        entity.translate(delta.dx, delta.dy);
                    }
                    self.request_repaint();
                }
                if let DragTarget::Endpoint { connection, end } = target {
                    self.refresh_connector_hover(connection, end);
                }
            }
        }
    }

    /// Highlight the connector a dragged endpoint would attach to.
    fn refresh_connector_hover(&mut self, connection: ConnectionId, end: End) {
        let Some(position) = self
            .connections
            .get(connection)
            .map(|c| c.endpoint(end).resolve(&self.shapes))
        else {
            return;
        };
        let near = hit::connector_at(
            &self.shapes,
            position,
            self.config.connector_hit_radius,
            Some(ConnectorRole::for_end(end)),
            true,
        );
        self.update_hovered(near);
    }

    fn pointer_up(&mut self, screen: Point, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }
        let state = std::mem::take(&mut self.interaction);
        if let InteractionState::DraggingEntity(DragTarget::Endpoint { connection, end }) = state {
            self.release_endpoint(connection, end, screen);
        }
        debug!("Pointer up, leaving {:?}", state);
    }

    /// Attach a dragged endpoint to a free connector of its role under the
    /// release point, or drop the whole connection when there is none.
    fn release_endpoint(&mut self, connection: ConnectionId, end: End, screen: Point) {
        let world = self.to_world(screen);
        let target = hit::connector_at(
            &self.shapes,
            world,
            self.config.connector_hit_radius,
            Some(ConnectorRole::for_end(end)),
            true,
        );
        self.update_hovered(None);

        let attached = match target {
            Some(EntityRef::Connector { shape, index }) => {
                match self.attach_endpoint(connection, end, shape, index) {
                    Ok(()) => true,
                    Err(err) => {
                        warn!("Could not attach {} endpoint of {}: {}", end, connection, err);
                        false
                    }
                }
            }
            _ => false,
        };
        if attached {
            debug!("Attached {} endpoint of {}", end, connection);
        } else {
            debug!("Abandoned connection {}", connection);
            self.remove_connection(connection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ConnectorDirection;
    use crate::shapes::{Outline, Shape, kinds};

    fn press(diagram: &mut Diagram, x: f64, y: f64) {
        diagram.handle_pointer_event(PointerEvent::Move {
            position: Point::new(x, y),
        });
        diagram.handle_pointer_event(PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
        });
    }

    fn move_to(diagram: &mut Diagram, x: f64, y: f64) {
        diagram.handle_pointer_event(PointerEvent::Move {
            position: Point::new(x, y),
        });
    }

    fn release(diagram: &mut Diagram, x: f64, y: f64) {
        diagram.handle_pointer_event(PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
        });
    }

    fn diagram_with_shape() -> (Diagram, ShapeId) {
        let mut diagram = Diagram::default();
        let id = diagram
            .add_shape(Shape::new(kinds::RECTANGLE, Outline::Rectangle, 90, 60).at(0, 0))
            .unwrap();
        (diagram, id)
    }

    #[test]
    fn test_drag_shape() {
        let (mut diagram, id) = diagram_with_shape();
        press(&mut diagram, 10.0, 10.0);
        assert_eq!(
            *diagram.interaction(),
            InteractionState::DraggingEntity(DragTarget::Shape(id))
        );
        move_to(&mut diagram, 20.0, 15.0);
        move_to(&mut diagram, 40.0, 25.0);
        release(&mut diagram, 40.0, 25.0);

        assert!(diagram.is_idle());
        assert_eq!(diagram.shape(id).unwrap().position, DiagramPoint::new(30, 15));
        assert_eq!(diagram.selected(), Some(EntityRef::Shape(id)));
    }

    #[test]
    fn test_pan_canvas() {
        let (mut diagram, id) = diagram_with_shape();
        diagram.select(Some(EntityRef::Shape(id)));
        press(&mut diagram, 300.0, 300.0);
        assert_eq!(diagram.selected(), None);
        assert_eq!(*diagram.interaction(), InteractionState::PanningCanvas);

        move_to(&mut diagram, 310.0, 290.0);
        release(&mut diagram, 310.0, 290.0);
        assert_eq!(diagram.view_origin, DiagramPoint::new(10, -10));
        // The shape did not move in world space.
        assert_eq!(diagram.shape(id).unwrap().position, DiagramPoint::ORIGIN);
        assert_eq!(diagram.to_world(Point::new(10.0, -10.0)), DiagramPoint::ORIGIN);
    }

    #[test]
    fn test_hover_follows_pointer() {
        let (mut diagram, id) = diagram_with_shape();
        move_to(&mut diagram, 10.0, 10.0);
        assert_eq!(diagram.hovered(), Some(EntityRef::Shape(id)));
        assert!(diagram.shape(id).unwrap().is_hovered());
        move_to(&mut diagram, 500.0, 500.0);
        assert_eq!(diagram.hovered(), None);
        assert!(!diagram.shape(id).unwrap().is_hovered());
    }

    #[test]
    fn test_right_button_ignored() {
        let (mut diagram, _) = diagram_with_shape();
        diagram.handle_pointer_event(PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Right,
        });
        assert!(diagram.is_idle());
        assert_eq!(diagram.selected(), None);
    }

    #[test]
    fn test_connector_spawns_connection_and_abandon_removes_it() {
        let (mut diagram, id) = diagram_with_shape();
        diagram.select(Some(EntityRef::Shape(id)));
        let index =
            Shape::connector_index(ConnectorDirection::Right, ConnectorRole::Source).unwrap();

        // Right source anchor is at (90, 20); press just outside the edge.
        press(&mut diagram, 92.0, 20.0);
        assert_eq!(diagram.connections().len(), 1);
        let conn = diagram.connections().at(0).unwrap().id();
        assert_eq!(
            diagram.selected(),
            Some(EntityRef::Endpoint {
                connection: conn,
                end: End::To
            })
        );
        assert!(!diagram.shape(id).unwrap().connector(index).unwrap().is_free());

        move_to(&mut diagram, 300.0, 300.0);
        release(&mut diagram, 300.0, 300.0);

        assert!(diagram.is_idle());
        assert!(diagram.connections().is_empty());
        assert!(diagram.shape(id).unwrap().connector(index).unwrap().is_free());
        assert_eq!(diagram.selected(), None);
    }

    #[test]
    fn test_drag_endpoint_hovers_target_connector() {
        let (mut diagram, a) = diagram_with_shape();
        let b = diagram
            .add_shape(Shape::new(kinds::RECTANGLE, Outline::Rectangle, 90, 60).at(200, 0))
            .unwrap();
        diagram.select(Some(EntityRef::Shape(a)));
        press(&mut diagram, 92.0, 20.0);

        // Left target anchor of b sits at (200, 40).
        move_to(&mut diagram, 198.0, 40.0);
        let left_target =
            Shape::connector_index(ConnectorDirection::Left, ConnectorRole::Target).unwrap();
        assert_eq!(
            diagram.hovered(),
            Some(EntityRef::Connector {
                shape: b,
                index: left_target
            })
        );
        // Hover is cosmetic: nothing is attached before release.
        assert!(diagram.shape(b).unwrap().connector(left_target).unwrap().is_free());

        release(&mut diagram, 198.0, 40.0);
        assert_eq!(diagram.hovered(), None);
        assert!(diagram.connections().at(0).unwrap().is_fully_attached());
    }

    #[test]
    fn test_delete_key_during_drag_resets_state() {
        let (mut diagram, id) = diagram_with_shape();
        press(&mut diagram, 10.0, 10.0);
        diagram.handle_key_event(KeyEvent::Pressed(Key::Delete));
        assert!(diagram.shape(id).is_none());
        assert!(diagram.is_idle());
        release(&mut diagram, 10.0, 10.0);
        assert!(diagram.is_idle());
    }

    #[test]
    fn test_key_release_does_nothing() {
        let (mut diagram, id) = diagram_with_shape();
        diagram.select(Some(EntityRef::Shape(id)));
        diagram.handle_key_event(KeyEvent::Released(Key::Delete));
        diagram.handle_key_event(KeyEvent::Released(Key::Escape));
        assert!(diagram.shape(id).is_some());
        assert_eq!(diagram.selected(), Some(EntityRef::Shape(id)));
    }

    #[test]
    fn test_escape_selects_canvas() {
        let (mut diagram, id) = diagram_with_shape();
        diagram.select(Some(EntityRef::Shape(id)));
        diagram.handle_key_event(KeyEvent::Pressed(Key::Escape));
        assert_eq!(diagram.selected(), None);
    }
}
