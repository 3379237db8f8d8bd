//! Notifications raised by a diagram.

use crate::entity::EntityRef;
use std::cell::RefCell;
use std::rc::Rc;

/// Arguments of a cancelable deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletingArgs {
    /// Set to abort the deletion.
    pub cancel: bool,
}

/// Observer of diagram changes. Every method has an empty default, so a
/// listener implements only what it cares about.
pub trait DiagramListener {
    /// An entity is about to be deleted. Setting `args.cancel` aborts the
    /// deletion before anything is mutated.
    fn element_deleting(&mut self, _entity: EntityRef, _args: &mut DeletingArgs) {}

    /// An entity was removed from the diagram.
    fn element_deleted(&mut self, _entity: EntityRef) {}

    /// The selection moved. `None` stands for the canvas.
    fn selection_changed(&mut self, _previous: Option<EntityRef>, _current: Option<EntityRef>) {}

    /// The diagram needs to be redrawn.
    fn repaint_requested(&mut self) {}
}

/// Shared listeners let the host keep a handle after registering.
impl<T: DiagramListener + ?Sized> DiagramListener for Rc<RefCell<T>> {
    fn element_deleting(&mut self, entity: EntityRef, args: &mut DeletingArgs) {
        self.borrow_mut().element_deleting(entity, args);
    }

    fn element_deleted(&mut self, entity: EntityRef) {
        self.borrow_mut().element_deleted(entity);
    }

    fn selection_changed(&mut self, previous: Option<EntityRef>, current: Option<EntityRef>) {
        self.borrow_mut().selection_changed(previous, current);
    }

    fn repaint_requested(&mut self) {
        self.borrow_mut().repaint_requested();
    }
}

/// A listener that records every notification, for tests and hosts that
/// poll instead of reacting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    /// Notifications in arrival order.
    pub events: Vec<DiagramEvent>,
    /// Entities whose deletion this log vetoes.
    pub veto: Vec<EntityRef>,
}

/// A recorded notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramEvent {
    Deleting(EntityRef),
    Deleted(EntityRef),
    SelectionChanged {
        previous: Option<EntityRef>,
        current: Option<EntityRef>,
    },
    Repaint,
}

impl DiagramListener for EventLog {
    fn element_deleting(&mut self, entity: EntityRef, args: &mut DeletingArgs) {
        self.events.push(DiagramEvent::Deleting(entity));
        if self.veto.contains(&entity) {
            args.cancel = true;
        }
    }

    fn element_deleted(&mut self, entity: EntityRef) {
        self.events.push(DiagramEvent::Deleted(entity));
    }

    fn selection_changed(&mut self, previous: Option<EntityRef>, current: Option<EntityRef>) {
        self.events
            .push(DiagramEvent::SelectionChanged { previous, current });
    }

    fn repaint_requested(&mut self) {
        self.events.push(DiagramEvent::Repaint);
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events other than repaint requests.
    pub fn without_repaints(&self) -> Vec<DiagramEvent> {
        self.events
            .iter()
            .copied()
            .filter(|e| *e != DiagramEvent::Repaint)
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
