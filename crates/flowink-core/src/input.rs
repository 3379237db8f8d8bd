//! Input events forwarded by the host.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position } => position,
        }
    }
}

/// Keys the engine reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Escape,
    /// Any other key, by host name.
    Other(String),
}

/// Keyboard event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(Key),
    Released(Key),
}

/// Pointer bookkeeping between events.
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    /// Last pointer position in screen coordinates.
    pub position: Point,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event and return the previous pointer position.
    pub fn update(&mut self, event: &PointerEvent) -> Point {
        std::mem::replace(&mut self.position, event.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_returns_previous_position() {
        let mut state = PointerState::new();
        let previous = state.update(&PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Left,
        });
        assert_eq!(previous, Point::ZERO);

        let previous = state.update(&PointerEvent::Move {
            position: Point::new(15.0, 7.0),
        });
        assert_eq!(previous, Point::new(10.0, 10.0));
        assert_eq!(state.position, Point::new(15.0, 7.0));
    }
}
