//! Registry of loadable shape kinds.
//!
//! Persisted shapes only record a kind key. On load the key is looked up here
//! and the registered factory builds a default instance, which then receives
//! the persisted fields. Applications register their own kinds next to the
//! built-in ones.

use super::{Outline, SerializableColor, Shape};
use log::debug;
use std::collections::BTreeMap;

/// Builds a default instance of one shape kind.
pub type ShapeFactory = fn() -> Shape;

/// Keys of the built-in shape kinds.
pub mod kinds {
    pub const RECTANGLE: &str = "rectangle";
    pub const ROUNDED_RECTANGLE: &str = "rounded_rectangle";
    pub const ELLIPSE: &str = "ellipse";
    pub const DIAMOND: &str = "diamond";
}

fn rectangle() -> Shape {
    Shape::new(kinds::RECTANGLE, Outline::Rectangle, 120, 60)
}

fn rounded_rectangle() -> Shape {
    Shape::new(
        kinds::ROUNDED_RECTANGLE,
        Outline::RoundedRectangle { radius: 12.0 },
        120,
        60,
    )
}

fn ellipse() -> Shape {
    let mut shape = Shape::new(kinds::ELLIPSE, Outline::Ellipse, 120, 80);
    shape.fill_color = SerializableColor::new(240, 248, 255, 255);
    shape
}

fn diamond() -> Shape {
    let mut shape = Shape::new(kinds::DIAMOND, Outline::Diamond, 100, 100);
    shape.fill_color = SerializableColor::new(255, 250, 205, 255);
    shape
}

/// Maps stable kind keys to factories.
#[derive(Debug, Clone)]
pub struct ShapeRegistry {
    factories: BTreeMap<String, ShapeFactory>,
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ShapeRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Create a registry holding the built-in kinds.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(kinds::RECTANGLE, rectangle);
        registry.register(kinds::ROUNDED_RECTANGLE, rounded_rectangle);
        registry.register(kinds::ELLIPSE, ellipse);
        registry.register(kinds::DIAMOND, diamond);
        registry
    }

    /// Register a kind. A factory already registered under `key` is replaced.
    pub fn register(&mut self, key: impl Into<String>, factory: ShapeFactory) {
        let key = key.into();
        if self.factories.insert(key.clone(), factory).is_some() {
            debug!("Replaced shape factory for kind '{}'", key);
        }
    }

    /// Check if a kind is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Build a default instance of `key`.
    ///
    /// The returned shape always reports `key` as its kind, whatever the
    /// factory set, so a saved shape resolves to the same factory again.
    pub fn create(&self, key: &str) -> Option<Shape> {
        let factory = self.factories.get(key)?;
        let mut shape = factory();
        if shape.kind() != key {
            shape.set_kind(key);
        }
        Some(shape)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
