//! Saveable trait for entities that can be saved/restored
//!
//! Every persistable level object implements this trait. The save system only
//! ever talks to entities through it, so adding a new entity type means
//! implementing `Saveable` and, for runtime-spawned types, registering a
//! constructor in the `SpawnRegistry`.

use super::attributes::{AttributeBag, AttributeError};
use super::types::{Property, IDENTITY_KEYS};
use std::any::Any;

/// Trait for entities that can be saved and restored
///
/// # Contract
///
/// - `save()` always writes the identity fields (`posx`/`posy`, the
///   design-time position) and otherwise only fields that differ from the
///   design-time baseline. Calling it twice without mutation yields the same
///   list.
/// - `restore()` runs on a freshly constructed entity. Missing keys keep the
///   current value and key order never matters.
/// - Transient state (animation counters and the like) is never written.
pub trait Saveable {
    /// Stable tag used in save files and for spawn dispatch
    fn type_tag(&self) -> &'static str;

    /// Design-time position, used to match overrides to placed objects
    fn design_position(&self) -> (i32, i32);

    fn save(&self) -> Vec<Property>;

    fn restore(&mut self, bag: &AttributeBag) -> Result<(), AttributeError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// True if a saved property list carries anything beyond the identity fields
pub fn has_overrides(properties: &[Property]) -> bool {
    properties
        .iter()
        .any(|property| !IDENTITY_KEYS.contains(&property.name.as_str()))
}

/// Immutable copy of an entity's state at placement time
///
/// `save()` diffs the live state against this; it is never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline<T>(T);

impl<T> Baseline<T> {
    pub fn capture(state: T) -> Self {
        Baseline(state)
    }

    pub fn get(&self) -> &T {
        &self.0
    }
}

/// Float comparison used for "did this field change" checks
pub fn float_changed(a: f32, b: f32) -> bool {
    (a - b).abs() > f32::EPSILON * a.abs().max(b.abs()).max(1.0)
}
