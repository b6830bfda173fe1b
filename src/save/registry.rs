use super::saveable::Saveable;
use crate::entities::{DroppedItem, Slime};
use std::collections::HashMap;

/// Constructor for a spawnable type; returns a default instance to restore into
pub type SpawnFn = fn() -> Box<dyn Saveable>;

/// Generic constructor for any default-constructible saveable type
pub fn spawn_default<T: Saveable + Default + 'static>() -> Box<dyn Saveable> {
    Box::new(T::default())
}

/// Central registry of all spawnable object types
///
/// Spawned objects have no design-time counterpart, so the loader only knows
/// their type tag. This registry maps each tag to a constructor; the object is
/// then restored from its saved properties.
pub struct SpawnRegistry {
    constructors: HashMap<String, SpawnFn>,
}

impl SpawnRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        SpawnRegistry {
            constructors: HashMap::new(),
        }
    }

    /// Creates a registry with all built-in spawnable types registered
    pub fn create_default() -> Self {
        let mut registry = Self::new();
        registry.register_base_types();
        registry
    }

    /// Registers a constructor for a tag
    ///
    /// Returns error if the tag is already registered.
    pub fn register(
        &mut self,
        type_tag: impl Into<String>,
        constructor: SpawnFn,
    ) -> Result<(), String> {
        let type_tag = type_tag.into();
        if self.constructors.contains_key(&type_tag) {
            return Err(format!("Spawn type '{}' already registered", type_tag));
        }

        self.constructors.insert(type_tag, constructor);
        Ok(())
    }

    /// Returns true if the tag has a registered constructor
    pub fn exists(&self, type_tag: &str) -> bool {
        self.constructors.contains_key(type_tag)
    }

    /// Builds a default instance for the tag, `None` if unknown
    pub fn create(&self, type_tag: &str) -> Option<Box<dyn Saveable>> {
        self.constructors.get(type_tag).map(|constructor| constructor())
    }

    /// Returns all registered tags, sorted
    pub fn all_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    fn register_base_types(&mut self) {
        let base: [(&str, SpawnFn); 2] = [
            (Slime::TYPE_TAG, spawn_default::<Slime>),
            (DroppedItem::TYPE_TAG, spawn_default::<DroppedItem>),
        ];
        for (type_tag, constructor) in base {
            // Fresh registry, tags are unique
            let _ = self.register(type_tag, constructor);
        }
    }
}

impl Default for SpawnRegistry {
    fn default() -> Self {
        Self::create_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::AttributeBag;

    #[test]
    fn test_default_registry_contains_base_types() {
        let registry = SpawnRegistry::create_default();
        assert_eq!(registry.all_tags(), vec!["dropped_item", "slime"]);
        assert!(registry.exists("slime"));
        assert!(!registry.exists("enemy"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = SpawnRegistry::create_default();
        let result = registry.register("slime", spawn_default::<Slime>);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_dispatches_on_tag() {
        let registry = SpawnRegistry::create_default();
        let mut item = registry.create("dropped_item").unwrap();
        assert_eq!(item.type_tag(), "dropped_item");

        let mut bag = AttributeBag::new();
        bag.insert("item_id", "star");
        bag.insert("quantity", "4");
        item.restore(&bag).unwrap();

        let item = item.as_any().downcast_ref::<DroppedItem>().unwrap();
        assert_eq!(item.item_id, "star");
        assert_eq!(item.quantity, 4);
    }

    #[test]
    fn test_create_unknown_is_none() {
        let registry = SpawnRegistry::create_default();
        assert!(registry.create("goblin").is_none());
    }
}
