//! Dropped item pickups

use crate::save::{AttributeBag, AttributeError, Property, Saveable};
use std::any::Any;

/// Item lying in the level, waiting to be picked up
///
/// Dropped items only ever exist as spawned objects, so every field needed to
/// rebuild one is written. Pickup cooldown and despawn age are transient.
#[derive(Debug, Clone)]
pub struct DroppedItem {
    pub x: f32,
    pub y: f32,
    pub item_id: String,
    pub quantity: u32,
    pub can_pickup: bool,
    age: f32,
    despawn_delay: f32,
    pickup_cooldown_duration: f32,
}

impl DroppedItem {
    pub const TYPE_TAG: &'static str = "dropped_item";

    pub fn new(x: f32, y: f32, item_id: impl Into<String>, quantity: u32) -> Self {
        DroppedItem {
            x,
            y,
            item_id: item_id.into(),
            quantity,
            can_pickup: false,
            age: 0.0,
            despawn_delay: 300.0,
            pickup_cooldown_duration: 0.5,
        }
    }

    /// Advances timers; returns true once the item should despawn
    pub fn update(&mut self, dt: f32) -> bool {
        self.age += dt;
        if !self.can_pickup && self.age >= self.pickup_cooldown_duration {
            self.can_pickup = true;
        }
        self.age >= self.despawn_delay
    }
}

impl Default for DroppedItem {
    fn default() -> Self {
        Self::new(0.0, 0.0, String::new(), 1)
    }
}

impl Saveable for DroppedItem {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn design_position(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }

    fn save(&self) -> Vec<Property> {
        vec![
            Property::new("posx", self.x),
            Property::new("posy", self.y),
            Property::new("item_id", &self.item_id),
            Property::new("quantity", self.quantity),
        ]
    }

    fn restore(&mut self, bag: &AttributeBag) -> Result<(), AttributeError> {
        self.x = bag.fetch("posx", self.x)?;
        self.y = bag.fetch("posy", self.y)?;
        self.item_id = bag.fetch("item_id", std::mem::take(&mut self.item_id))?;
        self.quantity = bag.fetch("quantity", self.quantity)?;
        self.age = 0.0;
        self.can_pickup = false;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
