//! Slime: spawnable enemy that alternates between idling and jumping

use super::enemy::{Enemy, EnemyState, MovingState};
use crate::save::{AttributeBag, AttributeError, Property, Saveable};
use std::any::Any;

const DEFAULT_JUMP_HEIGHT: i32 = 20;
const IDLE_DURATION: f32 = 2.0;
const JUMP_DURATION: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum SlimeBehavior {
    Idle,
    Jumping,
}

/// Bouncing enemy, usually spawned at runtime
///
/// Saves everything `Enemy` saves plus `jump_height`. The idle/jump cycle is
/// transient and starts over after a load.
#[derive(Debug, Clone)]
pub struct Slime {
    pub enemy: Enemy,
    pub jump_height: i32,
    behavior: SlimeBehavior,
    behavior_timer: f32,
}

impl Slime {
    pub const TYPE_TAG: &'static str = "slime";

    pub fn new(x: f32, y: f32) -> Self {
        let design = EnemyState {
            moving: MovingState::Stay,
            ..EnemyState::default()
        };
        Slime {
            enemy: Enemy::placed(x, y, design),
            jump_height: DEFAULT_JUMP_HEIGHT,
            behavior: SlimeBehavior::Idle,
            behavior_timer: 0.0,
        }
    }

    pub fn is_jumping(&self) -> bool {
        self.behavior == SlimeBehavior::Jumping
    }

    /// Vertical offset of the current jump, 0 while idle
    pub fn jump_offset(&self) -> i32 {
        match self.behavior {
            SlimeBehavior::Idle => 0,
            SlimeBehavior::Jumping => {
                let progress = (self.behavior_timer * std::f32::consts::PI / JUMP_DURATION).sin();
                (progress * self.jump_height as f32) as i32
            }
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.enemy.update(dt);
        if self.enemy.is_dead() {
            return;
        }

        self.behavior_timer += dt;
        match self.behavior {
            SlimeBehavior::Idle if self.behavior_timer >= IDLE_DURATION => {
                self.behavior = SlimeBehavior::Jumping;
                self.behavior_timer = 0.0;
            }
            SlimeBehavior::Jumping if self.behavior_timer >= JUMP_DURATION => {
                self.behavior = SlimeBehavior::Idle;
                self.behavior_timer = 0.0;
            }
            _ => {}
        }
    }
}

impl Default for Slime {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Saveable for Slime {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn design_position(&self) -> (i32, i32) {
        self.enemy.design_position()
    }

    fn save(&self) -> Vec<Property> {
        let mut properties = self.enemy.save_properties();
        if self.jump_height != DEFAULT_JUMP_HEIGHT {
            properties.push(Property::new("jump_height", self.jump_height));
        }
        properties
    }

    fn restore(&mut self, bag: &AttributeBag) -> Result<(), AttributeError> {
        self.enemy.restore_properties(bag)?;
        self.jump_height = bag.fetch("jump_height", self.jump_height)?;
        self.behavior = SlimeBehavior::Idle;
        self.behavior_timer = 0.0;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
