//! Enemy base
//!
//! Design-time placed enemy. Its saved form is a diff against the state it
//! had when the level placed it:
//!
//! | key                    | written when                         |
//! |------------------------|--------------------------------------|
//! | `posx`, `posy`         | always (design-time position)        |
//! | `new_posx`, `new_posy` | current position differs from design |
//! | `state`                | moving state changed                 |
//! | `direction`            | direction changed                    |
//! | `velx`, `vely`         | that velocity component changed      |
//! | `active`               | active flag changed                  |
//! | `dead`                 | dead flag changed                    |
//!
//! The dying animation counter is never written; a dead enemy comes back at
//! its final position with the animation at its start.

use crate::save::saveable::float_changed;
use crate::save::{AttributeBag, AttributeError, Baseline, Property, Saveable};
use std::any::Any;

coded_enum! {
    /// Movement state, stored as its integer code
    pub enum MovingState {
        Stay = 0,
        Walk = 1,
        Run = 2,
        Fall = 3,
        Fly = 4,
        Jump = 5,
        Climb = 6,
    }
}

coded_enum! {
    pub enum Direction {
        Undefined = -1,
        Left = 0,
        Right = 1,
        Up = 2,
        Down = 3,
    }
}

/// Persisted enemy state apart from position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyState {
    pub moving: MovingState,
    pub direction: Direction,
    pub velx: f32,
    pub vely: f32,
    pub active: bool,
    pub dead: bool,
}

impl Default for EnemyState {
    fn default() -> Self {
        EnemyState {
            moving: MovingState::Fall,
            direction: Direction::Left,
            velx: 0.0,
            vely: 0.0,
            active: true,
            dead: false,
        }
    }
}

/// Seconds the dying animation takes before the enemy is hidden
const DYING_DURATION: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct Enemy {
    start_x: f32,
    start_y: f32,
    pub x: f32,
    pub y: f32,
    pub state: EnemyState,
    baseline: Baseline<EnemyState>,
    dying_counter: f32,
}

impl Enemy {
    pub const TYPE_TAG: &'static str = "enemy";

    /// Places an enemy with the default design-time state
    pub fn new(x: f32, y: f32) -> Self {
        Self::placed(x, y, EnemyState::default())
    }

    /// Places an enemy; `design` becomes its immutable baseline
    pub fn placed(x: f32, y: f32, design: EnemyState) -> Self {
        Enemy {
            start_x: x,
            start_y: y,
            x,
            y,
            state: design,
            baseline: Baseline::capture(design),
            dying_counter: 0.0,
        }
    }

    pub fn start_position(&self) -> (f32, f32) {
        (self.start_x, self.start_y)
    }

    pub fn design_state(&self) -> &EnemyState {
        self.baseline.get()
    }

    pub fn is_dead(&self) -> bool {
        self.state.dead
    }

    pub fn set_dead(&mut self, dead: bool) {
        self.state.dead = dead;
        self.dying_counter = 0.0;
    }

    pub fn dying_progress(&self) -> f32 {
        (self.dying_counter / DYING_DURATION).min(1.0)
    }

    /// Advances movement or the dying animation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if !self.state.active {
            return;
        }
        if self.state.dead {
            self.dying_counter += dt;
            return;
        }
        self.x += self.state.velx * dt;
        self.y += self.state.vely * dt;
    }

    /// Writes the identity fields and every changed field
    pub fn save_properties(&self) -> Vec<Property> {
        let design = self.baseline.get();
        let state = &self.state;
        let mut properties = vec![
            Property::new("posx", self.start_x),
            Property::new("posy", self.start_y),
        ];

        if state.moving != design.moving {
            properties.push(Property::new("state", state.moving));
        }
        // new position (only save if needed)
        if float_changed(self.x, self.start_x) || float_changed(self.y, self.start_y) {
            properties.push(Property::new("new_posx", self.x));
            properties.push(Property::new("new_posy", self.y));
        }
        if state.direction != design.direction {
            properties.push(Property::new("direction", state.direction));
        }
        if float_changed(state.velx, design.velx) {
            properties.push(Property::new("velx", state.velx));
        }
        if float_changed(state.vely, design.vely) {
            properties.push(Property::new("vely", state.vely));
        }
        if state.active != design.active {
            properties.push(Property::new("active", state.active));
        }
        if state.dead != design.dead {
            properties.push(Property::new("dead", state.dead));
        }
        properties
    }

    /// Applies saved fields; absent keys keep their current value
    pub fn restore_properties(&mut self, bag: &AttributeBag) -> Result<(), AttributeError> {
        // Spawned enemies are built at the origin and placed here
        if let Some(x) = bag.fetch_opt("posx")? {
            self.start_x = x;
            self.x = x;
        }
        if let Some(y) = bag.fetch_opt("posy")? {
            self.start_y = y;
            self.y = y;
        }

        self.x = bag.fetch("new_posx", self.x)?;
        self.y = bag.fetch("new_posy", self.y)?;
        self.state.moving = bag.fetch("state", self.state.moving)?;
        self.state.direction = bag.fetch("direction", self.state.direction)?;
        self.state.velx = bag.fetch("velx", self.state.velx)?;
        self.state.vely = bag.fetch("vely", self.state.vely)?;
        self.state.active = bag.fetch("active", self.state.active)?;
        if let Some(dead) = bag.fetch_opt("dead")? {
            self.set_dead(dead);
        }
        Ok(())
    }
}

impl Default for Enemy {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Saveable for Enemy {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn design_position(&self) -> (i32, i32) {
        (self.start_x.round() as i32, self.start_y.round() as i32)
    }

    fn save(&self) -> Vec<Property> {
        self.save_properties()
    }

    fn restore(&mut self, bag: &AttributeBag) -> Result<(), AttributeError> {
        self.restore_properties(bag)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
