//! Player property set
//!
//! Every field is written on save. On load, missing keys keep the current
//! value and the inventory is a `;`-separated list of `item:count` pairs.

use super::enemy::{Direction, MovingState};
use crate::save::{AttributeBag, AttributeError, Property};

coded_enum! {
    /// Player power-up level, also used for the item box
    pub enum PowerUp {
        Small = 0,
        Big = 1,
        Fire = 2,
        Ice = 3,
        Ghost = 4,
    }
}

/// Item box code for "empty"
const EMPTY_ITEMBOX: i32 = -1;

/// An instance of an item with quantity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    pub item_id: String,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(item_id: impl Into<String>, quantity: u32) -> Self {
        ItemStack {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// Live player state
///
/// The player has no design-time placement, so `save()` writes the full
/// property set every time. `restore()` still tolerates missing keys and keeps
/// the current value for them.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub moving: MovingState,
    pub direction: Direction,
    pub power: PowerUp,
    pub itembox: Option<PowerUp>,
    pub lives: i32,
    pub points: u64,
    pub goldpieces: u32,
    /// Seconds spent in the current level
    pub level_time: f32,
    pub level: String,
    pub overworld: String,
    pub inventory: Vec<ItemStack>,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            x,
            y,
            moving: MovingState::Stay,
            direction: Direction::Right,
            power: PowerUp::Small,
            itembox: None,
            lives: 3,
            points: 0,
            goldpieces: 0,
            level_time: 0.0,
            level: String::new(),
            overworld: String::new(),
            inventory: Vec::new(),
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn save(&self) -> Vec<Property> {
        vec![
            Property::new("posx", self.x),
            Property::new("posy", self.y),
            Property::new("state", self.moving),
            Property::new("direction", self.direction),
            Property::new("type", self.power),
            Property::new("itembox_item", self.itembox.map_or(EMPTY_ITEMBOX, PowerUp::code)),
            Property::new("lives", self.lives),
            Property::new("points", self.points),
            Property::new("goldpieces", self.goldpieces),
            Property::new("level_time", self.level_time),
            Property::new("level", &self.level),
            Property::new("overworld", &self.overworld),
            Property::new("inventory", encode_inventory(&self.inventory)),
        ]
    }

    pub fn restore(&mut self, bag: &AttributeBag) -> Result<(), AttributeError> {
        self.x = bag.fetch("posx", self.x)?;
        self.y = bag.fetch("posy", self.y)?;
        self.moving = bag.fetch("state", self.moving)?;
        self.direction = bag.fetch("direction", self.direction)?;
        self.power = bag.fetch("type", self.power)?;
        if let Some(code) = bag.fetch_opt::<i32>("itembox_item")? {
            self.itembox = match code {
                EMPTY_ITEMBOX => None,
                code => Some(PowerUp::from_code(code).ok_or_else(|| AttributeError::Malformed {
                    key: "itembox_item".to_string(),
                    value: code.to_string(),
                    expected: "PowerUp code",
                })?),
            };
        }
        self.lives = bag.fetch("lives", self.lives)?;
        self.points = bag.fetch("points", self.points)?;
        self.goldpieces = bag.fetch("goldpieces", self.goldpieces)?;
        self.level_time = bag.fetch("level_time", self.level_time)?;
        if let Some(level) = bag.raw("level") {
            self.level = level.to_string();
        }
        if let Some(overworld) = bag.raw("overworld") {
            self.overworld = overworld.to_string();
        }
        if let Some(raw) = bag.raw("inventory") {
            self.inventory = decode_inventory(raw).ok_or_else(|| AttributeError::Malformed {
                key: "inventory".to_string(),
                value: raw.to_string(),
                expected: "item:quantity list",
            })?;
        }
        Ok(())
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// `slime_ball:3;star:1`
fn encode_inventory(stacks: &[ItemStack]) -> String {
    stacks
        .iter()
        .map(|stack| format!("{}:{}", stack.item_id, stack.quantity))
        .collect::<Vec<_>>()
        .join(";")
}

fn decode_inventory(raw: &str) -> Option<Vec<ItemStack>> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (item_id, quantity) = entry.rsplit_once(':')?;
            let quantity = quantity.trim().parse().ok()?;
            (!item_id.is_empty()).then(|| ItemStack::new(item_id, quantity))
        })
        .collect()
}
