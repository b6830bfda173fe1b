//! Scripting persistence bridge
//!
//! Level scripts keep their own state outside of any entity. To survive a
//! save they register handlers here: save handlers fill a `Carrier` that is
//! stored as JSON text in the level's `script_data` section, load handlers get
//! the decoded carrier back. The crate never interprets the payload.
//!
//! The level a handler runs for is passed explicitly as a `LevelContext`.

pub mod bridge;
pub mod carrier;

pub use bridge::{LevelContext, LoadHandler, SaveHandler, ScriptBridge};
pub use carrier::Carrier;
