//! Save-state persistence for a 2D platformer
//!
//! Converts live game state (placed level objects, runtime-spawned entities,
//! the player, overworld progress and level script data) into a nested
//! markup save file and back.
//!
//! - `save`: file format, loader, writer and the `Saveable` contract
//! - `entities`: reference entities implementing `Saveable`
//! - `level` / `overworld`: live containers that produce and consume snapshots
//! - `scripting`: save/load hooks for level scripts
//! - `savegame`: whole-session capture and restore
//! - `config`: `SaveConfig`

pub mod config;
pub mod entities;
pub mod level;
pub mod overworld;
pub mod save;
pub mod savegame;
pub mod scripting;

pub use config::SaveConfig;
pub use level::Level;
pub use overworld::Overworld;
pub use savegame::{capture, restore, RestoreReport, Session};
