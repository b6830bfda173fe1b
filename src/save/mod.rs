//! Save/Load system
//!
//! This module converts save documents to and from the nested markup save
//! file format:
//! - Typed attribute bags for reading untyped text
//! - A streaming, parser-agnostic loader state machine
//! - A markup writer and an atomic file manager
//! - The `Saveable` contract and the spawn registry for runtime objects
//!
//! # Architecture
//!
//! - `attributes`: `AttributeBag`, typed fetch/retrieve
//! - `types`: save document structures, error and warning types
//! - `loader`: `SavegameLoader` state machine and quick-xml driver
//! - `legacy`: decoding of the old flat overworld format
//! - `writer`: document → markup
//! - `manager`: `SaveManager` for file operations
//! - `saveable`: `Saveable` trait and `Baseline` snapshots
//! - `registry`: `SpawnRegistry` for type tag dispatch
//!
//! # Example Usage
//!
//! ```ignore
//! let registry = SpawnRegistry::create_default();
//! let manager = SaveManager::new(SaveConfig::default());
//!
//! manager.save_game(&document, "saves/slot_1.save")?;
//! let loaded = manager.load_game("saves/slot_1.save", &registry)?;
//! ```

pub mod attributes;
pub mod legacy;
pub mod loader;
pub mod manager;
pub mod registry;
pub mod saveable;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use attributes::{AttributeBag, AttributeError, FromAttribute, ToAttribute};
pub use loader::{parse_file, parse_str, MarkupEvent, SavegameLoader};
pub use manager::SaveManager;
pub use registry::{spawn_default, SpawnFn, SpawnRegistry};
pub use saveable::{Baseline, Saveable};
pub use types::*;
