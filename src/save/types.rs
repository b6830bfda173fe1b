//! Save data types
//!
//! This module defines the in-memory save document built by the loader and
//! consumed by the writer, plus the error and warning types shared by the
//! whole save system.

use super::attributes::{AttributeError, ToAttribute};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Current save file format version
pub const CURRENT_SAVE_VERSION: u32 = 22;

/// Property keys every placed object writes to identify itself
pub const IDENTITY_KEYS: [&str; 2] = ["posx", "posy"];

/// One persisted (name, value) field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl ToAttribute) -> Self {
        Property {
            name: name.into(),
            value: value.to_attribute(),
        }
    }
}

/// The root of a loaded (or about to be written) save file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveDocument {
    pub information: SaveInformation,
    pub levels: Vec<LevelSnapshot>,
    pub player: PlayerSnapshot,
    pub overworlds: Vec<OverworldSnapshot>,
    /// Recoverable problems found while parsing
    #[serde(skip)]
    pub warnings: Vec<LoadWarning>,
}

impl SaveDocument {
    pub fn level(&self, name: &str) -> Option<&LevelSnapshot> {
        self.levels.iter().find(|level| level.name == name)
    }

    pub fn overworld(&self, name: &str) -> Option<&OverworldSnapshot> {
        self.overworlds.iter().find(|overworld| overworld.name == name)
    }
}

/// Header block, always the first section of a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveInformation {
    pub version: u32,
    pub level_engine_version: u32,
    /// Unix timestamp (seconds)
    pub save_time: i64,
    pub description: String,
}

impl Default for SaveInformation {
    fn default() -> Self {
        SaveInformation {
            version: CURRENT_SAVE_VERSION,
            level_engine_version: 0,
            save_time: 0,
            description: String::new(),
        }
    }
}

/// Saved state of one level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub name: String,
    /// Where the player stood in this level, if known
    pub player_pos: Option<(f32, f32)>,
    pub objects: Vec<LevelObjectOverride>,
    pub spawned: Vec<SpawnedObject>,
    /// Opaque JSON text owned by level scripts
    pub script_data: Option<String>,
}

impl LevelSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        LevelSnapshot {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Diff-encoded state of a design-time placed object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelObjectOverride {
    pub type_tag: String,
    pub properties: Vec<Property>,
}

/// Fully encoded state of an object created at runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnedObject {
    pub type_tag: String,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub properties: Vec<Property>,
    /// Where to go back to when leaving sub-levels, innermost last
    pub returns: Vec<ReturnEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnEntry {
    pub level: String,
    pub entry: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverworldSnapshot {
    pub name: String,
    pub waypoints: Vec<Waypoint>,
}

/// Overworld progress marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub access: bool,
    pub completed: bool,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, access: bool, completed: bool) -> Self {
        Waypoint {
            name: name.into(),
            access,
            completed,
        }
    }
}

/// Fatal errors for save and load operations
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("markup error: {0}")]
    MarkupError(#[from] quick_xml::Error),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("unsupported save version: {0}")]
    InvalidVersion(u32),

    #[error("missing required section <{0}>")]
    MissingSection(&'static str),

    #[error("malformed save structure: {0}")]
    Structure(String),

    #[error("invalid attribute in <{element}>: {source}")]
    Attribute {
        element: String,
        #[source]
        source: AttributeError,
    },

    #[error("corrupted save data: {0}")]
    CorruptedData(String),
}

/// Recoverable problems: logged, the affected object is skipped or defaulted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadWarning {
    #[error("level '{level}': unknown spawned object type '{type_tag}', skipped")]
    UnknownSpawnType { level: String, type_tag: String },

    #[error("level '{level}': object '{type_tag}' could not be restored: {reason}")]
    MalformedObject {
        level: String,
        type_tag: String,
        reason: String,
    },

    #[error("level '{level}': no placed '{type_tag}' at ({x}, {y}) #{ordinal}")]
    UnmatchedOverride {
        level: String,
        type_tag: String,
        x: i32,
        y: i32,
        ordinal: usize,
    },

    #[error("level '{level}': script data ignored: {reason}")]
    CorruptScriptPayload { level: String, reason: String },

    #[error("level '{level}' is not loaded, snapshot skipped")]
    UnknownLevel { level: String },

    #[error("player state could not be fully restored: {reason}")]
    MalformedPlayer { reason: String },
}

/// Section names as they appear in a file, for messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Root,
    Information,
    Level,
    Objects,
    SpawnedObjects,
    LevelObject,
    SpawnedObject,
    ScriptData,
    Player,
    Return,
    Overworld,
    Waypoints,
    Waypoint,
}

impl Section {
    pub fn tag(self) -> &'static str {
        match self {
            Section::Root => "save",
            Section::Information => "information",
            Section::Level => "level",
            Section::Objects => "objects",
            Section::SpawnedObjects => "spawned_objects",
            Section::LevelObject | Section::SpawnedObject => "object",
            Section::ScriptData => "script_data",
            Section::Player => "player",
            Section::Return => "return",
            Section::Overworld => "overworld",
            Section::Waypoints => "waypoints",
            Section::Waypoint => "waypoint",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
