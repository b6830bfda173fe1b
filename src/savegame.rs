//! Live state <-> save document
//!
//! `capture` walks the running session and builds a `SaveDocument`, firing
//! each level's script save handlers. `restore` applies a loaded document to
//! a session; nothing it finds is fatal, every problem ends up in the
//! returned `RestoreReport`.

use crate::entities::Player;
use crate::level::Level;
use crate::overworld::Overworld;
use crate::save::{
    AttributeBag, LoadWarning, PlayerSnapshot, ReturnEntry, SaveDocument, SaveError,
    SaveInformation, SaveManager, SpawnRegistry, CURRENT_SAVE_VERSION,
};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Everything a save file describes, in its live form
pub struct Session {
    pub player: Player,
    /// Where to go back to when the current sub-level ends
    pub returns: Vec<ReturnEntry>,
    pub levels: Vec<Level>,
    pub overworlds: Vec<Overworld>,
}

impl Session {
    pub fn new(player: Player) -> Self {
        Session {
            player,
            returns: Vec::new(),
            levels: Vec::new(),
            overworlds: Vec::new(),
        }
    }

    pub fn level(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|level| level.name == name)
    }

    pub fn level_mut(&mut self, name: &str) -> Option<&mut Level> {
        self.levels.iter_mut().find(|level| level.name == name)
    }

    pub fn overworld(&self, name: &str) -> Option<&Overworld> {
        self.overworlds.iter().find(|overworld| overworld.name == name)
    }
}

/// Recoverable problems from parsing and restoring, in the order found
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreReport {
    pub warnings: Vec<LoadWarning>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Builds a save document from the live session
///
/// Fails only if a level's script data cannot be serialized.
pub fn capture(session: &mut Session, description: &str) -> Result<SaveDocument, SaveError> {
    let mut levels = Vec::with_capacity(session.levels.len());
    for level in &mut session.levels {
        let mut snapshot = level.save();
        let ctx = level.context();
        snapshot.script_data = level.scripts.fire_save(&ctx)?;
        debug!(
            "captured level '{}': {} overrides, {} spawned",
            snapshot.name,
            snapshot.objects.len(),
            snapshot.spawned.len()
        );
        levels.push(snapshot);
    }

    Ok(SaveDocument {
        information: SaveInformation {
            version: CURRENT_SAVE_VERSION,
            level_engine_version: 0,
            save_time: chrono::Utc::now().timestamp(),
            description: description.to_string(),
        },
        levels,
        player: PlayerSnapshot {
            properties: session.player.save(),
            returns: session.returns.clone(),
        },
        overworlds: session.overworlds.iter().map(Overworld::save).collect(),
        warnings: Vec::new(),
    })
}

/// Applies a loaded document to the session
///
/// Levels in the document that the session does not have are skipped with a
/// warning; levels the document does not mention keep their current state.
pub fn restore(
    document: &SaveDocument,
    session: &mut Session,
    registry: &SpawnRegistry,
) -> RestoreReport {
    let mut warnings = document.warnings.clone();

    // Restore into a copy so a bad value cannot leave the player half-loaded
    let mut player = session.player.clone();
    match player.restore(&AttributeBag::from_properties(&document.player.properties)) {
        Ok(()) => session.player = player,
        Err(err) => warnings.push(LoadWarning::MalformedPlayer {
            reason: err.to_string(),
        }),
    }
    session.returns = document.player.returns.clone();

    for snapshot in &document.levels {
        let Some(level) = session.level_mut(&snapshot.name) else {
            warnings.push(LoadWarning::UnknownLevel {
                level: snapshot.name.clone(),
            });
            continue;
        };
        warnings.extend(level.restore(snapshot, registry));
        let ctx = level.context();
        warnings.extend(level.scripts.fire_load(&ctx, snapshot.script_data.as_deref()));
    }

    for snapshot in &document.overworlds {
        match session.overworlds.iter_mut().find(|overworld| overworld.name == snapshot.name) {
            Some(overworld) => overworld.restore(snapshot),
            None => debug!("overworld '{}' is not loaded, skipped", snapshot.name),
        }
    }

    info!(
        "restored {} levels and {} overworlds ({} warnings)",
        document.levels.len(),
        document.overworlds.len(),
        warnings.len()
    );
    RestoreReport { warnings }
}

/// Captures the session and writes it; the description defaults to the
/// configured timestamp format
pub fn save_session(
    manager: &SaveManager,
    session: &mut Session,
    path: impl AsRef<Path>,
    description: Option<&str>,
) -> Result<PathBuf, SaveError> {
    let description = match description {
        Some(text) => text.to_string(),
        None => manager.config().default_description(),
    };
    let document = capture(session, &description)?;
    manager.save_game(&document, path)
}

/// Loads a file and applies it; the session is untouched if the file is
/// rejected
pub fn load_session(
    manager: &SaveManager,
    session: &mut Session,
    path: impl AsRef<Path>,
    registry: &SpawnRegistry,
) -> Result<RestoreReport, SaveError> {
    let document = manager.load_game(path, registry)?;
    Ok(restore(&document, session, registry))
}
