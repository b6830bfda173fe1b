//! Save manager for handling save/load operations
//!
//! This module provides the SaveManager struct which handles:
//! - Writing save documents to files atomically
//! - Loading save documents from files
//! - Version checks on load
//! - Optional backup of the file being replaced

use super::loader;
use super::registry::SpawnRegistry;
use super::types::*;
use super::writer;
use crate::config::SaveConfig;
use log::{debug, info, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct SaveManager {
    config: SaveConfig,
}

impl SaveManager {
    /// Creates a new SaveManager with the given configuration
    pub fn new(config: SaveConfig) -> Self {
        SaveManager { config }
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    /// Save the document to a file
    ///
    /// The document is serialized in memory first, then written to a
    /// temporary file next to the target and moved over it. If anything fails
    /// the previous file is left untouched.
    pub fn save_game(
        &self,
        document: &SaveDocument,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, SaveError> {
        let path = path.as_ref();
        let bytes = writer::write_document(document, self.config.indent)?;

        let directory = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !directory.exists() {
            fs::create_dir_all(&directory)?;
        }

        let mut temp = NamedTempFile::new_in(&directory)?;
        temp.write_all(&bytes)?;
        temp.flush()?;
        temp.as_file().sync_all()?;

        if self.config.keep_backup && path.exists() {
            let backup = backup_path(path);
            fs::copy(path, &backup)?;
            debug!("previous save copied to {}", backup.display());
        }

        temp.persist(path).map_err(|e| SaveError::IoError(e.error))?;

        info!(
            "Game saved to: {} ({} levels, {} bytes)",
            path.display(),
            document.levels.len(),
            bytes.len()
        );
        Ok(path.to_path_buf())
    }

    /// Load a save file
    ///
    /// Fails on unreadable files, structural errors and unsupported versions.
    /// Recoverable problems are kept in `SaveDocument::warnings`.
    pub fn load_game(
        &self,
        path: impl AsRef<Path>,
        registry: &SpawnRegistry,
    ) -> Result<SaveDocument, SaveError> {
        let path = path.as_ref();
        let document = loader::parse_file(path, registry)?;

        // Version check
        if document.information.version < self.config.min_version {
            return Err(SaveError::InvalidVersion(document.information.version));
        }

        for warning in &document.warnings {
            warn!("{}: {}", path.display(), warning);
        }
        info!(
            "Loaded save {} (version {}, {} levels, {} warnings)",
            path.display(),
            document.information.version,
            document.levels.len(),
            document.warnings.len()
        );
        Ok(document)
    }

    /// Check if a save file exists at the given path
    pub fn save_exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }
}

impl Default for SaveManager {
    fn default() -> Self {
        Self::new(SaveConfig::default())
    }
}

/// `<file>.bak` next to the save file
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(description: &str) -> SaveDocument {
        SaveDocument {
            information: SaveInformation {
                description: description.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot_1.save");
        let manager = SaveManager::default();

        manager.save_game(&document("first"), &path).unwrap();
        assert!(manager.save_exists(&path));

        let loaded = manager.load_game(&path, &SpawnRegistry::create_default()).unwrap();
        assert_eq!(loaded.information.description, "first");
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("slot.save");
        SaveManager::default().save_game(&document("x"), &path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_save_replaces_and_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.save");
        let manager = SaveManager::new(SaveConfig {
            keep_backup: true,
            ..SaveConfig::default()
        });

        manager.save_game(&document("old"), &path).unwrap();
        manager.save_game(&document("new"), &path).unwrap();

        let registry = SpawnRegistry::create_default();
        let current = manager.load_game(&path, &registry).unwrap();
        let backup = manager.load_game(backup_path(&path), &registry).unwrap();
        assert_eq!(current.information.description, "new");
        assert_eq!(backup.information.description, "old");

        // Only the save and its backup, no stray temp files
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_failed_load_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.save");
        fs::write(&path, "<save><level name=\"a\"></level></save>").unwrap();

        let result = SaveManager::default().load_game(&path, &SpawnRegistry::create_default());
        assert!(matches!(result, Err(SaveError::MissingSection("information"))));
        assert!(path.is_file());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SaveManager::default()
            .load_game(dir.path().join("nope.save"), &SpawnRegistry::create_default());
        assert!(matches!(result, Err(SaveError::IoError(_))));
    }

    #[test]
    fn test_min_version_rejects_old_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.save");
        fs::write(&path, r#"<save><information version="3"/></save>"#).unwrap();

        let manager = SaveManager::new(SaveConfig {
            min_version: 10,
            ..SaveConfig::default()
        });
        let result = manager.load_game(&path, &SpawnRegistry::create_default());
        assert!(matches!(result, Err(SaveError::InvalidVersion(3))));
    }
}
