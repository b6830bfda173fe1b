use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for reading and writing save files
///
/// Loaded from a JSON file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Spaces per nesting level in written files (0 = single line)
    pub indent: usize,
    /// Copy the previous file to `<file>.bak` before replacing it
    pub keep_backup: bool,
    /// Oldest format version that is still accepted
    pub min_version: u32,
    /// chrono format string for the default save description
    pub description_format: String,
}

impl Default for SaveConfig {
    fn default() -> Self {
        SaveConfig {
            indent: 1,
            keep_backup: false,
            min_version: 0,
            description_format: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

impl SaveConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: SaveConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Description used when the caller does not provide one
    pub fn default_description(&self) -> String {
        chrono::Local::now().format(&self.description_format).to_string()
    }
}
