//! Compatibility decoding for old overworld data
//!
//! Files written before waypoints got their own elements stored overworld
//! progress as one delimited string:
//!
//! ```text
//! start:1;castle_1:1:1;castle_2:0
//! ```
//!
//! Entries are separated by `;`, each entry is `name:access[:completed]` with
//! `0`/`1` flags. Whitespace around entries and fields is ignored.

use super::attributes::FromAttribute;
use super::types::{SaveError, Waypoint};

pub const ENTRY_SEPARATOR: char = ';';
pub const FIELD_SEPARATOR: char = ':';

/// Keys that carry the progress string in an old-format overworld element
pub const PROGRESS_KEYS: [&str; 2] = ["waypoints", "progress"];

/// Decodes a legacy progress string into waypoints, in file order
pub fn decode_waypoints(progress: &str) -> Result<Vec<Waypoint>, SaveError> {
    progress
        .split(ENTRY_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(decode_entry)
        .collect()
}

fn decode_entry(entry: &str) -> Result<Waypoint, SaveError> {
    let fields: Vec<&str> = entry.split(FIELD_SEPARATOR).map(str::trim).collect();
    let (name, access, completed) = match fields.as_slice() {
        [name, access] => (*name, *access, "0"),
        [name, access, completed] => (*name, *access, *completed),
        _ => {
            return Err(SaveError::CorruptedData(format!(
                "legacy waypoint entry '{}' is not name:access[:completed]",
                entry
            )));
        }
    };
    if name.is_empty() {
        return Err(SaveError::CorruptedData(format!(
            "legacy waypoint entry '{}' has no name",
            entry
        )));
    }

    Ok(Waypoint::new(name, flag(entry, access)?, flag(entry, completed)?))
}

fn flag(entry: &str, raw: &str) -> Result<bool, SaveError> {
    bool::from_attribute(raw).ok_or_else(|| {
        SaveError::CorruptedData(format!(
            "legacy waypoint entry '{}' has bad flag '{}'",
            entry, raw
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_basic() {
        let waypoints = decode_waypoints("start:1;castle_1:1:1;castle_2:0").unwrap();
        assert_eq!(
            waypoints,
            vec![
                Waypoint::new("start", true, false),
                Waypoint::new("castle_1", true, true),
                Waypoint::new("castle_2", false, false),
            ]
        );
    }

    #[test]
    fn test_decode_tolerates_whitespace_and_trailing_separator() {
        let waypoints = decode_waypoints(" start : 1 ; castle_1:0 ;").unwrap();
        assert_eq!(waypoints.len(), 2);
        assert_eq!(waypoints[0], Waypoint::new("start", true, false));
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode_waypoints("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_entries() {
        assert!(decode_waypoints("start").is_err());
        assert!(decode_waypoints(":1").is_err());
        assert!(decode_waypoints("start:yes").is_err());
        assert!(decode_waypoints("a:1:1:1").is_err());
    }
}
