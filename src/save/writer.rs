//! Markup writer for save documents
//!
//! Serializes a `SaveDocument` completely into memory. Nothing touches the
//! file system here; `SaveManager` decides where the bytes end up.

use super::types::*;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Serializes the document into UTF-8 markup
pub fn write_document(document: &SaveDocument, indent: usize) -> Result<Vec<u8>, SaveError> {
    let mut writer = if indent > 0 {
        Writer::new_with_indent(Vec::new(), b' ', indent)
    } else {
        Writer::new(Vec::new())
    };

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    open(&mut writer, Section::Root)?;

    let info = &document.information;
    open(&mut writer, Section::Information)?;
    property(&mut writer, "version", &info.version.to_string())?;
    property(&mut writer, "level_engine_version", &info.level_engine_version.to_string())?;
    property(&mut writer, "save_time", &info.save_time.to_string())?;
    property(&mut writer, "description", &info.description)?;
    close(&mut writer, Section::Information)?;

    for level in &document.levels {
        write_level(&mut writer, level)?;
    }

    open(&mut writer, Section::Player)?;
    properties(&mut writer, &document.player.properties)?;
    for entry in &document.player.returns {
        open(&mut writer, Section::Return)?;
        property(&mut writer, "level", &entry.level)?;
        property(&mut writer, "entry", &entry.entry)?;
        close(&mut writer, Section::Return)?;
    }
    close(&mut writer, Section::Player)?;

    for overworld in &document.overworlds {
        open(&mut writer, Section::Overworld)?;
        property(&mut writer, "name", &overworld.name)?;
        open(&mut writer, Section::Waypoints)?;
        for waypoint in &overworld.waypoints {
            open(&mut writer, Section::Waypoint)?;
            property(&mut writer, "name", &waypoint.name)?;
            property(&mut writer, "access", bool_code(waypoint.access))?;
            property(&mut writer, "completed", bool_code(waypoint.completed))?;
            close(&mut writer, Section::Waypoint)?;
        }
        close(&mut writer, Section::Waypoints)?;
        close(&mut writer, Section::Overworld)?;
    }

    close(&mut writer, Section::Root)?;
    Ok(writer.into_inner())
}

/// Serializes the document into a string
pub fn write_string(document: &SaveDocument, indent: usize) -> Result<String, SaveError> {
    let bytes = write_document(document, indent)?;
    String::from_utf8(bytes).map_err(|e| SaveError::CorruptedData(e.to_string()))
}

fn write_level(writer: &mut Writer<Vec<u8>>, level: &LevelSnapshot) -> Result<(), SaveError> {
    open(writer, Section::Level)?;
    property(writer, "level_name", &level.name)?;
    if let Some((x, y)) = level.player_pos {
        property(writer, "player_posx", &x.to_string())?;
        property(writer, "player_posy", &y.to_string())?;
    }

    if !level.objects.is_empty() {
        open(writer, Section::Objects)?;
        for object in &level.objects {
            open(writer, Section::LevelObject)?;
            property(writer, "type", &object.type_tag)?;
            properties(writer, &object.properties)?;
            close(writer, Section::LevelObject)?;
        }
        close(writer, Section::Objects)?;
    }

    if !level.spawned.is_empty() {
        open(writer, Section::SpawnedObjects)?;
        for object in &level.spawned {
            open(writer, Section::SpawnedObject)?;
            property(writer, "type", &object.type_tag)?;
            properties(writer, &object.properties)?;
            close(writer, Section::SpawnedObject)?;
        }
        close(writer, Section::SpawnedObjects)?;
    }

    if let Some(script_data) = &level.script_data {
        open(writer, Section::ScriptData)?;
        writer.write_event(Event::Text(BytesText::new(script_data)))?;
        close(writer, Section::ScriptData)?;
    }

    close(writer, Section::Level)
}

fn open(writer: &mut Writer<Vec<u8>>, section: Section) -> Result<(), SaveError> {
    writer.write_event(Event::Start(BytesStart::new(section.tag())))?;
    Ok(())
}

fn close(writer: &mut Writer<Vec<u8>>, section: Section) -> Result<(), SaveError> {
    writer.write_event(Event::End(BytesEnd::new(section.tag())))?;
    Ok(())
}

fn properties(writer: &mut Writer<Vec<u8>>, list: &[Property]) -> Result<(), SaveError> {
    for item in list {
        property(writer, &item.name, &item.value)?;
    }
    Ok(())
}

fn property(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<(), SaveError> {
    let element = BytesStart::new("property").with_attributes([("name", name), ("value", value)]);
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

fn bool_code(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::loader::parse_str;
    use crate::save::SpawnRegistry;

    fn sample() -> SaveDocument {
        let mut level = LevelSnapshot::new("lvl_1");
        level.player_pos = Some((12.0, 48.5));
        level.objects.push(LevelObjectOverride {
            type_tag: "enemy".to_string(),
            properties: vec![
                Property::new("posx", 100),
                Property::new("posy", 200),
                Property::new("dead", true),
            ],
        });
        level.spawned.push(SpawnedObject {
            type_tag: "dropped_item".to_string(),
            properties: vec![Property::new("item_id", "a \"quoted\" <item>")],
        });
        level.script_data = Some(r#"{"door":{"open":true},"note":"x < y"}"#.to_string());

        SaveDocument {
            information: SaveInformation {
                version: CURRENT_SAVE_VERSION,
                level_engine_version: 3,
                save_time: 1_700_000_000,
                description: "World 1 & friends".to_string(),
            },
            levels: vec![level],
            player: PlayerSnapshot {
                properties: vec![Property::new("lives", 3)],
                returns: vec![ReturnEntry {
                    level: "world_1".to_string(),
                    entry: "pipe".to_string(),
                }],
            },
            overworlds: vec![OverworldSnapshot {
                name: "world_1".to_string(),
                waypoints: vec![Waypoint::new("start", true, true)],
            }],
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_written_document_loads_back() {
        let document = sample();
        let xml = write_string(&document, 2).unwrap();
        let loaded = parse_str(&xml, &SpawnRegistry::create_default()).unwrap();
        assert_eq!(loaded, document);
    }

    #[test]
    fn test_writer_escapes_markup() {
        let xml = write_string(&sample(), 0).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("World 1 &amp; friends"));
        assert!(!xml.contains("<item>"));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let mut document = sample();
        document.levels[0].objects.clear();
        document.levels[0].spawned.clear();
        document.levels[0].script_data = None;
        let xml = write_string(&document, 1).unwrap();
        assert!(!xml.contains("<objects>"));
        assert!(!xml.contains("<spawned_objects>"));
        assert!(!xml.contains("<script_data>"));
    }
}
