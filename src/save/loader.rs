//! Streaming save file loader
//!
//! `SavegameLoader` is an explicit state machine advanced one markup event at a
//! time. It does not depend on any XML library: `parse_str` and friends drive
//! it with quick-xml, tests drive it with hand-built events.
//!
//! # Model
//!
//! Every open section element owns a frame on the stack. The frame's
//! `AttributeBag` starts with the element's own XML attributes; nested
//! `<property name=".." value=".."/>` children add to (and override) it. When
//! the element closes, the frame is popped and its bag is turned into the
//! matching part of the document: information header, level, object override,
//! spawned object, player, return entry, overworld or waypoint.
//!
//! # Errors
//!
//! Structural problems (bad nesting, unknown elements, missing information
//! block, missing required keys) abort the load and no document is returned.
//! Spawned objects of an unregistered type are skipped with a warning.

use super::attributes::{AttributeBag, AttributeError};
use super::legacy;
use super::registry::SpawnRegistry;
use super::types::*;
use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::io::Read;
use std::path::Path;

/// One event of a streaming markup parse
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupEvent {
    Start {
        name: String,
        attributes: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Text(String),
}

impl MarkupEvent {
    pub fn start(name: &str, attributes: &[(&str, &str)]) -> Self {
        MarkupEvent::Start {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn end(name: &str) -> Self {
        MarkupEvent::End {
            name: name.to_string(),
        }
    }
}

struct Frame {
    section: Section,
    /// Element name as written in the file, for end tag matching
    element: String,
    bag: AttributeBag,
    text: String,
}

/// Builds a `SaveDocument` from markup events
pub struct SavegameLoader<'r> {
    registry: &'r SpawnRegistry,
    stack: Vec<Frame>,
    /// Name of the currently open `<property>`, it must stay empty
    open_property: Option<String>,
    document: SaveDocument,
    root_seen: bool,
    information_seen: bool,
    player_seen: bool,
    level: Option<LevelSnapshot>,
    returns: Vec<ReturnEntry>,
    waypoints: Vec<Waypoint>,
    structured_overworld: bool,
}

impl<'r> SavegameLoader<'r> {
    pub fn new(registry: &'r SpawnRegistry) -> Self {
        SavegameLoader {
            registry,
            stack: Vec::new(),
            open_property: None,
            document: SaveDocument::default(),
            root_seen: false,
            information_seen: false,
            player_seen: false,
            level: None,
            returns: Vec::new(),
            waypoints: Vec::new(),
            structured_overworld: false,
        }
    }

    /// Advances the state machine by one event
    pub fn handle(&mut self, event: MarkupEvent) -> Result<(), SaveError> {
        match event {
            MarkupEvent::Start { name, attributes } => self.on_start_element(name, attributes),
            MarkupEvent::End { name } => self.on_end_element(&name),
            MarkupEvent::Text(text) => self.on_text(text),
        }
    }

    /// Ends the parse and hands out the finished document
    pub fn finish(self) -> Result<SaveDocument, SaveError> {
        if let Some(frame) = self.stack.last() {
            return Err(structure(format!(
                "document ended inside <{}>",
                frame.element
            )));
        }
        if !self.root_seen {
            return Err(SaveError::MissingSection("save"));
        }
        if !self.information_seen {
            return Err(SaveError::MissingSection("information"));
        }

        let document = self.document;
        debug!(
            "savegame parsed: {} levels, {} overworlds, {} warnings",
            document.levels.len(),
            document.overworlds.len(),
            document.warnings.len()
        );
        Ok(document)
    }

    fn on_start_element(
        &mut self,
        name: String,
        attributes: Vec<(String, String)>,
    ) -> Result<(), SaveError> {
        if let Some(property) = &self.open_property {
            return Err(structure(format!(
                "<{}> inside <property name=\"{}\">",
                name, property
            )));
        }

        if name == "property" || name == "Property" {
            return self.on_property(attributes);
        }

        let section = self.child_section(&name)?;
        match section {
            Section::Root => self.root_seen = true,
            Section::Information => self.information_seen = true,
            Section::Level => self.level = Some(LevelSnapshot::default()),
            Section::Player => {
                if self.player_seen {
                    return Err(structure("duplicate <player> section".to_string()));
                }
                self.player_seen = true;
                self.returns.clear();
            }
            Section::Overworld => {
                self.waypoints.clear();
                self.structured_overworld = false;
            }
            Section::Waypoints | Section::Waypoint => self.structured_overworld = true,
            _ => {}
        }

        let mut bag = AttributeBag::new();
        for (key, value) in attributes {
            bag.insert(key, value);
        }
        self.stack.push(Frame {
            section,
            element: name,
            bag,
            text: String::new(),
        });
        Ok(())
    }

    /// Works out which section a new child element opens
    fn child_section(&self, name: &str) -> Result<Section, SaveError> {
        let Some(parent) = self.stack.last() else {
            if self.root_seen {
                return Err(structure(format!("second root element <{}>", name)));
            }
            return match name {
                "save" | "savegame" => Ok(Section::Root),
                _ => Err(structure(format!("unexpected root element <{}>", name))),
            };
        };

        let section = match (parent.section, name) {
            (Section::Root, "information") => Section::Information,
            (Section::Root, "level") => Section::Level,
            (Section::Root, "player") => Section::Player,
            (Section::Root, "overworld" | "overworld_data") => Section::Overworld,
            (Section::Level, "objects" | "objects_data") => Section::Objects,
            (Section::Level, "spawned_objects") => Section::SpawnedObjects,
            (Section::Level, "script_data" | "mruby_data") => Section::ScriptData,
            (Section::Objects, "object") => Section::LevelObject,
            // Old files name spawned objects after their type
            (Section::SpawnedObjects, _) => Section::SpawnedObject,
            (Section::Player, "return") => Section::Return,
            (Section::Overworld, "waypoints") => Section::Waypoints,
            (Section::Overworld | Section::Waypoints, "waypoint") => Section::Waypoint,
            (parent, _) => {
                return Err(structure(format!("<{}> is not allowed inside <{}>", name, parent)));
            }
        };

        if parent.section == Section::Root
            && !self.information_seen
            && section != Section::Information
        {
            return Err(SaveError::MissingSection("information"));
        }
        Ok(section)
    }

    fn on_property(&mut self, attributes: Vec<(String, String)>) -> Result<(), SaveError> {
        let mut key = None;
        let mut value = String::new();
        for (attr, text) in attributes {
            match attr.as_str() {
                "name" | "Name" => key = Some(text),
                "value" | "Value" => value = text,
                _ => {}
            }
        }
        let key = key.ok_or_else(|| structure("<property> without a name".to_string()))?;

        let frame = self
            .stack
            .last_mut()
            .ok_or_else(|| structure("<property> outside of any section".to_string()))?;
        match frame.section {
            Section::Root
            | Section::Objects
            | Section::SpawnedObjects
            | Section::Waypoints
            | Section::ScriptData => {
                return Err(structure(format!(
                    "<property name=\"{}\"> is not allowed inside <{}>",
                    key, frame.element
                )));
            }
            _ => frame.bag.insert(key.clone(), value),
        }

        self.open_property = Some(key);
        Ok(())
    }

    fn on_text(&mut self, text: String) -> Result<(), SaveError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        match self.stack.last_mut() {
            Some(frame) if frame.section == Section::ScriptData && self.open_property.is_none() => {
                frame.text.push_str(&text);
                Ok(())
            }
            Some(frame) => Err(structure(format!("unexpected text inside <{}>", frame.element))),
            None => Err(structure("text outside of the root element".to_string())),
        }
    }

    fn on_end_element(&mut self, name: &str) -> Result<(), SaveError> {
        if let Some(property) = self.open_property.take() {
            if name == "property" || name == "Property" {
                return Ok(());
            }
            return Err(structure(format!(
                "</{}> closes open <property name=\"{}\">",
                name, property
            )));
        }

        let frame = match self.stack.pop() {
            Some(frame) => frame,
            None => return Err(structure(format!("</{}> without matching start tag", name))),
        };
        if frame.element != name {
            return Err(structure(format!(
                "</{}> does not close <{}>",
                name, frame.element
            )));
        }

        match frame.section {
            Section::Root => {}
            Section::Information => self.handle_information(frame)?,
            Section::Level => self.handle_level(frame)?,
            Section::Objects | Section::SpawnedObjects | Section::Waypoints => {}
            Section::LevelObject => self.handle_level_object(frame)?,
            Section::SpawnedObject => self.handle_level_spawned_object(frame)?,
            Section::ScriptData => self.handle_script_data(frame)?,
            Section::Player => self.handle_player(frame),
            Section::Return => self.handle_return(frame)?,
            Section::Overworld => {
                if self.structured_overworld {
                    self.handle_overworld(frame)?
                } else {
                    self.handle_old_format_overworld_data(frame)?
                }
            }
            Section::Waypoint => self.handle_overworld_waypoint(frame)?,
        }
        Ok(())
    }

    fn handle_information(&mut self, frame: Frame) -> Result<(), SaveError> {
        let bag = &frame.bag;
        // Very old files predate the version field
        let version: u32 = attribute(&frame, bag.fetch("version", 0))?;
        if version > CURRENT_SAVE_VERSION {
            return Err(SaveError::InvalidVersion(version));
        }

        self.document.information = SaveInformation {
            version,
            level_engine_version: attribute(&frame, bag.fetch("level_engine_version", 0))?,
            save_time: attribute(&frame, bag.fetch("save_time", 0))?,
            description: bag.fetch_str("description", "").to_string(),
        };
        debug!("savegame information: version {}", version);
        Ok(())
    }

    fn handle_level(&mut self, frame: Frame) -> Result<(), SaveError> {
        let mut level = self.level.take().unwrap_or_default();
        let bag = &frame.bag;

        level.name = match bag.raw("level_name").or_else(|| bag.raw("name")) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(SaveError::Attribute {
                    element: frame.element,
                    source: AttributeError::Missing {
                        key: "level_name".to_string(),
                    },
                });
            }
        };
        let x: Option<f32> = attribute(&frame, bag.fetch_opt("player_posx"))?;
        let y: Option<f32> = attribute(&frame, bag.fetch_opt("player_posy"))?;
        level.player_pos = x.zip(y);

        debug!(
            "level '{}': {} overrides, {} spawned",
            level.name,
            level.objects.len(),
            level.spawned.len()
        );
        self.document.levels.push(level);
        Ok(())
    }

    fn handle_level_object(&mut self, frame: Frame) -> Result<(), SaveError> {
        let mut bag = frame.bag;
        let type_tag = match bag.remove("type") {
            Some(tag) => tag,
            None => {
                return Err(SaveError::Attribute {
                    element: frame.element,
                    source: AttributeError::Missing {
                        key: "type".to_string(),
                    },
                });
            }
        };

        self.current_level()?.objects.push(LevelObjectOverride {
            type_tag,
            properties: bag.into_properties(),
        });
        Ok(())
    }

    fn handle_level_spawned_object(&mut self, frame: Frame) -> Result<(), SaveError> {
        let mut bag = frame.bag;
        let type_tag = match bag.remove("type") {
            Some(tag) => tag,
            None if frame.element != "object" => frame.element.clone(),
            None => {
                return Err(SaveError::Attribute {
                    element: frame.element,
                    source: AttributeError::Missing {
                        key: "type".to_string(),
                    },
                });
            }
        };

        if !self.registry.exists(&type_tag) {
            let warning = LoadWarning::UnknownSpawnType {
                level: self.current_level_name(),
                type_tag,
            };
            warn!("{}", warning);
            self.document.warnings.push(warning);
            return Ok(());
        }

        self.current_level()?.spawned.push(SpawnedObject {
            type_tag,
            properties: bag.into_properties(),
        });
        Ok(())
    }

    fn handle_script_data(&mut self, frame: Frame) -> Result<(), SaveError> {
        let text = frame.text.trim();
        if !text.is_empty() {
            self.current_level()?.script_data = Some(text.to_string());
        }
        Ok(())
    }

    fn handle_player(&mut self, frame: Frame) {
        self.document.player = PlayerSnapshot {
            properties: frame.bag.into_properties(),
            returns: std::mem::take(&mut self.returns),
        };
    }

    fn handle_return(&mut self, frame: Frame) -> Result<(), SaveError> {
        let level: String = attribute(&frame, frame.bag.retrieve("level"))?;
        let entry = frame.bag.fetch_str("entry", "").to_string();
        self.returns.push(ReturnEntry { level, entry });
        Ok(())
    }

    fn handle_overworld(&mut self, frame: Frame) -> Result<(), SaveError> {
        let name: String = attribute(&frame, frame.bag.retrieve("name"))?;
        self.document.overworlds.push(OverworldSnapshot {
            name,
            waypoints: std::mem::take(&mut self.waypoints),
        });
        Ok(())
    }

    /// Overworld element without any waypoint children: old flat format
    fn handle_old_format_overworld_data(&mut self, frame: Frame) -> Result<(), SaveError> {
        let name: String = attribute(&frame, frame.bag.retrieve("name"))?;
        let progress = legacy::PROGRESS_KEYS
            .iter()
            .find_map(|key| frame.bag.raw(key))
            .unwrap_or("");
        let waypoints = legacy::decode_waypoints(progress)?;

        debug!(
            "overworld '{}': old format, {} waypoints",
            name,
            waypoints.len()
        );
        self.document.overworlds.push(OverworldSnapshot { name, waypoints });
        Ok(())
    }

    fn handle_overworld_waypoint(&mut self, frame: Frame) -> Result<(), SaveError> {
        let bag = &frame.bag;
        let waypoint = Waypoint {
            name: attribute(&frame, bag.retrieve("name"))?,
            access: attribute(&frame, bag.fetch("access", false))?,
            completed: attribute(&frame, bag.fetch("completed", false))?,
        };
        self.waypoints.push(waypoint);
        Ok(())
    }

    fn current_level(&mut self) -> Result<&mut LevelSnapshot, SaveError> {
        self.level
            .as_mut()
            .ok_or_else(|| structure("level content outside of <level>".to_string()))
    }

    /// Level names are only known once `<level>` closes; use what is there
    fn current_level_name(&self) -> String {
        self.stack
            .iter()
            .rev()
            .find(|frame| frame.section == Section::Level)
            .and_then(|frame| frame.bag.raw("level_name").or_else(|| frame.bag.raw("name")))
            .unwrap_or("?")
            .to_string()
    }
}

fn structure(message: String) -> SaveError {
    SaveError::Structure(message)
}

fn attribute<T>(frame: &Frame, result: Result<T, AttributeError>) -> Result<T, SaveError> {
    result.map_err(|source| SaveError::Attribute {
        element: frame.element.clone(),
        source,
    })
}

/// Parses a complete save file held in memory
pub fn parse_str(xml: &str, registry: &SpawnRegistry) -> Result<SaveDocument, SaveError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut loader = SavegameLoader::new(registry);

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let (name, attributes) = start_element(&e)?;
                loader.handle(MarkupEvent::Start { name, attributes })?;
            }
            Event::Empty(e) => {
                let (name, attributes) = start_element(&e)?;
                loader.handle(MarkupEvent::Start {
                    name: name.clone(),
                    attributes,
                })?;
                loader.handle(MarkupEvent::End { name })?;
            }
            Event::End(e) => {
                let name = utf8(e.name().as_ref())?;
                loader.handle(MarkupEvent::End { name })?;
            }
            Event::Text(t) => {
                loader.handle(MarkupEvent::Text(t.unescape()?.into_owned()))?;
            }
            Event::CData(c) => {
                loader.handle(MarkupEvent::Text(utf8(&c)?))?;
            }
            Event::Eof => break,
            // declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    loader.finish()
}

/// Parses a save file from any reader; the input is read fully first
pub fn parse_reader<R: Read>(
    mut input: R,
    registry: &SpawnRegistry,
) -> Result<SaveDocument, SaveError> {
    let mut xml = String::new();
    input.read_to_string(&mut xml)?;
    parse_str(&xml, registry)
}

pub fn parse_file(
    path: impl AsRef<Path>,
    registry: &SpawnRegistry,
) -> Result<SaveDocument, SaveError> {
    let xml = fs::read_to_string(path)?;
    parse_str(&xml, registry)
}

fn start_element(e: &BytesStart<'_>) -> Result<(String, Vec<(String, String)>), SaveError> {
    let name = utf8(e.name().as_ref())?;
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok((name, attributes))
}

fn utf8(bytes: &[u8]) -> Result<String, SaveError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| SaveError::CorruptedData(format!("invalid UTF-8 in markup: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SpawnRegistry {
        SpawnRegistry::create_default()
    }

    const MINIMAL: &str = r#"<save>
        <information><property name="version" value="21"/></information>
    </save>"#;

    #[test]
    fn test_minimal_document() {
        let doc = parse_str(MINIMAL, &registry()).unwrap();
        assert_eq!(doc.information.version, 21);
        assert!(doc.levels.is_empty());
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_information_from_element_attributes() {
        let xml = r#"<save><information version="20" description="Castle"/></save>"#;
        let doc = parse_str(xml, &registry()).unwrap();
        assert_eq!(doc.information.version, 20);
        assert_eq!(doc.information.description, "Castle");
    }

    #[test]
    fn test_property_overrides_element_attribute() {
        let xml = r#"<save><information version="20">
            <property name="version" value="21"/>
        </information></save>"#;
        let doc = parse_str(xml, &registry()).unwrap();
        assert_eq!(doc.information.version, 21);
    }

    #[test]
    fn test_missing_information_is_fatal() {
        let xml = r#"<save><player><property name="lives" value="3"/></player></save>"#;
        let err = parse_str(xml, &registry()).unwrap_err();
        assert!(matches!(err, SaveError::MissingSection("information")));

        let err = parse_str("<save></save>", &registry()).unwrap_err();
        assert!(matches!(err, SaveError::MissingSection("information")));
    }

    #[test]
    fn test_future_version_is_fatal() {
        let xml = format!(
            r#"<save><information version="{}"/></save>"#,
            CURRENT_SAVE_VERSION + 1
        );
        let err = parse_str(&xml, &registry()).unwrap_err();
        assert!(matches!(err, SaveError::InvalidVersion(_)));
    }

    #[test]
    fn test_level_sections() {
        let xml = r#"<save>
            <information version="21"/>
            <level>
                <property name="level_name" value="lvl_1"/>
                <property name="player_posx" value="40"/>
                <property name="player_posy" value="-12.5"/>
                <objects>
                    <object>
                        <property name="type" value="enemy"/>
                        <property name="posx" value="100"/>
                        <property name="posy" value="200"/>
                        <property name="dead" value="1"/>
                    </object>
                </objects>
                <spawned_objects>
                    <object type="slime"><property name="posx" value="5"/></object>
                </spawned_objects>
                <script_data>{"switch": true}</script_data>
            </level>
        </save>"#;
        let doc = parse_str(xml, &registry()).unwrap();
        let level = doc.level("lvl_1").unwrap();
        assert_eq!(level.player_pos, Some((40.0, -12.5)));
        assert_eq!(level.objects.len(), 1);
        assert_eq!(level.objects[0].type_tag, "enemy");
        assert_eq!(
            level.objects[0].properties,
            vec![
                Property::new("posx", 100),
                Property::new("posy", 200),
                Property::new("dead", 1),
            ]
        );
        assert_eq!(level.spawned[0].type_tag, "slime");
        assert_eq!(level.spawned[0].properties, vec![Property::new("posx", 5)]);
        assert_eq!(level.script_data.as_deref(), Some(r#"{"switch": true}"#));
    }

    #[test]
    fn test_level_properties_after_children() {
        // Level properties may follow the object lists
        let xml = r#"<save><information version="21"/>
            <level>
                <objects><object type="enemy"><property name="posx" value="1"/></object></objects>
                <property name="level_name" value="late"/>
            </level></save>"#;
        let doc = parse_str(xml, &registry()).unwrap();
        assert_eq!(doc.levels[0].name, "late");
        assert_eq!(doc.levels[0].objects[0].properties, vec![Property::new("posx", 1)]);
    }

    #[test]
    fn test_level_without_name_is_fatal() {
        let xml = r#"<save><information version="21"/><level></level></save>"#;
        let err = parse_str(xml, &registry()).unwrap_err();
        assert!(matches!(err, SaveError::Attribute { .. }));
    }

    #[test]
    fn test_unknown_spawn_type_is_recoverable() {
        let xml = r#"<save><information version="21"/>
            <level name="lvl_1"><spawned_objects>
                <object type="slime"/>
                <object type="goblin"/>
                <object type="dropped_item"/>
            </spawned_objects></level></save>"#;
        let doc = parse_str(xml, &registry()).unwrap();
        let tags: Vec<&str> = doc.levels[0].spawned.iter().map(|s| s.type_tag.as_str()).collect();
        assert_eq!(tags, vec!["slime", "dropped_item"]);
        assert_eq!(
            doc.warnings,
            vec![LoadWarning::UnknownSpawnType {
                level: "lvl_1".to_string(),
                type_tag: "goblin".to_string()
            }]
        );
    }

    #[test]
    fn test_spawned_object_without_type_is_fatal() {
        let xml = r#"<save><information version="21"/>
            <level name="lvl_1"><spawned_objects><object/></spawned_objects></level></save>"#;
        let err = parse_str(xml, &registry()).unwrap_err();
        match err {
            SaveError::Attribute { source, .. } => {
                assert_eq!(source, AttributeError::Missing { key: "type".to_string() })
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_old_spawned_element_names() {
        let xml = r#"<save><information version="10"/>
            <level name="lvl_1"><spawned_objects>
                <slime><property name="posx" value="3"/></slime>
            </spawned_objects></level></save>"#;
        let doc = parse_str(xml, &registry()).unwrap();
        assert_eq!(doc.levels[0].spawned[0].type_tag, "slime");
    }

    #[test]
    fn test_misplaced_section_is_fatal() {
        let xml = r#"<save><information version="21"/>
            <objects><object type="enemy"/></objects></save>"#;
        let err = parse_str(xml, &registry()).unwrap_err();
        assert!(matches!(err, SaveError::Structure(_)));
    }

    #[test]
    fn test_player_and_returns() {
        let xml = r#"<save><information version="21"/>
            <player>
                <property name="lives" value="4"/>
                <return>
                    <property name="level" value="world_a"/>
                    <property name="entry" value="pipe_2"/>
                </return>
                <return level="castle"/>
            </player></save>"#;
        let doc = parse_str(xml, &registry()).unwrap();
        assert_eq!(doc.player.properties, vec![Property::new("lives", 4)]);
        assert_eq!(
            doc.player.returns,
            vec![
                ReturnEntry { level: "world_a".to_string(), entry: "pipe_2".to_string() },
                ReturnEntry { level: "castle".to_string(), entry: String::new() },
            ]
        );
    }

    #[test]
    fn test_structured_overworld() {
        let xml = r#"<save><information version="21"/>
            <overworld name="world_1"><waypoints>
                <waypoint name="start" access="1" completed="1"/>
                <waypoint>
                    <property name="name" value="castle"/>
                    <property name="access" value="0"/>
                </waypoint>
            </waypoints></overworld></save>"#;
        let doc = parse_str(xml, &registry()).unwrap();
        assert_eq!(
            doc.overworld("world_1").unwrap().waypoints,
            vec![Waypoint::new("start", true, true), Waypoint::new("castle", false, false)]
        );
    }

    #[test]
    fn test_legacy_overworld_detected_structurally() {
        // No version field and no waypoint elements
        let xml = r#"<savegame><information/>
            <overworld_data>
                <property name="name" value="world_1"/>
                <property name="waypoints" value="start:1:1;castle:0"/>
            </overworld_data></savegame>"#;
        let doc = parse_str(xml, &registry()).unwrap();
        assert_eq!(doc.information.version, 0);
        assert_eq!(
            doc.overworlds[0].waypoints,
            vec![Waypoint::new("start", true, true), Waypoint::new("castle", false, false)]
        );
    }

    #[test]
    fn test_format_detection_is_per_overworld() {
        let xml = r#"<save><information version="21"/>
            <overworld name="old"><property name="progress" value="a:1"/></overworld>
            <overworld name="new"><waypoints><waypoint name="b" access="1"/></waypoints></overworld>
            </save>"#;
        let doc = parse_str(xml, &registry()).unwrap();
        assert_eq!(doc.overworld("old").unwrap().waypoints, vec![Waypoint::new("a", true, false)]);
        assert_eq!(doc.overworld("new").unwrap().waypoints, vec![Waypoint::new("b", true, false)]);
    }

    #[test]
    fn test_state_machine_rejects_bad_nesting() {
        let registry = registry();

        let mut loader = SavegameLoader::new(&registry);
        assert!(loader.handle(MarkupEvent::end("save")).is_err());

        let mut loader = SavegameLoader::new(&registry);
        loader.handle(MarkupEvent::start("save", &[])).unwrap();
        loader.handle(MarkupEvent::start("information", &[])).unwrap();
        let err = loader.handle(MarkupEvent::end("save")).unwrap_err();
        assert!(matches!(err, SaveError::Structure(_)));
    }

    #[test]
    fn test_state_machine_rejects_truncated_document() {
        let registry = registry();
        let mut loader = SavegameLoader::new(&registry);
        loader.handle(MarkupEvent::start("save", &[])).unwrap();
        loader.handle(MarkupEvent::start("information", &[("version", "21")])).unwrap();
        loader.handle(MarkupEvent::end("information")).unwrap();
        assert!(matches!(loader.finish(), Err(SaveError::Structure(_))));
    }

    #[test]
    fn test_property_must_be_empty() {
        let registry = registry();
        let mut loader = SavegameLoader::new(&registry);
        loader.handle(MarkupEvent::start("save", &[])).unwrap();
        loader.handle(MarkupEvent::start("information", &[])).unwrap();
        loader
            .handle(MarkupEvent::start("property", &[("name", "version"), ("value", "1")]))
            .unwrap();
        assert!(loader.handle(MarkupEvent::start("level", &[])).is_err());
    }

    #[test]
    fn test_text_outside_script_data_is_fatal() {
        let xml = r#"<save><information version="21">stray</information></save>"#;
        assert!(matches!(
            parse_str(xml, &registry()),
            Err(SaveError::Structure(_))
        ));
    }

    #[test]
    fn test_script_data_is_unescaped() {
        let xml = r#"<save><information version="21"/><level name="a">
            <script_data>{"text":"a &lt; b &amp; c"}</script_data></level></save>"#;
        let doc = parse_str(xml, &registry()).unwrap();
        assert_eq!(doc.levels[0].script_data.as_deref(), Some(r#"{"text":"a < b & c"}"#));
    }
}
