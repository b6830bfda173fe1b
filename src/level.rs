//! Level object bookkeeping for save/restore
//!
//! A level owns two kinds of persistable objects:
//! - placed objects, created from the level design; they are saved as diffs
//!   and matched back on load by type, design-time position and ordinal among
//!   objects sharing that type and position
//! - spawned objects, created at runtime; they are saved in full and rebuilt
//!   through the `SpawnRegistry`
//!
//! Script state is attached through the level's own `ScriptBridge`.

use crate::save::saveable::has_overrides;
use crate::save::{
    AttributeBag, AttributeError, LevelObjectOverride, LevelSnapshot, LoadWarning, Property,
    Saveable, SpawnRegistry, SpawnedObject,
};
use crate::scripting::{LevelContext, ScriptBridge};
use log::{debug, warn};
use std::collections::HashMap;

/// Index among placed objects of the same type and design position
pub const ORDINAL_KEY: &str = "ordinal";

pub struct Level {
    pub name: String,
    pub player_pos: Option<(f32, f32)>,
    pub scripts: ScriptBridge,
    objects: Vec<Box<dyn Saveable>>,
    spawned: Vec<Box<dyn Saveable>>,
}

impl Level {
    pub fn new(name: impl Into<String>) -> Self {
        Level {
            name: name.into(),
            player_pos: None,
            scripts: ScriptBridge::new(),
            objects: Vec::new(),
            spawned: Vec::new(),
        }
    }

    /// Adds a design-time object
    pub fn place(&mut self, object: impl Saveable + 'static) {
        self.objects.push(Box::new(object));
    }

    /// Adds a runtime-spawned object
    pub fn spawn(&mut self, object: impl Saveable + 'static) {
        self.spawned.push(Box::new(object));
    }

    pub fn objects(&self) -> &[Box<dyn Saveable>] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [Box<dyn Saveable>] {
        &mut self.objects
    }

    pub fn spawned(&self) -> &[Box<dyn Saveable>] {
        &self.spawned
    }

    pub fn context(&self) -> LevelContext {
        LevelContext::new(self.name.clone())
    }

    /// Placed objects of a concrete type, in placement order
    pub fn placed_of<T: 'static>(&self) -> impl Iterator<Item = &T> {
        self.objects.iter().filter_map(|object| object.as_any().downcast_ref::<T>())
    }

    /// Spawned objects of a concrete type, in spawn order
    pub fn spawned_of<T: 'static>(&self) -> impl Iterator<Item = &T> {
        self.spawned.iter().filter_map(|object| object.as_any().downcast_ref::<T>())
    }

    /// Captures the level state; unchanged placed objects are left out
    ///
    /// Objects sharing a type and design position are told apart by their
    /// placement order; an override for any but the first of them carries
    /// that index as `ordinal`.
    pub fn save(&self) -> LevelSnapshot {
        let mut counters: HashMap<(&str, (i32, i32)), usize> = HashMap::new();
        let mut objects = Vec::new();
        for object in &self.objects {
            let counter = counters
                .entry((object.type_tag(), object.design_position()))
                .or_default();
            let ordinal = *counter;
            *counter += 1;

            let mut properties = object.save();
            if !has_overrides(&properties) {
                continue;
            }
            if ordinal > 0 {
                properties.push(Property::new(ORDINAL_KEY, ordinal));
            }
            objects.push(LevelObjectOverride {
                type_tag: object.type_tag().to_string(),
                properties,
            });
        }

        let spawned = self
            .spawned
            .iter()
            .map(|object| SpawnedObject {
                type_tag: object.type_tag().to_string(),
                properties: object.save(),
            })
            .collect();

        LevelSnapshot {
            name: self.name.clone(),
            player_pos: self.player_pos,
            objects,
            spawned,
            script_data: None,
        }
    }

    /// Applies a snapshot; problems with single objects become warnings
    pub fn restore(
        &mut self,
        snapshot: &LevelSnapshot,
        registry: &SpawnRegistry,
    ) -> Vec<LoadWarning> {
        let mut warnings = Vec::new();
        if snapshot.player_pos.is_some() {
            self.player_pos = snapshot.player_pos;
        }

        // Overrides without an `ordinal` key count up per type and position
        let mut counters: HashMap<(&str, i32, i32), usize> = HashMap::new();
        for saved in &snapshot.objects {
            let mut bag = AttributeBag::from_properties(&saved.properties);
            let (x, y) = match identity(&bag) {
                Ok(position) => position,
                Err(err) => {
                    warnings.push(self.malformed(&saved.type_tag, &err));
                    continue;
                }
            };

            let counter = counters.entry((saved.type_tag.as_str(), x, y)).or_default();
            let fallback = *counter;
            *counter += 1;
            let ordinal = match bag.fetch(ORDINAL_KEY, fallback) {
                Ok(ordinal) => ordinal,
                Err(err) => {
                    warnings.push(self.malformed(&saved.type_tag, &err));
                    continue;
                }
            };
            bag.remove(ORDINAL_KEY);

            let target = self
                .objects
                .iter_mut()
                .filter(|object| {
                    object.type_tag() == saved.type_tag && object.design_position() == (x, y)
                })
                .nth(ordinal);
            match target {
                Some(object) => {
                    if let Err(err) = object.restore(&bag) {
                        warnings.push(self.malformed(&saved.type_tag, &err));
                    }
                }
                None => warnings.push(LoadWarning::UnmatchedOverride {
                    level: self.name.clone(),
                    type_tag: saved.type_tag.clone(),
                    x,
                    y,
                    ordinal,
                }),
            }
        }

        self.spawned.clear();
        for saved in &snapshot.spawned {
            let Some(mut object) = registry.create(&saved.type_tag) else {
                warnings.push(LoadWarning::UnknownSpawnType {
                    level: self.name.clone(),
                    type_tag: saved.type_tag.clone(),
                });
                continue;
            };
            match object.restore(&AttributeBag::from_properties(&saved.properties)) {
                Ok(()) => self.spawned.push(object),
                Err(err) => warnings.push(self.malformed(&saved.type_tag, &err)),
            }
        }

        for warning in &warnings {
            warn!("{}", warning);
        }
        debug!(
            "level '{}' restored: {} overrides, {} spawned, {} warnings",
            self.name,
            snapshot.objects.len(),
            self.spawned.len(),
            warnings.len()
        );
        warnings
    }

    fn malformed(&self, type_tag: &str, err: &AttributeError) -> LoadWarning {
        LoadWarning::MalformedObject {
            level: self.name.clone(),
            type_tag: type_tag.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Design-time position stored in an override
fn identity(bag: &AttributeBag) -> Result<(i32, i32), AttributeError> {
    let x: f32 = bag.retrieve("posx")?;
    let y: f32 = bag.retrieve("posy")?;
    Ok((x.round() as i32, y.round() as i32))
}
