//! Script save/load hooks for one level
//!
//! Handlers write into a `Carrier` on save; the carrier is stored as the
//! level's script data and handed back to load handlers when the file is read.

use super::carrier::Carrier;
use crate::save::{LoadWarning, SaveError};
use log::{debug, warn};

/// Level a script handler is running for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelContext {
    pub level_name: String,
}

impl LevelContext {
    pub fn new(level_name: impl Into<String>) -> Self {
        LevelContext {
            level_name: level_name.into(),
        }
    }
}

pub type SaveHandler = Box<dyn FnMut(&LevelContext, &mut Carrier)>;
pub type LoadHandler = Box<dyn FnMut(&LevelContext, &Carrier)>;

/// Save and load handlers registered by a level's scripts
#[derive(Default)]
pub struct ScriptBridge {
    save_handlers: Vec<SaveHandler>,
    load_handlers: Vec<LoadHandler>,
}

impl ScriptBridge {
    pub fn new() -> Self {
        ScriptBridge::default()
    }

    pub fn on_save(&mut self, handler: impl FnMut(&LevelContext, &mut Carrier) + 'static) {
        self.save_handlers.push(Box::new(handler));
    }

    pub fn on_load(&mut self, handler: impl FnMut(&LevelContext, &Carrier) + 'static) {
        self.load_handlers.push(Box::new(handler));
    }

    /// Drops every registered handler, e.g. when the level's scripts reload
    pub fn clear(&mut self) {
        self.save_handlers.clear();
        self.load_handlers.clear();
    }

    pub fn has_handlers(&self) -> bool {
        !self.save_handlers.is_empty() || !self.load_handlers.is_empty()
    }

    /// Runs the save handlers on one shared carrier, in registration order
    ///
    /// A key written by several handlers keeps the last value. Returns `None`
    /// when nothing was stored, so no script section gets written.
    pub fn fire_save(&mut self, ctx: &LevelContext) -> Result<Option<String>, SaveError> {
        let mut carrier = Carrier::new();
        for handler in &mut self.save_handlers {
            handler(ctx, &mut carrier);
        }
        if carrier.is_empty() {
            return Ok(None);
        }

        let payload = carrier.to_json()?;
        debug!(
            "level '{}': {} script entries saved",
            ctx.level_name,
            carrier.len()
        );
        Ok(Some(payload))
    }

    /// Decodes the payload once and hands it to every load handler
    ///
    /// An absent or blank payload gives an empty carrier. An undecodable one
    /// gives an empty carrier too, plus the returned warning.
    pub fn fire_load(&mut self, ctx: &LevelContext, payload: Option<&str>) -> Option<LoadWarning> {
        let (carrier, warning) = match payload.map(str::trim).filter(|text| !text.is_empty()) {
            None => (Carrier::new(), None),
            Some(text) => match Carrier::from_json(text) {
                Ok(carrier) => (carrier, None),
                Err(reason) => {
                    let warning = LoadWarning::CorruptScriptPayload {
                        level: ctx.level_name.clone(),
                        reason,
                    };
                    warn!("{}", warning);
                    (Carrier::new(), Some(warning))
                }
            },
        };

        for handler in &mut self.load_handlers {
            handler(ctx, &carrier);
        }
        warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ctx() -> LevelContext {
        LevelContext::new("lvl_1")
    }

    #[test]
    fn test_no_handlers_saves_nothing() {
        let mut bridge = ScriptBridge::new();
        assert_eq!(bridge.fire_save(&ctx()).unwrap(), None);

        bridge.on_save(|_, _| {});
        assert_eq!(bridge.fire_save(&ctx()).unwrap(), None);
    }

    #[test]
    fn test_last_save_handler_wins_per_key() {
        let mut bridge = ScriptBridge::new();
        bridge.on_save(|_, carrier| {
            carrier.insert("red", false);
            carrier.insert("blue", true);
        });
        bridge.on_save(|_, carrier| carrier.insert("red", true));

        let payload = bridge.fire_save(&ctx()).unwrap().unwrap();
        let carrier = Carrier::from_json(&payload).unwrap();
        assert_eq!(carrier.get_bool("red"), Some(true));
        assert_eq!(carrier.get_bool("blue"), Some(true));
    }

    #[test]
    fn test_context_is_passed_through() {
        let mut bridge = ScriptBridge::new();
        bridge.on_save(|ctx, carrier| carrier.insert("level", ctx.level_name.clone()));
        let payload = bridge.fire_save(&LevelContext::new("castle")).unwrap().unwrap();
        assert_eq!(payload, r#"{"level":"castle"}"#);
    }

    #[test]
    fn test_load_handlers_share_one_decode() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bridge = ScriptBridge::new();
        for _ in 0..2 {
            let seen = Rc::clone(&seen);
            bridge.on_load(move |_, carrier| seen.borrow_mut().push(carrier.get_bool("red")));
        }

        assert_eq!(bridge.fire_load(&ctx(), Some(r#"{"red":true}"#)), None);
        assert_eq!(*seen.borrow(), vec![Some(true), Some(true)]);
    }

    #[test]
    fn test_corrupt_payload_gives_empty_carrier_and_warning() {
        let empty = Rc::new(RefCell::new(None));
        let mut bridge = ScriptBridge::new();
        let flag = Rc::clone(&empty);
        bridge.on_load(move |_, carrier| *flag.borrow_mut() = Some(carrier.is_empty()));

        let warning = bridge.fire_load(&ctx(), Some("{\"red\": tru"));
        assert!(matches!(warning, Some(LoadWarning::CorruptScriptPayload { .. })));
        assert_eq!(*empty.borrow(), Some(true));

        let warning = bridge.fire_load(&ctx(), Some("17"));
        assert!(matches!(warning, Some(LoadWarning::CorruptScriptPayload { .. })));
    }

    #[test]
    fn test_absent_payload_still_runs_handlers() {
        let calls = Rc::new(RefCell::new(0));
        let mut bridge = ScriptBridge::new();
        let counter = Rc::clone(&calls);
        bridge.on_load(move |_, carrier| {
            assert!(carrier.is_empty());
            *counter.borrow_mut() += 1;
        });

        assert_eq!(bridge.fire_load(&ctx(), None), None);
        assert_eq!(bridge.fire_load(&ctx(), Some("  ")), None);
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn test_clear() {
        let mut bridge = ScriptBridge::new();
        bridge.on_save(|_, carrier| carrier.insert("a", 1));
        assert!(bridge.has_handlers());
        bridge.clear();
        assert!(!bridge.has_handlers());
        assert_eq!(bridge.fire_save(&ctx()).unwrap(), None);
    }
}
