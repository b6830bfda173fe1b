//! JSON-backed key/value store passed to script handlers

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::{Debug, Display};

/// Key/value store handed to script save and load handlers
///
/// Backed by a JSON object. Values can be nested by inserting another
/// `Carrier` or any `serde_json::Value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Carrier {
    entries: Map<String, Value>,
}

impl Carrier {
    pub fn new() -> Self {
        Carrier::default()
    }

    /// Decodes a stored payload; anything but a JSON object is rejected
    pub fn from_json(text: &str) -> Result<Self, String> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(entries)) => Ok(Carrier { entries }),
            Ok(other) => Err(format!("expected a JSON object, found {}", kind(&other))),
            Err(e) => Err(e.to_string()),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// JSON has no NaN or infinity; those are kept as their text form
    pub fn insert_float(&mut self, key: impl Into<String>, value: f64) {
        let value = if value.is_finite() {
            Value::from(value)
        } else {
            Value::String(value.to_string())
        };
        self.entries.insert(key.into(), value);
    }

    /// Stores any serializable value, or its `Debug` text if it has no JSON form
    pub fn insert_object<T: Serialize + Debug>(&mut self, key: impl Into<String>, value: &T) {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|_| Value::String(format!("{:?}", value)));
        self.entries.insert(key.into(), value);
    }

    pub fn insert_text<T: Display>(&mut self, key: impl Into<String>, value: &T) {
        self.entries.insert(key.into(), Value::String(value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

impl From<Carrier> for Value {
    fn from(carrier: Carrier) -> Self {
        Value::Object(carrier.entries)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
