//! Typed attribute store
//!
//! An `AttributeBag` maps attribute names to raw text. The loader fills one bag
//! per markup element and entities read their state back out of a bag when they
//! are restored.
//!
//! Values are converted on the way out:
//! - `fetch` falls back to a default when the key is absent
//! - `retrieve` fails with `AttributeError::Missing` when the key is absent
//! - both fail with `AttributeError::Malformed` when the text does not parse,
//!   so corrupt data is never silently replaced by a default

use super::types::Property;
use thiserror::Error;

/// Errors raised while converting attribute text into typed values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("required key '{key}' missing")]
    Missing { key: String },

    #[error("malformed value '{value}' for key '{key}' (expected {expected})")]
    Malformed {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Conversion from raw attribute text
///
/// Returning `None` marks the text as malformed for this type.
pub trait FromAttribute: Sized {
    /// Human readable type name used in error messages
    const EXPECTED: &'static str;

    fn from_attribute(raw: &str) -> Option<Self>;
}

/// Conversion into attribute text (write side, never fails)
pub trait ToAttribute {
    fn to_attribute(&self) -> String;
}

macro_rules! numeric_attribute {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromAttribute for $ty {
                const EXPECTED: &'static str = $name;

                fn from_attribute(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }
            }

            impl ToAttribute for $ty {
                fn to_attribute(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

numeric_attribute! {
    i8 => "integer",
    i16 => "integer",
    i32 => "integer",
    i64 => "integer",
    u8 => "unsigned integer",
    u16 => "unsigned integer",
    u32 => "unsigned integer",
    u64 => "unsigned integer",
    usize => "unsigned integer",
    f32 => "number",
    f64 => "number",
}

impl FromAttribute for bool {
    const EXPECTED: &'static str = "boolean (0/1)";

    fn from_attribute(raw: &str) -> Option<Self> {
        match raw.trim() {
            "true" => Some(true),
            "false" => Some(false),
            // Any positive integer counts as set
            other => other.parse::<i64>().ok().map(|value| value > 0),
        }
    }
}

impl ToAttribute for bool {
    fn to_attribute(&self) -> String {
        String::from(if *self { "1" } else { "0" })
    }
}

// Strings are taken verbatim, no parsing step
impl FromAttribute for String {
    const EXPECTED: &'static str = "text";

    fn from_attribute(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl ToAttribute for String {
    fn to_attribute(&self) -> String {
        self.clone()
    }
}

impl ToAttribute for str {
    fn to_attribute(&self) -> String {
        self.to_string()
    }
}

impl<T: ToAttribute + ?Sized> ToAttribute for &T {
    fn to_attribute(&self) -> String {
        (**self).to_attribute()
    }
}

/// Transient name → raw text mapping for one element or object
///
/// Keys are unique; insertion order is kept so a bag turns back into the
/// property list it was read from. Bags hold a handful of entries, so lookups
/// are linear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeBag {
    values: Vec<(String, String)>,
}

impl AttributeBag {
    pub fn new() -> Self {
        AttributeBag { values: Vec::new() }
    }

    /// Builds a bag from a property list; later duplicates overwrite earlier ones
    pub fn from_properties(properties: &[Property]) -> Self {
        let mut bag = Self::new();
        bag.extend(properties.iter().cloned());
        bag
    }

    /// Inserts or replaces a raw value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.values.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.values.iter().position(|(k, _)| k == key)?;
        Some(self.values.remove(index).1)
    }

    pub fn extend(&mut self, properties: impl IntoIterator<Item = Property>) {
        for property in properties {
            self.insert(property.name, property.value);
        }
    }

    /// True if the key is present, whatever its value
    pub fn exists(&self, key: &str) -> bool {
        self.raw(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Raw text for a key, without any conversion
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Raw text for a key, or the given default
    pub fn fetch_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.raw(key).unwrap_or(default)
    }

    /// Returns the converted value, or `default` when the key is absent
    pub fn fetch<T: FromAttribute>(&self, key: &str, default: T) -> Result<T, AttributeError> {
        match self.raw(key) {
            Some(raw) => convert(key, raw),
            None => Ok(default),
        }
    }

    /// Like `fetch` but yields `None` for an absent key
    pub fn fetch_opt<T: FromAttribute>(&self, key: &str) -> Result<Option<T>, AttributeError> {
        self.raw(key).map(|raw| convert(key, raw)).transpose()
    }

    /// Returns the converted value; an absent key is an error
    pub fn retrieve<T: FromAttribute>(&self, key: &str) -> Result<T, AttributeError> {
        match self.raw(key) {
            Some(raw) => convert(key, raw),
            None => Err(AttributeError::Missing {
                key: key.to_string(),
            }),
        }
    }

    /// Converts the bag into a property list in insertion order
    pub fn into_properties(self) -> Vec<Property> {
        self.values
            .into_iter()
            .map(|(name, value)| Property { name, value })
            .collect()
    }
}

fn convert<T: FromAttribute>(key: &str, raw: &str) -> Result<T, AttributeError> {
    T::from_attribute(raw).ok_or_else(|| AttributeError::Malformed {
        key: key.to_string(),
        value: raw.to_string(),
        expected: T::EXPECTED,
    })
}
