//! JSON value types and utilities.
//!
//! This module defines the [`Value`] enum, which represents any decoded JSON
//! payload, the [`KeyValue`] pair used for order-preserving objects and
//! key/value emission, and the [`ValueType`] tag carried on every emitted
//! value.

use std::collections::BTreeMap;

pub type Map = BTreeMap<String, Value>;
pub type Array = Vec<Value>;

/// The type of a JSON value, independent of its payload representation.
///
/// Both integer and float payloads are tagged [`Number`]; both mapped and
/// order-preserving objects are tagged [`Object`].
///
/// [`Number`]: ValueType::Number
/// [`Object`]: ValueType::Object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Unknown,
    Null,
    String,
    Number,
    Boolean,
    Array,
    Object,
}

/// A key and value pair decoded from a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: Value,
}

/// A decoded JSON payload.
///
/// Numbers keep the distinction made while parsing: literals without `.`,
/// `e`, or `E` decode to [`Integer`], everything else to [`Float`]. Objects
/// decode to [`Object`] (a sorted map, duplicate keys keep the last value) or,
/// when insertion order must be preserved, to [`OrderedObject`] (duplicate
/// keys keep every entry). [`KeyValue`] wraps a value together with its member
/// name when key/value emission is enabled.
///
/// # Examples
///
/// ```
/// use jsonsift::{Map, Value};
///
/// let mut map = Map::new();
/// map.insert("key".to_string(), Value::String("value".into()));
/// let v = Value::Object(map);
/// assert_eq!(v.to_string(), r#"{"key":"value"}"#);
/// ```
///
/// [`Integer`]: Value::Integer
/// [`Float`]: Value::Float
/// [`Object`]: Value::Object
/// [`OrderedObject`]: Value::OrderedObject
/// [`KeyValue`]: Value::KeyValue
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Array),
    Object(Map),
    OrderedObject(Vec<KeyValue>),
    KeyValue(Box<KeyValue>),
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Self::Object(v)
    }
}

impl Value {
    /// Returns the [`ValueType`] tag for this payload.
    ///
    /// A [`Value::KeyValue`] reports the type of the wrapped value, matching
    /// the tag the decoder attaches when key/value emission is enabled.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) | Value::Float(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) | Value::OrderedObject(_) => ValueType::Object,
            Value::KeyValue(kv) => kv.value.value_type(),
        }
    }

    /// Returns `true` if the value is [`Null`].
    ///
    /// [`Null`]: Value::Null
    ///
    /// # Examples
    ///
    /// ```
    /// use jsonsift::Value;
    ///
    /// assert!(Value::Null.is_null());
    /// assert!(!Value::Boolean(false).is_null());
    /// ```
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if the value is [`Boolean`].
    ///
    /// [`Boolean`]: Value::Boolean
    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Boolean(..))
    }

    /// Returns `true` if the value is a number, either [`Integer`] or
    /// [`Float`].
    ///
    /// [`Integer`]: Value::Integer
    /// [`Float`]: Value::Float
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Integer(..) | Self::Float(..))
    }

    /// Returns `true` if the value is [`String`].
    ///
    /// [`String`]: Value::String
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(..))
    }

    /// Returns `true` if the value is [`Array`].
    ///
    /// [`Array`]: Value::Array
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(..))
    }

    /// Returns `true` if the value is an object, either [`Object`] or
    /// [`OrderedObject`].
    ///
    /// [`Object`]: Value::Object
    /// [`OrderedObject`]: Value::OrderedObject
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(..) | Self::OrderedObject(..))
    }
}

/// Escapes control characters in a string for inclusion in a JSON string
/// literal.
///
/// This function writes to the provided formatter, replacing characters such
/// as quotes, backslashes, control characters (<= U+001F), and Unicode line
/// separators with their JSON escape sequences.
pub(crate) fn write_escaped_string<W: std::fmt::Write>(src: &str, f: &mut W) -> std::fmt::Result {
    for c in src.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            // Escape Unicode line separators which pre-2019 JSON parsers may not handle correctly
            '\u{2028}' | '\u{2029}' => {
                write!(f, "\\u{:04X}", c as u32)?;
            }
            c if c.is_ascii_control() || c.is_control() && (c as u32) <= 0xFFFF => {
                write!(f, "\\u{:04X}", c as u32)?;
            }
            _ => f.write_char(c)?,
        }
    }
    Ok(())
}

/// Escapes control characters in a string for inclusion in a JSON string
/// literal and returns the result.
pub(crate) fn escape_string(src: &str) -> String {
    let mut result = String::with_capacity(src.len() + 2); // +2 for surrounding quotes
    write_escaped_string(src, &mut result).expect("string escaping cannot fail");
    result
}

impl std::fmt::Display for Value {
    /// Serializes the value as compact JSON.
    ///
    /// Ordered objects render their members in insertion order, so a decoded
    /// [`Value::OrderedObject`] round-trips through this serialization. Floats
    /// always render with a decimal point or exponent, so the output re-parses
    /// to the same variant.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Integer(n) => write!(f, "{n}"),
            // The Debug form keeps ".0" on integral floats; non-finite values
            // are not constructible from JSON input.
            Value::Float(n) => write!(f, "{n:?}"),
            Value::String(s) => {
                write!(f, "\"{}\"", escape_string(s))
            }
            Value::Array(arr) => {
                f.write_str("[")?;
                let mut first = true;
                for v in arr {
                    if !first {
                        f.write_str(",")?;
                    }
                    first = false;
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                f.write_str("{")?;
                let mut first = true;
                for (k, v) in map {
                    if !first {
                        f.write_str(",")?;
                    }
                    first = false;
                    write!(f, "\"{}\":{}", escape_string(k), v)?;
                }
                f.write_str("}")
            }
            Value::OrderedObject(entries) => {
                f.write_str("{")?;
                let mut first = true;
                for kv in entries {
                    if !first {
                        f.write_str(",")?;
                    }
                    first = false;
                    write!(f, "\"{}\":{}", escape_string(&kv.key), kv.value)?;
                }
                f.write_str("}")
            }
            Value::KeyValue(kv) => {
                write!(
                    f,
                    "{{\"key\":\"{}\",\"value\":{}}}",
                    escape_string(&kv.key),
                    kv.value
                )
            }
        }
    }
}
