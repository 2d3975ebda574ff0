//! Leaf and nested values held by a [`Container`].

use std::fmt;
use std::ops::Index;

use derive_more::From;
use jiff::civil::DateTime;
use serde::{Serialize, Serializer};
use serde_json::Number;

use super::Container;

/// Returned by the indexing sugar when a key or position is absent.
pub(crate) static NULL: Value = Value::Null;

/// A single value inside a [`Container`].
///
/// Scalars are stored as-is. Mapping and sequence values are always stored
/// as a nested [`Container`], so key and position lookups work the same way
/// at every depth.
#[derive(Debug, Clone, PartialEq, From)]
pub enum Value {
    /// Absent or explicit null.
    #[from(ignore)]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar.
    Number(Number),
    /// Text scalar.
    String(String),
    /// Calendar date and time without a zone.
    ///
    /// Not JSON-native; exports as its string representation.
    DateTime(DateTime),
    /// Nested mapping or sequence.
    Container(Container),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` when this value is a nested container.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Container(_))
    }

    /// Returns the boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string slice, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number as `i64`, if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Returns the number as `u64`, if it is a non-negative integer that fits.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    /// Returns the number as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Returns the datetime, if this is one.
    pub fn as_datetime(&self) -> Option<DateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Returns the nested container, if this is one.
    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Self::Container(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the nested container mutably, if this is one.
    pub fn as_container_mut(&mut self) -> Option<&mut Container> {
        match self {
            Self::Container(c) => Some(c),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::DateTime(_) => "datetime",
            Self::Container(c) => c.kind().into(),
        }
    }

    /// Exports this value as a plain JSON tree.
    ///
    /// Non-JSON-native scalars are converted through their string form.
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::DateTime(dt) => serde_json::Value::String(dt.to_string()),
            Self::Container(c) => c.to_json_value(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::Container(Container::from_values(items)),
            serde_json::Value::Object(map) => Self::Container(Container::from_entries(map)),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        value.to_json_value()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::DateTime(dt) => serializer.collect_str(dt),
            Self::Container(c) => c.serialize(serializer),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Container(c) => write!(f, "{c}"),
        }
    }
}

impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Self::Output {
        match self {
            Self::Container(c) => &c[key],
            _ => &NULL,
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        match self {
            Self::Container(c) => &c[index],
            _ => &NULL,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_scalar_accessors() {
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::from(4).as_i64(), Some(4));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(2.5).as_f64(), Some(2.5));
        assert!(Value::from(f64::NAN).is_null());
        assert!(Value::from(None::<i64>).is_null());
    }

    #[test]
    fn test_json_objects_become_containers() {
        let value = Value::from(json!({"tags": {"oneway": "yes"}, "payload": [[1, 2]]}));

        let container = value.as_container().unwrap();
        assert!(container.is_mapping());
        assert!(container.get("tags").unwrap().unwrap().is_container());
        assert_eq!(value["payload"][0][1].as_i64(), Some(2));
    }

    #[test]
    fn test_index_on_scalar_is_null() {
        let value = Value::from("leaf");
        assert!(value["anything"].is_null());
        assert!(value[3].is_null());
    }

    #[test]
    fn test_datetime_exports_as_string() {
        let dt: DateTime = "2020-01-15T10:34:12".parse().unwrap();
        let value = Value::from(dt);

        assert_eq!(value.to_json_value(), json!("2020-01-15T10:34:12"));
        assert_eq!(value.type_name(), "datetime");
    }
}
