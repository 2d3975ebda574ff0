//! Conversions between [`Container`] and plain JSON trees.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Map;

use super::{Container, Shape, ShapeKind, wrong_shape};
use crate::error::{Error, Result};

impl Container {
    /// Exports a mapping-shaped container as a plain JSON object.
    ///
    /// Nested containers are exported recursively. With `select_fields`,
    /// only those top-level keys are exported, in the given order; a missing
    /// key is an [`ErrorKind::NotFound`](crate::ErrorKind::NotFound) error.
    pub fn as_dict(&self, select_fields: Option<&[&str]>) -> Result<Map<String, serde_json::Value>> {
        let map = self.as_mapping()?;

        let Some(fields) = select_fields else {
            return Ok(map
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json_value()))
                .collect());
        };

        fields
            .iter()
            .map(|&field| {
                let value = map.get(field).ok_or_else(|| {
                    Error::not_found().with_message(format!("field '{field}' is not present"))
                })?;
                Ok((field.to_owned(), value.to_json_value()))
            })
            .collect()
    }

    /// Exports a sequence-shaped container as a plain JSON array.
    pub fn as_list(&self) -> Result<Vec<serde_json::Value>> {
        Ok(self
            .as_sequence()?
            .iter()
            .map(|v| v.to_json_value())
            .collect())
    }

    /// Exports either shape as a plain JSON tree.
    pub fn to_json_value(&self) -> serde_json::Value {
        match &self.shape {
            Shape::Mapping(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
            Shape::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json_value()).collect())
            }
        }
    }

    /// Serializes the export of this container to a compact JSON document.
    ///
    /// `select_fields` is only meaningful for mappings; passing it for a
    /// sequence fails with [`ErrorKind::WrongShape`](crate::ErrorKind::WrongShape).
    pub fn as_json(&self, select_fields: Option<&[&str]>) -> Result<String> {
        let exported = match (self.kind(), select_fields) {
            (ShapeKind::Mapping, fields) => serde_json::Value::Object(self.as_dict(fields)?),
            (ShapeKind::Sequence, None) => serde_json::Value::Array(self.as_list()?),
            (ShapeKind::Sequence, Some(_)) => {
                return Err(wrong_shape(ShapeKind::Mapping)
                    .with_message("select_fields requires a mapping-shaped container"));
            }
        };

        Ok(serde_json::to_string(&exported)?)
    }
}

impl TryFrom<serde_json::Value> for Container {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(map) => Ok(Self::from_entries(map)),
            serde_json::Value::Array(items) => Ok(Self::from_values(items)),
            other => Err(Error::wrong_shape().with_message(format!(
                "a container needs a JSON object or array, got {other}"
            ))),
        }
    }
}

impl From<Map<String, serde_json::Value>> for Container {
    fn from(map: Map<String, serde_json::Value>) -> Self {
        Self::from_entries(map)
    }
}

impl From<Container> for serde_json::Value {
    fn from(container: Container) -> Self {
        container.to_json_value()
    }
}

impl Serialize for Container {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match &self.shape {
            Shape::Mapping(map) => serializer.collect_map(map),
            Shape::Sequence(items) => serializer.collect_seq(items),
        }
    }
}

impl<'de> Deserialize<'de> for Container {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(D::Error::custom)
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json_value())
    }
}
