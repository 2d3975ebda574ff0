//! Nested, order-preserving data container.
//!
//! A [`Container`] wraps exactly one of a mapping (unique keys, insertion
//! order kept) or a sequence. It is the record type handed into and out of
//! every connector.
//!
//! ```
//! use conduit_core::Container;
//! use serde_json::json;
//!
//! let animal = Container::try_from(json!({"name": "Cat", "legs": 4})).unwrap();
//! assert_eq!(animal["name"].as_str(), Some("Cat"));
//! assert_eq!(animal.as_dict(None).unwrap()["legs"], json!(4));
//! ```

mod export;
mod value;

use std::ops::Index;

use indexmap::IndexMap;
use strum::{AsRefStr, Display, IntoStaticStr};

pub use self::value::Value;
use self::value::NULL;
use crate::TRACING_TARGET;
use crate::error::{Error, Result};

/// Which of the two shapes a [`Container`] has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ShapeKind {
    /// Ordered key to value mapping.
    Mapping,
    /// Ordered list of values.
    Sequence,
}

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Mapping(IndexMap<String, Value>),
    Sequence(Vec<Value>),
}

/// Recursive mapping or sequence with key and position access.
///
/// The shape is fixed at construction. Mapping-only operations on a
/// sequence-shaped container (and the reverse) fail with
/// [`ErrorKind::WrongShape`](crate::ErrorKind::WrongShape).
///
/// Nested containers are owned exclusively. Use [`as_dict`](Self::as_dict)
/// or [`as_list`](Self::as_list) to take an independent structural copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    shape: Shape,
}

impl Container {
    /// Creates an empty mapping-shaped container.
    pub fn mapping() -> Self {
        Self {
            shape: Shape::Mapping(IndexMap::new()),
        }
    }

    /// Creates an empty sequence-shaped container.
    pub fn sequence() -> Self {
        Self {
            shape: Shape::Sequence(Vec::new()),
        }
    }

    /// Creates a mapping-shaped container from key/value pairs.
    ///
    /// Later duplicates of a key overwrite the earlier value in place.
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self {
            shape: Shape::Mapping(map),
        }
    }

    /// Creates a sequence-shaped container from values.
    pub fn from_values<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self {
            shape: Shape::Sequence(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Parses a JSON document whose top level is an object or an array.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Returns the shape of this container.
    pub fn kind(&self) -> ShapeKind {
        match self.shape {
            Shape::Mapping(_) => ShapeKind::Mapping,
            Shape::Sequence(_) => ShapeKind::Sequence,
        }
    }

    /// Returns `true` if mapping-shaped.
    pub fn is_mapping(&self) -> bool {
        self.kind() == ShapeKind::Mapping
    }

    /// Returns `true` if sequence-shaped.
    pub fn is_sequence(&self) -> bool {
        self.kind() == ShapeKind::Sequence
    }

    /// Number of entries or elements.
    pub fn len(&self) -> usize {
        match &self.shape {
            Shape::Mapping(map) => map.len(),
            Shape::Sequence(items) => items.len(),
        }
    }

    /// Returns `true` if there are no entries or elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the underlying mapping.
    pub fn as_mapping(&self) -> Result<&IndexMap<String, Value>> {
        match &self.shape {
            Shape::Mapping(map) => Ok(map),
            Shape::Sequence(_) => Err(wrong_shape(ShapeKind::Mapping)),
        }
    }

    /// Borrows the underlying sequence.
    pub fn as_sequence(&self) -> Result<&[Value]> {
        match &self.shape {
            Shape::Sequence(items) => Ok(items),
            Shape::Mapping(_) => Err(wrong_shape(ShapeKind::Sequence)),
        }
    }

    fn mapping_mut(&mut self) -> Result<&mut IndexMap<String, Value>> {
        match &mut self.shape {
            Shape::Mapping(map) => Ok(map),
            Shape::Sequence(_) => Err(wrong_shape(ShapeKind::Mapping)),
        }
    }

    fn sequence_mut(&mut self) -> Result<&mut Vec<Value>> {
        match &mut self.shape {
            Shape::Sequence(items) => Ok(items),
            Shape::Mapping(_) => Err(wrong_shape(ShapeKind::Sequence)),
        }
    }

    /// Looks up a key.
    pub fn get(&self, key: &str) -> Result<Option<&Value>> {
        Ok(self.as_mapping()?.get(key))
    }

    /// Looks up a key, falling back to `default` when it is absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> Result<&'a Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Looks up a key for in-place mutation.
    pub fn get_mut(&mut self, key: &str) -> Result<Option<&mut Value>> {
        Ok(self.mapping_mut()?.get_mut(key))
    }

    /// Attribute-style access: like [`get`](Self::get) but a missing key is
    /// an [`ErrorKind::NotFound`](crate::ErrorKind::NotFound) error.
    pub fn attr(&self, name: &str) -> Result<&Value> {
        self.get(name)?.ok_or_else(|| {
            Error::not_found().with_message(format!("container has no attribute '{name}'"))
        })
    }

    /// Sets a key, returning the value it replaced.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>> {
        Ok(self.mapping_mut()?.insert(key.into(), value.into()))
    }

    /// Removes a key, keeping the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        Ok(self.mapping_mut()?.shift_remove(key))
    }

    /// Tests whether a key is present.
    pub fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.as_mapping()?.contains_key(key))
    }

    /// Iterates mapping keys in insertion order.
    pub fn keys(&self) -> Result<impl Iterator<Item = &str>> {
        Ok(self.as_mapping()?.keys().map(String::as_str))
    }

    /// Iterates mapping entries in insertion order.
    pub fn entries(&self) -> Result<impl Iterator<Item = (&str, &Value)>> {
        Ok(self.as_mapping()?.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Iterates values of either shape in order.
    pub fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match &self.shape {
            Shape::Mapping(map) => Box::new(map.values()),
            Shape::Sequence(items) => Box::new(items.iter()),
        }
    }

    /// Returns the element at `index`.
    pub fn at(&self, index: usize) -> Result<Option<&Value>> {
        Ok(self.as_sequence()?.get(index))
    }

    /// Appends an element.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        self.sequence_mut()?.push(value.into());
        Ok(())
    }

    /// Tests sequence membership by equality.
    pub fn contains(&self, value: &Value) -> Result<bool> {
        Ok(self.as_sequence()?.contains(value))
    }

    /// Shallow merge.
    ///
    /// For a mapping, every key of `data` is assigned, unconditionally
    /// replacing whatever was there (including a nested container). For a
    /// sequence, elements of `data` not already present are appended.
    pub fn update(&mut self, data: Container) -> Result<()> {
        match data.shape {
            Shape::Sequence(items) => {
                integrate(self.sequence_mut()?, items);
            }
            Shape::Mapping(entries) => {
                let map = self.mapping_mut()?;
                for (key, value) in entries {
                    map.insert(key, value);
                }
            }
        }
        Ok(())
    }

    /// Deep merge.
    ///
    /// Nested containers are merged recursively, new keys are inserted and
    /// scalars overwrite scalars. Sequences only gain elements they do not
    /// already hold, so merging the same data twice is a no-op.
    ///
    /// Replacing a container with a scalar, a scalar with a container, or a
    /// mapping with a sequence fails with
    /// [`ErrorKind::IncompatibleMerge`](crate::ErrorKind::IncompatibleMerge).
    /// The whole of `data` is checked before anything is written, so a
    /// failed merge leaves `self` unchanged.
    pub fn merge(&mut self, data: Container) -> Result<()> {
        if self.kind() != data.kind() {
            return Err(wrong_shape(self.kind()).with_message(format!(
                "cannot merge a {} into a {}",
                data.kind(),
                self.kind()
            )));
        }

        self.check_merge(&data, "")?;
        tracing::trace!(
            target: TRACING_TARGET,
            kind = %self.kind(),
            incoming = data.len(),
            "merging container"
        );
        self.apply_merge(data);
        Ok(())
    }

    /// Replaces or merges content from a JSON document.
    ///
    /// Uses [`merge`](Self::merge) when `merge` is set, otherwise
    /// [`update`](Self::update).
    pub fn load(&mut self, json: &str, merge: bool) -> Result<()> {
        let data = Self::from_json_str(json)?;
        if merge {
            self.merge(data)
        } else {
            self.update(data)
        }
    }

    fn check_merge(&self, data: &Container, path: &str) -> Result<()> {
        let (Shape::Mapping(existing), Shape::Mapping(incoming)) = (&self.shape, &data.shape)
        else {
            return Ok(());
        };

        for (key, value) in incoming {
            let key_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };

            match (existing.get(key), value) {
                (Some(Value::Container(current)), Value::Container(next)) => {
                    if current.kind() != next.kind() {
                        let (from, to) = (current.kind(), next.kind());
                        return Err(incompatible(&key_path, from.as_ref(), to.as_ref()));
                    }
                    current.check_merge(next, &key_path)?;
                }
                (Some(current), Value::Container(next)) => {
                    return Err(incompatible(&key_path, current.type_name(), next.kind().as_ref()));
                }
                (Some(Value::Container(current)), next) => {
                    return Err(incompatible(&key_path, current.kind().as_ref(), next.type_name()));
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn apply_merge(&mut self, data: Container) {
        match (&mut self.shape, data.shape) {
            (Shape::Sequence(existing), Shape::Sequence(items)) => integrate(existing, items),
            (Shape::Mapping(existing), Shape::Mapping(entries)) => {
                for (key, value) in entries {
                    match (existing.get_mut(&key), value) {
                        (Some(Value::Container(current)), Value::Container(next)) => {
                            current.apply_merge(next);
                        }
                        (_, value) => {
                            existing.insert(key, value);
                        }
                    }
                }
            }
            // Shapes are checked before applying.
            _ => {}
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::mapping()
    }
}

impl From<IndexMap<String, Value>> for Container {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self {
            shape: Shape::Mapping(map),
        }
    }
}

impl From<Vec<Value>> for Container {
    fn from(items: Vec<Value>) -> Self {
        Self {
            shape: Shape::Sequence(items),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Container {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

impl Index<&str> for Container {
    type Output = Value;

    fn index(&self, key: &str) -> &Self::Output {
        match &self.shape {
            Shape::Mapping(map) => map.get(key).unwrap_or(&NULL),
            Shape::Sequence(_) => &NULL,
        }
    }
}

impl Index<usize> for Container {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        match &self.shape {
            Shape::Sequence(items) => items.get(index).unwrap_or(&NULL),
            Shape::Mapping(_) => &NULL,
        }
    }
}

fn integrate(existing: &mut Vec<Value>, items: Vec<Value>) {
    for item in items {
        if !existing.contains(&item) {
            existing.push(item);
        }
    }
}

fn wrong_shape(expected: ShapeKind) -> Error {
    Error::wrong_shape().with_message(format!("operation requires a {expected}-shaped container"))
}

fn incompatible(key: &str, existing: &str, incoming: &str) -> Error {
    Error::incompatible_merge().with_message(format!(
        "key '{key}' holds a {existing}, refusing to replace it with a {incoming}"
    ))
}
