//! Generic engine URL options.

use std::fmt;
use std::str::FromStr;

use conduit_core::{Container, Error, Result, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr, VariantNames};

/// Option keys accepted in `;key=value` segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr, VariantNames)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OptionKey {
    /// Character encoding for text sources.
    Encoding,
    /// First line to read. Parsed but not enforced yet.
    Start,
    /// Last line to read. Parsed but not enforced yet.
    End,
}

impl OptionKey {
    /// Returns `true` for keys whose value must be an integer.
    pub fn is_integer(self) -> bool {
        matches!(self, Self::Start | Self::End)
    }
}

/// Value of an engine URL option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Integer option such as `start`.
    Integer(i64),
    /// Text option such as `encoding`.
    Text(String),
}

impl OptionValue {
    /// Returns the text, if this is a text option.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(_) => None,
        }
    }

    /// Returns the integer, if this is an integer option.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Options decoded from the `;key=value` segments of an engine URL.
///
/// Keys keep the order they appeared in; a repeated key keeps its first
/// position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineOptions {
    entries: IndexMap<OptionKey, OptionValue>,
}

impl EngineOptions {
    /// Creates an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a single `key=value` segment and stores it.
    pub(crate) fn insert_segment(&mut self, segment: &str) -> Result<()> {
        let (key, value) = segment.split_once('=').ok_or_else(|| {
            Error::malformed_url()
                .with_message(format!("option segment '{segment}' is not in key=value form"))
        })?;

        let key = OptionKey::from_str(key).map_err(|_| {
            Error::invalid_option().with_message(format!(
                "unknown option '{key}', expected one of {:?}",
                OptionKey::VARIANTS
            ))
        })?;

        let value = if key.is_integer() {
            let parsed = value.trim().parse::<i64>().map_err(|err| {
                Error::invalid_option()
                    .with_message(format!("option '{key}' must be an integer, got '{value}'"))
                    .with_source(err)
            })?;
            OptionValue::Integer(parsed)
        } else {
            OptionValue::Text(value.to_owned())
        };

        self.entries.insert(key, value);
        Ok(())
    }

    /// Returns the value of an option.
    pub fn get(&self, key: OptionKey) -> Option<&OptionValue> {
        self.entries.get(&key)
    }

    /// Tests whether an option was given.
    pub fn contains(&self, key: OptionKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Returns the `encoding` option.
    pub fn encoding(&self) -> Option<&str> {
        self.get(OptionKey::Encoding).and_then(OptionValue::as_text)
    }

    /// Returns the `start` option.
    pub fn start(&self) -> Option<i64> {
        self.get(OptionKey::Start).and_then(OptionValue::as_integer)
    }

    /// Returns the `end` option.
    pub fn end(&self) -> Option<i64> {
        self.get(OptionKey::End).and_then(OptionValue::as_integer)
    }

    /// Iterates options in the order they were given.
    pub fn iter(&self) -> impl Iterator<Item = (OptionKey, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no options were given.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies the options into a mapping-shaped container.
    pub fn to_container(&self) -> Container {
        self.container_entries().collect()
    }

    /// Options as container entries, keyed by option name.
    pub(crate) fn container_entries(&self) -> impl Iterator<Item = (&'static str, Value)> + '_ {
        self.entries.iter().map(|(key, value)| {
            let value = match value {
                OptionValue::Integer(i) => Value::from(*i),
                OptionValue::Text(s) => Value::from(s.as_str()),
            };
            (<&'static str>::from(*key), value)
        })
    }
}

/// Renders the options as `;key=value` segments.
impl fmt::Display for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            write!(f, ";{key}={value}")?;
        }
        Ok(())
    }
}
