//! Connector access modes.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Access mode of a connector, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
pub enum AccessMode {
    /// Records can be iterated.
    #[strum(serialize = "r")]
    #[serde(rename = "r")]
    Read,
    /// Records can be added.
    #[strum(serialize = "w")]
    #[serde(rename = "w")]
    Write,
    /// Reserved. Connectors may refuse it with `NotSupported`.
    #[strum(serialize = "rw")]
    #[serde(rename = "rw")]
    ReadWrite,
}

impl AccessMode {
    /// Returns `true` if records may be iterated in this mode.
    #[must_use]
    pub fn can_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// Returns `true` if records may be added in this mode.
    #[must_use]
    pub fn can_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}
