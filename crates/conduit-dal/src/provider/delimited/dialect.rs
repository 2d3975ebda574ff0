//! Delimiter dialects and text encodings.

use conduit_core::{Error, Result};
use strum::{AsRefStr, Display, IntoStaticStr};

use crate::url::EngineOptions;

/// Byte-order mark written by `utf-8-sig` and skipped on read.
pub(crate) const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";

/// Static description of a delimited-text format.
pub trait Dialect: Send + Sync + 'static {
    /// Connector name.
    const NAME: &'static str;
    /// Engine types served by this dialect.
    const ENGINE_TYPES: &'static [&'static str];
    /// Field delimiter.
    const DELIMITER: u8;
}

/// Comma-separated values, `csv://`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Comma;

impl Dialect for Comma {
    const DELIMITER: u8 = b',';
    const ENGINE_TYPES: &'static [&'static str] = &["csv://"];
    const NAME: &'static str = "csv";
}

/// Tab-separated values, `tsv://`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tab;

impl Dialect for Tab {
    const DELIMITER: u8 = b'\t';
    const ENGINE_TYPES: &'static [&'static str] = &["tsv://"];
    const NAME: &'static str = "tsv";
}

/// Text encodings understood by the delimited connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum TextEncoding {
    /// UTF-8 without a byte-order mark.
    #[default]
    #[strum(serialize = "utf-8")]
    Utf8,
    /// UTF-8 with a byte-order mark written ahead of the data.
    #[strum(serialize = "utf-8-sig")]
    Utf8Sig,
}

impl TextEncoding {
    /// Reads the `encoding` option, defaulting to UTF-8.
    pub fn from_options(options: &EngineOptions) -> Result<Self> {
        let Some(encoding) = options.encoding() else {
            return Ok(Self::default());
        };

        match encoding.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-8-sig" | "utf8-sig" => Ok(Self::Utf8Sig),
            _ => Err(Error::not_supported()
                .with_message(format!("encoding '{encoding}' is not supported"))),
        }
    }

    /// Returns `true` if a byte-order mark is written on create.
    #[must_use]
    pub fn writes_bom(self) -> bool {
        matches!(self, Self::Utf8Sig)
    }
}
