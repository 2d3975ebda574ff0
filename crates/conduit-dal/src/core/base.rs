//! State shared by connector implementations.

use std::sync::OnceLock;

use conduit_core::Result;

use super::AccessMode;
use crate::url::EngineUrl;

/// Engine URL and access mode of a connector.
///
/// The engine URL is parsed on first use and memoized, so repeated reads of
/// the options return the same allocation.
#[derive(Debug)]
pub struct ConnectorBase {
    raw: String,
    access: AccessMode,
    parsed: OnceLock<EngineUrl>,
}

impl ConnectorBase {
    /// Creates the shared state without parsing the engine URL yet.
    pub fn new(engine_url: impl Into<String>, access: AccessMode) -> Self {
        Self {
            raw: engine_url.into(),
            access,
            parsed: OnceLock::new(),
        }
    }

    /// Access mode fixed at construction.
    #[must_use]
    pub fn access(&self) -> AccessMode {
        self.access
    }

    /// Engine URL as given.
    #[must_use]
    pub fn raw_engine_url(&self) -> &str {
        &self.raw
    }

    /// Parsed engine URL.
    pub fn engine_url(&self) -> Result<&EngineUrl> {
        if let Some(parsed) = self.parsed.get() {
            return Ok(parsed);
        }

        let parsed = EngineUrl::parse(&self.raw)?;
        Ok(self.parsed.get_or_init(|| parsed))
    }
}
