//! The connector contract.

use conduit_core::{Container, Error, Result, Value};
use derive_more::Display;

use super::AccessMode;
use crate::TRACING_TARGET_CONNECTOR;
use crate::url::{EngineOptions, EngineUrl};

/// How much of a source has been consumed, in source-defined units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("{consumed}/{total}")]
pub struct Position {
    /// Units consumed so far.
    pub consumed: u64,
    /// Total units in the source.
    pub total: u64,
}

impl Position {
    /// Creates a new position.
    pub fn new(consumed: u64, total: u64) -> Self {
        Self { consumed, total }
    }

    /// Fraction consumed, capped at `1.0`. `None` for an empty source.
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some((self.consumed as f64 / self.total as f64).min(1.0))
    }
}

/// Reader/writer over one data source, addressed by an engine URL.
///
/// Implementors supply the primitives (`open`, `release`, `read_next`,
/// `write_record`, `position` and the accessors). The lifecycle and the
/// access-mode checks live in the provided methods, so every connector
/// behaves the same way:
///
/// - [`connect`](Self::connect) is a no-op while connected.
/// - [`close`](Self::close) is a no-op while unconnected.
/// - [`next_record`](Self::next_record) and [`add`](Self::add) connect
///   implicitly and fail with `InvalidAccessMode` in the wrong mode.
///
/// The trait is object safe; the registry hands out `Box<dyn Connector>`.
pub trait Connector {
    /// Access mode fixed at construction.
    fn access(&self) -> AccessMode;

    /// Engine URL as given at construction.
    fn raw_engine_url(&self) -> &str;

    /// Parsed engine URL. Parsed once, then memoized.
    fn engine_url(&self) -> Result<&EngineUrl>;

    /// Returns `true` between a successful `open` and the next `release`.
    fn is_connected(&self) -> bool;

    /// Acquires underlying resources. Only called while unconnected.
    ///
    /// A failure partway must leave the connector unconnected.
    fn open(&mut self) -> Result<()>;

    /// Releases underlying resources. Only called while connected.
    ///
    /// The connector must be unconnected afterwards, even on error.
    fn release(&mut self) -> Result<()>;

    /// Reads the next record, or `None` at the end of the source.
    fn read_next(&mut self) -> Result<Option<Container>>;

    /// Writes one mapping-shaped record.
    fn write_record(&mut self, record: Container) -> Result<()>;

    /// Current read position, once at least one record was consumed.
    fn position(&self) -> Option<Position>;

    /// Opens the connector unless it is already connected.
    fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        self.open()?;
        tracing::debug!(
            target: TRACING_TARGET_CONNECTOR,
            engine_url = self.raw_engine_url(),
            access = %self.access(),
            "connector connected"
        );
        Ok(())
    }

    /// Releases resources. Safe to call when never connected.
    fn close(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }

        self.release()?;
        tracing::debug!(
            target: TRACING_TARGET_CONNECTOR,
            engine_url = self.raw_engine_url(),
            "connector closed"
        );
        Ok(())
    }

    /// Pulls the next record, connecting first if needed.
    fn next_record(&mut self) -> Result<Option<Container>> {
        if !self.access().can_read() {
            return Err(Error::invalid_access_mode().with_message(format!(
                "cannot iterate '{}' opened with access '{}'",
                self.raw_engine_url(),
                self.access()
            )));
        }

        self.connect()?;
        self.read_next()
    }

    /// Adds one record, connecting first if needed.
    ///
    /// The record must be a mapping-shaped container, or convert into one.
    fn add(&mut self, record: Value) -> Result<()> {
        if !self.access().can_write() {
            return Err(Error::invalid_access_mode().with_message(format!(
                "cannot add to '{}' opened with access '{}'",
                self.raw_engine_url(),
                self.access()
            )));
        }

        let record = match record {
            Value::Container(container) if container.is_mapping() => container,
            other => {
                return Err(Error::unsupported_type().with_message(format!(
                    "records must be mappings, got {}",
                    other.type_name()
                )));
            }
        };

        self.connect()?;
        self.write_record(record)
    }

    /// Fraction of the source consumed, in `[0.0, 1.0]`.
    ///
    /// `None` unless the access mode is exactly [`AccessMode::Read`], at
    /// least one record was consumed, and the source has a known size.
    fn progress(&self) -> Option<f64> {
        if self.access() != AccessMode::Read {
            return None;
        }
        self.position()?.fraction()
    }

    /// Options decoded from the engine URL.
    fn engine_url_options(&self) -> Result<&EngineOptions> {
        Ok(self.engine_url()?.options())
    }

    /// Returns `true` when the engine URL is a wildcard pattern that
    /// [`expand_pattern`](Self::expand_pattern) can turn into several
    /// concrete engine URLs.
    fn has_pattern(&self) -> bool {
        false
    }

    /// Expands a wildcard engine URL into one engine URL per matching source.
    ///
    /// Connectors that cannot enumerate their sources fail with
    /// `NotSupported`.
    fn expand_pattern(&self) -> Result<Vec<String>> {
        Err(Error::not_supported().with_message(format!(
            "'{}' cannot expand engine url patterns",
            self.raw_engine_url()
        )))
    }

    /// Checks whether the data source exists.
    fn exists(&self) -> Result<bool> {
        Err(Error::not_supported().with_message(format!(
            "'{}' cannot check whether its source exists",
            self.raw_engine_url()
        )))
    }
}
