//! Delimited-text connectors: `csv://` and `tsv://`.
//!
//! Every row is a mapping-shaped [`Container`] keyed by the header names.
//! Cells are read as strings; there is no type coercion.

mod dialect;
mod reader;
mod writer;

use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use conduit_core::{Container, Error, Result};

pub use self::dialect::{Comma, Dialect, Tab, TextEncoding};
use self::reader::DelimitedReader;
use self::writer::DelimitedWriter;
use crate::TRACING_TARGET_CONNECTOR;
use crate::core::{AccessMode, Connector, ConnectorBase, Position};
use crate::registry::ConnectorType;
use crate::provider::expand_filesystem_pattern;
use crate::url::{EngineUrl, OptionKey, has_pattern};

/// Comma-separated values connector.
pub type CsvConnector = DelimitedConnector<Comma>;

/// Tab-separated values connector.
pub type TsvConnector = DelimitedConnector<Tab>;

enum State {
    Closed,
    Reading(DelimitedReader),
    Writing(DelimitedWriter),
}

/// Connector over a local delimited-text file.
///
/// Construction validates the engine URL; the file is only touched on
/// connect. Dropping a connected instance closes it and logs a failed
/// flush instead of raising it.
pub struct DelimitedConnector<D: Dialect> {
    base: ConnectorBase,
    path: PathBuf,
    encoding: TextEncoding,
    state: State,
    _dialect: PhantomData<D>,
}

impl<D: Dialect> DelimitedConnector<D> {
    /// Creates an unconnected connector.
    ///
    /// # Errors
    ///
    /// - `MalformedUrl` or `InvalidOption` for an unparsable engine URL, and
    ///   `MalformedUrl` for an empty path.
    /// - `UnknownEngine` if the engine type belongs to another connector.
    /// - `NotSupported` for [`AccessMode::ReadWrite`], the `start`/`end`
    ///   options, and encodings other than UTF-8.
    pub fn new(engine_url: impl Into<String>, access: AccessMode) -> Result<Self> {
        let base = ConnectorBase::new(engine_url, access);
        let url = base.engine_url()?;

        if !D::ENGINE_TYPES.iter().any(|&claimed| claimed == url.engine_type()) {
            return Err(Error::unknown_engine().with_message(format!(
                "{} connector cannot serve engine type '{}'",
                D::NAME,
                url.engine_type()
            )));
        }

        if url.path().is_empty() {
            return Err(Error::malformed_url()
                .with_message(format!("'{}' has an empty path", base.raw_engine_url())));
        }

        if access == AccessMode::ReadWrite {
            return Err(Error::not_supported()
                .with_message(format!("{} connector cannot read and write at once", D::NAME)));
        }

        for key in [OptionKey::Start, OptionKey::End] {
            if url.options().contains(key) {
                return Err(Error::not_supported()
                    .with_message(format!("option '{key}' is not enforced yet")));
            }
        }

        let encoding = TextEncoding::from_options(url.options())?;
        let path = PathBuf::from(url.path());

        Ok(Self {
            base,
            path,
            encoding,
            state: State::Closed,
            _dialect: PhantomData,
        })
    }

    /// Local file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Text encoding taken from the `encoding` option.
    #[must_use]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Field order fixed by the first written record.
    #[must_use]
    pub fn fields(&self) -> Option<&[String]> {
        match &self.state {
            State::Writing(writer) => writer.fields(),
            _ => None,
        }
    }
}

impl<D: Dialect> Connector for DelimitedConnector<D> {
    fn access(&self) -> AccessMode {
        self.base.access()
    }

    fn raw_engine_url(&self) -> &str {
        self.base.raw_engine_url()
    }

    fn engine_url(&self) -> Result<&EngineUrl> {
        self.base.engine_url()
    }

    fn is_connected(&self) -> bool {
        !matches!(self.state, State::Closed)
    }

    fn open(&mut self) -> Result<()> {
        self.state = match self.access() {
            AccessMode::Read => State::Reading(DelimitedReader::open(&self.path, D::DELIMITER)?),
            AccessMode::Write => State::Writing(DelimitedWriter::create(
                &self.path,
                D::DELIMITER,
                self.encoding,
            )?),
            AccessMode::ReadWrite => {
                return Err(Error::not_supported()
                    .with_message(format!("{} connector cannot read and write at once", D::NAME)));
            }
        };
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Writing(writer) => writer.finish(),
            State::Reading(_) | State::Closed => Ok(()),
        }
    }

    fn read_next(&mut self) -> Result<Option<Container>> {
        match &mut self.state {
            State::Reading(reader) => reader.next_record(),
            _ => Err(Error::invalid_access_mode()
                .with_message(format!("'{}' is not open for reading", self.base.raw_engine_url()))),
        }
    }

    fn write_record(&mut self, record: Container) -> Result<()> {
        match &mut self.state {
            State::Writing(writer) => writer.write(&record),
            _ => Err(Error::invalid_access_mode()
                .with_message(format!("'{}' is not open for writing", self.base.raw_engine_url()))),
        }
    }

    fn position(&self) -> Option<Position> {
        match &self.state {
            State::Reading(reader) => reader.position(),
            _ => None,
        }
    }

    fn has_pattern(&self) -> bool {
        has_pattern(self.base.raw_engine_url())
    }

    fn expand_pattern(&self) -> Result<Vec<String>> {
        expand_filesystem_pattern(self.base.raw_engine_url())
    }

    fn exists(&self) -> Result<bool> {
        Ok(self.path.try_exists()?)
    }
}

impl<D: Dialect> ConnectorType for DelimitedConnector<D> {
    const ENGINE_TYPES: &'static [&'static str] = D::ENGINE_TYPES;
    const NAME: &'static str = D::NAME;

    fn create(engine_url: &str, access: AccessMode) -> Result<Self> {
        Self::new(engine_url, access)
    }
}

impl<D: Dialect> Drop for DelimitedConnector<D> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(
                target: TRACING_TARGET_CONNECTOR,
                engine_url = self.base.raw_engine_url(),
                error = %err,
                "failed to close connector on drop"
            );
        }
    }
}

impl<D: Dialect> fmt::Debug for DelimitedConnector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelimitedConnector")
            .field("dialect", &D::NAME)
            .field("engine_url", &self.base.raw_engine_url())
            .field("access", &self.base.access())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Maps a CSV failure to `Io` or `Serialization`, keeping the cause.
fn csv_error(err: csv::Error) -> Error {
    let error = if err.is_io_error() {
        Error::io()
    } else {
        Error::serialization()
    };
    error.with_message("delimited text failure").with_source(err)
}
