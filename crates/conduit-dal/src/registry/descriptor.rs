//! Connector descriptors: type-level handles the registry dispatches to.

use std::fmt;

use conduit_core::{Error, Result};

use crate::core::{AccessMode, BoxedConnector, Connector};
use crate::url::validate_engine_type;

/// Constructor stored in a [`ConnectorDescriptor`].
pub type BuildFn = fn(&str, AccessMode) -> Result<BoxedConnector>;

/// A connector implementation that can be registered by type.
///
/// ```ignore
/// impl ConnectorType for ParquetConnector {
///     const NAME: &'static str = "parquet";
///     const ENGINE_TYPES: &'static [&'static str] = &["parquet://", "s3+parquet://"];
///
///     fn create(engine_url: &str, access: AccessMode) -> Result<Self> { ... }
/// }
/// ```
pub trait ConnectorType: Connector + Sized + 'static {
    /// Name used in logs and error messages.
    const NAME: &'static str;

    /// Engine types claimed by this connector, each ending in `://`.
    const ENGINE_TYPES: &'static [&'static str];

    /// Creates an unconnected instance.
    fn create(engine_url: &str, access: AccessMode) -> Result<Self>;
}

fn build<T: ConnectorType>(engine_url: &str, access: AccessMode) -> Result<BoxedConnector> {
    Ok(Box::new(T::create(engine_url, access)?))
}

/// Registry entry for one connector implementation.
#[derive(Clone)]
pub struct ConnectorDescriptor {
    name: String,
    engine_types: Vec<String>,
    build: BuildFn,
}

impl ConnectorDescriptor {
    /// Describes a connector type.
    pub fn of<T: ConnectorType>() -> Self {
        Self {
            name: T::NAME.to_owned(),
            engine_types: T::ENGINE_TYPES.iter().map(|&s| s.to_owned()).collect(),
            build: build::<T>,
        }
    }

    /// Describes a connector from its parts.
    ///
    /// The shape is checked at registration, not here.
    pub fn new<I, S>(name: impl Into<String>, engine_types: I, build: BuildFn) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            engine_types: engine_types.into_iter().map(Into::into).collect(),
            build,
        }
    }

    /// Connector name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Claimed engine types, in declaration order.
    #[must_use]
    pub fn engine_types(&self) -> &[String] {
        &self.engine_types
    }

    /// Returns `true` if this connector claims `engine_type`.
    #[must_use]
    pub fn claims(&self, engine_type: &str) -> bool {
        self.engine_types.iter().any(|claimed| claimed == engine_type)
    }

    /// Instantiates the connector, unconnected.
    pub fn create(&self, engine_url: &str, access: AccessMode) -> Result<BoxedConnector> {
        (self.build)(engine_url, access)
    }

    /// Checks the descriptor shape.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_connector().with_message("connector name is empty"));
        }

        if self.engine_types.is_empty() {
            return Err(Error::invalid_connector()
                .with_message(format!("connector '{}' claims no engine type", self.name)));
        }

        for engine_type in &self.engine_types {
            validate_engine_type(engine_type).map_err(|err| {
                Error::invalid_connector()
                    .with_message(format!(
                        "connector '{}' claims an invalid engine type '{engine_type}'",
                        self.name
                    ))
                    .with_source(err)
            })?;
        }

        Ok(())
    }
}

impl fmt::Debug for ConnectorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorDescriptor")
            .field("name", &self.name)
            .field("engine_types", &self.engine_types)
            .finish_non_exhaustive()
    }
}
