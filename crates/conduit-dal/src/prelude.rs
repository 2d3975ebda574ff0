//! Convenient re-exports for common use.

pub use conduit_core::prelude::*;

pub use crate::core::{AccessMode, BoxedConnector, Connector, ConnectorExt, Position, Records};
#[cfg(feature = "csv")]
pub use crate::provider::{CsvConnector, TsvConnector};
pub use crate::registry::{ConnectorDescriptor, ConnectorRegistry, ConnectorType};
pub use crate::url::{EngineOptions, EngineUrl, Resolution, ResolverContext};
