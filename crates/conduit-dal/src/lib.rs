#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for connector registration and dispatch.
pub const TRACING_TARGET_REGISTRY: &str = "conduit_dal::registry";

/// Tracing target for connector lifecycle events.
pub const TRACING_TARGET_CONNECTOR: &str = "conduit_dal::connector";

/// Tracing target for staged engine URL resolution.
pub const TRACING_TARGET_RESOLVE: &str = "conduit_dal::resolve";

pub mod core;
pub mod provider;
pub mod registry;
pub mod url;

#[doc(hidden)]
pub mod prelude;

pub use conduit_core::{Container, Error, ErrorKind, Result, Value};

pub use crate::core::{AccessMode, BoxedConnector, Connector, ConnectorExt, Records};
pub use crate::registry::{
    ConnectorDescriptor, ConnectorRegistry, ConnectorType, connector_factory,
};
pub use crate::url::{EngineUrl, Resolution, ResolutionStatus, ResolverContext};
