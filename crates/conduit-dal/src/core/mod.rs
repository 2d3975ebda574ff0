//! The connector contract and its building blocks.

mod access;
mod base;
mod connector;
mod records;

#[cfg(test)]
pub(crate) mod testing;

pub use self::access::AccessMode;
pub use self::base::ConnectorBase;
pub use self::connector::{Connector, Position};
pub use self::records::{ConnectorExt, Records};

/// Connector handed out by the registry.
pub type BoxedConnector = Box<dyn Connector>;
