//! Built-in connector implementations.

#[cfg(feature = "csv")]
#[cfg_attr(docsrs, doc(cfg(feature = "csv")))]
pub mod delimited;
pub mod filesystem;

#[cfg(feature = "csv")]
pub use self::delimited::{CsvConnector, DelimitedConnector, TsvConnector};
pub use self::filesystem::expand_filesystem_pattern;
