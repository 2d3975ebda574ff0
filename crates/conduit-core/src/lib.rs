#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for container operations.
pub const TRACING_TARGET: &str = "conduit_core::container";

mod container;
mod error;

#[doc(hidden)]
pub mod prelude;

pub use container::{Container, ShapeKind, Value};
pub use error::{BoxedError, Error, ErrorKind, Result};
