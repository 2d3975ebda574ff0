//! Convenient re-exports for common use.

pub use crate::container::{Container, ShapeKind, Value};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
