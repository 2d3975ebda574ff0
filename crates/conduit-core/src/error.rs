//! Common error type definitions.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Used as the source error in [`Error`], so that any failure from a native
/// library (filesystem, CSV reader, JSON parser) can be carried through
/// without losing the original cause.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of errors that can occur in conduit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Engine URL text cannot be split into scheme, path and options.
    MalformedUrl,
    /// Engine URL option key is unknown or its value has the wrong type.
    InvalidOption,
    /// Engine URL still contains placeholders the context cannot fill.
    Unresolved,
    /// No registered connector claims the engine type.
    UnknownEngine,
    /// Connector descriptor does not have the required shape.
    InvalidConnector,
    /// Operation is not allowed in the connector's access mode.
    InvalidAccessMode,
    /// Value handed to a connector is neither a mapping nor a container.
    UnsupportedType,
    /// Container operation was called on the wrong shape.
    WrongShape,
    /// Merge would replace a container with a scalar or the reverse.
    IncompatibleMerge,
    /// Capability is recognised but not implemented yet.
    NotSupported,
    /// Key or field is missing.
    NotFound,
    /// Underlying I/O failed.
    Io,
    /// Serialization/deserialization error.
    Serialization,
    /// Configuration could not be loaded.
    Configuration,
}

/// A structured error type for conduit operations.
#[derive(Debug, Error)]
#[error("{kind:?}{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new malformed URL error.
    pub fn malformed_url() -> Self {
        Self::new(ErrorKind::MalformedUrl)
    }

    /// Creates a new invalid option error.
    pub fn invalid_option() -> Self {
        Self::new(ErrorKind::InvalidOption)
    }

    /// Creates a new unresolved URL error.
    pub fn unresolved() -> Self {
        Self::new(ErrorKind::Unresolved)
    }

    /// Creates a new unknown engine error.
    pub fn unknown_engine() -> Self {
        Self::new(ErrorKind::UnknownEngine)
    }

    /// Creates a new invalid connector error.
    pub fn invalid_connector() -> Self {
        Self::new(ErrorKind::InvalidConnector)
    }

    /// Creates a new invalid access mode error.
    pub fn invalid_access_mode() -> Self {
        Self::new(ErrorKind::InvalidAccessMode)
    }

    /// Creates a new unsupported type error.
    pub fn unsupported_type() -> Self {
        Self::new(ErrorKind::UnsupportedType)
    }

    /// Creates a new wrong shape error.
    pub fn wrong_shape() -> Self {
        Self::new(ErrorKind::WrongShape)
    }

    /// Creates a new incompatible merge error.
    pub fn incompatible_merge() -> Self {
        Self::new(ErrorKind::IncompatibleMerge)
    }

    /// Creates a new not supported error.
    pub fn not_supported() -> Self {
        Self::new(ErrorKind::NotSupported)
    }

    /// Creates a new not found error.
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    /// Creates a new I/O error.
    pub fn io() -> Self {
        Self::new(ErrorKind::Io)
    }

    /// Creates a new serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::io().with_message(err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization()
            .with_message(err.to_string())
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_display_with_message() {
        let error = Error::unknown_engine().with_message("no connector for 'xls://'");
        assert_eq!(error.to_string(), "UnknownEngine: no connector for 'xls://'");
    }

    #[test]
    fn test_display_without_message() {
        assert_eq!(Error::wrong_shape().to_string(), "WrongShape");
    }

    #[rstest]
    #[case(Error::malformed_url(), "malformed_url")]
    #[case(Error::invalid_access_mode(), "invalid_access_mode")]
    #[case(Error::incompatible_merge(), "incompatible_merge")]
    #[case(Error::not_supported(), "not_supported")]
    fn test_kind_str(#[case] error: Error, #[case] expected: &str) {
        assert_eq!(error.kind_str(), expected);
        assert_eq!(error.kind().as_ref(), expected);
    }

    #[test]
    fn test_io_conversion_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let error = Error::from(io);

        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(error.source().is_some());
    }

    #[test]
    fn test_json_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(err).kind(), ErrorKind::Serialization);
    }
}
