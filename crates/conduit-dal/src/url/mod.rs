//! Engine URL parsing and staged resolution.
//!
//! An engine URL names a data source and its format in one string:
//!
//! ```text
//! <scheme>://<path>[;<key>=<value>]*
//! ```
//!
//! The scheme (including `://`) selects the connector. Compound schemes such
//! as `gz+csv://` are a single token here. The path is opaque to this module
//! and interpreted by the connector.

mod options;
mod resolve;

use std::fmt;
use std::str::FromStr;

use conduit_core::{Container, Error, Result, Value};

pub use self::options::{EngineOptions, OptionKey, OptionValue};
pub use self::resolve::{Resolution, ResolutionStatus, ResolverContext};

/// Separator between the scheme and the path.
pub const SCHEME_SEPARATOR: &str = "://";

/// Separator between the path and each option segment.
pub const OPTION_SEPARATOR: char = ';';

/// A parsed engine URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineUrl {
    engine_type: String,
    path: String,
    options: EngineOptions,
}

impl EngineUrl {
    /// Parses an engine URL.
    ///
    /// Fails with [`ErrorKind::MalformedUrl`](conduit_core::ErrorKind::MalformedUrl)
    /// when the scheme separator is missing, the scheme is empty or holds
    /// characters outside `[A-Za-z0-9+.-]`, or an option segment lacks `=`;
    /// and with [`ErrorKind::InvalidOption`](conduit_core::ErrorKind::InvalidOption)
    /// for an unknown option key or a non-integer `start`/`end`.
    pub fn parse(raw: &str) -> Result<Self> {
        let engine_type = engine_type_of(raw).ok_or_else(|| {
            Error::malformed_url().with_message(format!("'{raw}' has no scheme separator"))
        })?;

        let scheme = &engine_type[..engine_type.len() - SCHEME_SEPARATOR.len()];
        validate_scheme(scheme).map_err(|err| {
            err.with_message(format!("'{raw}' has an invalid scheme '{scheme}'"))
        })?;

        let rest = &raw[engine_type.len()..];
        let mut segments = rest.split(OPTION_SEPARATOR);
        let path = segments.next().unwrap_or_default().to_owned();

        let mut options = EngineOptions::new();
        for segment in segments {
            options.insert_segment(segment)?;
        }

        Ok(Self {
            engine_type: engine_type.to_owned(),
            path,
            options,
        })
    }

    /// Scheme including the trailing `://`, e.g. `csv://`.
    pub fn engine_type(&self) -> &str {
        &self.engine_type
    }

    /// Scheme without the trailing `://`, e.g. `gz+csv`.
    pub fn scheme(&self) -> &str {
        &self.engine_type[..self.engine_type.len() - SCHEME_SEPARATOR.len()]
    }

    /// Resource locator, meaning defined by the connector.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Copies the path and options into a mapping-shaped container.
    ///
    /// The path is stored under `path`, options under their own names.
    pub fn to_container(&self) -> Container {
        std::iter::once(("path", Value::from(self.path.as_str())))
            .chain(self.options.container_entries())
            .collect()
    }
}

impl FromStr for EngineUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for EngineUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.engine_type, self.path, self.options)
    }
}

/// Characters that make an engine URL a pattern over several sources.
pub const PATTERN_CHARACTERS: [char; 2] = ['*', '?'];

/// Returns `true` when `raw` holds a wildcard, e.g. `csv:///data/*.csv`.
pub fn has_pattern(raw: &str) -> bool {
    raw.contains(PATTERN_CHARACTERS)
}

/// Returns the engine type (scheme plus `://`) of a raw URL without parsing
/// the rest, or `None` when there is no scheme separator.
pub fn engine_type_of(raw: &str) -> Option<&str> {
    raw.find(SCHEME_SEPARATOR)
        .map(|idx| &raw[..idx + SCHEME_SEPARATOR.len()])
}

/// Checks that `engine_type` is a scheme followed by `://`.
pub(crate) fn validate_engine_type(engine_type: &str) -> Result<()> {
    let scheme = engine_type.strip_suffix(SCHEME_SEPARATOR).ok_or_else(|| {
        Error::malformed_url().with_message(format!("'{engine_type}' does not end with '://'"))
    })?;
    validate_scheme(scheme)
}

fn validate_scheme(scheme: &str) -> Result<()> {
    let valid = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if valid {
        Ok(())
    } else {
        Err(Error::malformed_url().with_message(format!("invalid scheme '{scheme}'")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use conduit_core::ErrorKind;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_parse_plain_url() {
        let url = EngineUrl::parse("csv:///tmp/x.csv").unwrap();

        assert_eq!(url.engine_type(), "csv://");
        assert_eq!(url.scheme(), "csv");
        assert_eq!(url.path(), "/tmp/x.csv");
        assert!(url.options().is_empty());
    }

    #[test]
    fn test_parse_compound_scheme() {
        let url = EngineUrl::parse("gz+s3+csv://aye-aye-dev/ExampleS3/colours.csv.gz").unwrap();

        assert_eq!(url.engine_type(), "gz+s3+csv://");
        assert_eq!(url.path(), "aye-aye-dev/ExampleS3/colours.csv.gz");
    }

    #[test]
    fn test_options_round_trip() {
        let raw = "tsv:///data/monkeys.tsv;end=40;encoding=utf-8;start=2";
        let url = EngineUrl::parse(raw).unwrap();

        let reparsed = EngineUrl::parse(&url.to_string()).unwrap();
        let as_map = |u: &EngineUrl| -> HashMap<OptionKey, String> {
            u.options().iter().map(|(k, v)| (k, v.to_string())).collect()
        };

        assert_eq!(as_map(&reparsed), as_map(&url));
        assert_eq!(as_map(&url).len(), 3);
        assert_eq!(url.to_string(), raw);
    }

    #[rstest]
    #[case("/tmp/x.csv", ErrorKind::MalformedUrl)]
    #[case("://tmp/x.csv", ErrorKind::MalformedUrl)]
    #[case("c s v:///tmp/x.csv", ErrorKind::MalformedUrl)]
    #[case("csv:///tmp/x.csv;encoding", ErrorKind::MalformedUrl)]
    #[case("csv:///tmp/x.csv;", ErrorKind::MalformedUrl)]
    #[case("csv:///tmp/x.csv;delimiter=|", ErrorKind::InvalidOption)]
    #[case("csv:///tmp/x.csv;start=one", ErrorKind::InvalidOption)]
    fn test_parse_errors(#[case] raw: &str, #[case] expected: ErrorKind) {
        assert_eq!(EngineUrl::parse(raw).unwrap_err().kind(), expected);
    }

    #[test]
    fn test_engine_type_of() {
        assert_eq!(engine_type_of("ndjson://a/b://c"), Some("ndjson://"));
        assert_eq!(engine_type_of("{warehouse}"), None);
    }

    #[test]
    fn test_has_pattern() {
        assert!(has_pattern("csv:///data/*.csv"));
        assert!(has_pattern("csv:///data/part-?.csv"));
        assert!(!has_pattern("csv:///data/{table}.csv"));
    }

    #[test]
    fn test_validate_engine_type() {
        assert!(validate_engine_type("gz+csv://").is_ok());
        assert!(validate_engine_type("csv").is_err());
        assert!(validate_engine_type("://").is_err());
    }

    #[test]
    fn test_to_container() {
        let url = EngineUrl::parse("csv:///tmp/x.csv;encoding=utf-8").unwrap();
        let params = url.to_container();

        assert_eq!(params["path"].as_str(), Some("/tmp/x.csv"));
        assert_eq!(params["encoding"].as_str(), Some("utf-8"));
    }
}
