//! Staged resolution of symbolic engine URLs.
//!
//! A symbolic URL carries `{name}` placeholders that are filled from a
//! [`ResolverContext`]. Missing context is not an error: resolution reports
//! [`Resolution::Deferred`] and the caller decides when to try again.

#[cfg(feature = "dotenv")]
use std::path::Path;

use conduit_core::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};

use crate::TRACING_TARGET_RESOLVE;

/// Default number of substitution passes before resolution gives up.
pub const DEFAULT_MAX_DEPTH: usize = 8;

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Variables available to staged resolution.
///
/// Variable values may themselves contain placeholders; they are expanded
/// repeatedly, up to `max_depth` passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverContext {
    /// Placeholder name to replacement text.
    #[serde(default)]
    pub variables: IndexMap<String, String>,
    /// Maximum number of substitution passes.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ResolverContext {
    fn default() -> Self {
        Self {
            variables: IndexMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolverContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a context from a JSON document.
    ///
    /// ```
    /// use conduit_dal::url::ResolverContext;
    ///
    /// let ctx = ResolverContext::from_json_str(r#"{"variables": {"bucket": "aye-aye-dev"}}"#)?;
    /// assert_eq!(ctx.variable("bucket"), Some("aye-aye-dev"));
    /// assert_eq!(ctx.max_depth, 8);
    /// # Ok::<(), conduit_core::Error>(())
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| {
            Error::configuration()
                .with_message("invalid resolver context document")
                .with_source(err)
        })
    }

    /// Collects every environment variable named `<prefix><NAME>` as
    /// variable `name` (lowercased).
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn from_env(prefix: &str) -> Self {
        let mut ctx = Self::new();
        for (key, value) in std::env::vars_os() {
            let (Ok(key), Ok(value)) = (key.into_string(), value.into_string()) else {
                tracing::trace!(
                    target: TRACING_TARGET_RESOLVE,
                    "skipped environment variable that is not valid unicode"
                );
                continue;
            };

            if let Some(name) = key.strip_prefix(prefix)
                && !name.is_empty()
            {
                ctx.set_variable(name.to_lowercase(), value);
            }
        }

        tracing::debug!(
            target: TRACING_TARGET_RESOLVE,
            prefix,
            variables = ctx.variables.len(),
            "loaded resolver context from environment"
        );
        ctx
    }

    /// Reads variables from a `.env` file without touching the process
    /// environment. Names are lowercased.
    #[cfg(feature = "dotenv")]
    #[cfg_attr(docsrs, doc(cfg(feature = "dotenv")))]
    pub fn from_dotenv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let entries = dotenvy::from_path_iter(path).map_err(|err| {
            Error::configuration()
                .with_message(format!("cannot open dotenv file '{}'", path.display()))
                .with_source(err)
        })?;

        let mut ctx = Self::new();
        for entry in entries {
            let (key, value) = entry.map_err(|err| {
                Error::configuration()
                    .with_message(format!("cannot parse dotenv file '{}'", path.display()))
                    .with_source(err)
            })?;
            ctx.set_variable(key.to_lowercase(), value);
        }

        tracing::debug!(
            target: TRACING_TARGET_RESOLVE,
            path = %path.display(),
            variables = ctx.variables.len(),
            "loaded resolver context from dotenv file"
        );
        Ok(ctx)
    }

    /// Adds a variable, builder style.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_variable(name, value);
        self
    }

    /// Sets a variable, returning the previous value.
    pub fn set_variable(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.variables.insert(name.into(), value.into())
    }

    /// Looks up a variable.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Sets the maximum number of substitution passes.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolves a symbolic engine URL against this context.
    pub fn resolve(&self, raw: &str) -> Resolution {
        let mut current = raw.to_owned();
        let mut depth = 0;

        let resolution = loop {
            let names = match placeholders(&current) {
                Ok(names) => names,
                Err(reason) => break Resolution::Failed(reason),
            };

            if names.is_empty() {
                break Resolution::Resolved(current);
            }

            if !names.iter().any(|name| self.variables.contains_key(*name)) {
                let missing = dedup(names);
                break Resolution::Deferred {
                    partial: current,
                    missing,
                };
            }

            if depth == self.max_depth {
                break Resolution::Failed(format!(
                    "placeholder expansion of '{raw}' is deeper than {} passes",
                    self.max_depth
                ));
            }

            current = self.substitute(&current);
            depth += 1;
        };

        tracing::trace!(
            target: TRACING_TARGET_RESOLVE,
            raw,
            status = %resolution.status(),
            passes = depth,
            "resolved engine url"
        );
        resolution
    }

    /// Replaces every known placeholder once, leaving unknown ones intact.
    fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            // Balance was checked by `placeholders`.
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };

            let name = &after[..close];
            match self.variables.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
            rest = &after[close + 1..];
        }

        out.push_str(rest);
        out
    }
}

/// Outcome of staged resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every placeholder was filled.
    Resolved(String),
    /// Some placeholders have no value in the context yet.
    Deferred {
        /// The input with every known placeholder substituted.
        partial: String,
        /// Names that could not be filled, in order of appearance.
        missing: Vec<String>,
    },
    /// The input is not a well-formed symbolic URL.
    Failed(String),
}

/// Status tag of a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    /// Fully resolved.
    Ok,
    /// Needs more context.
    Deferred,
    /// Malformed reference.
    Failed,
}

impl Resolution {
    /// Returns the status tag.
    pub fn status(&self) -> ResolutionStatus {
        match self {
            Self::Resolved(_) => ResolutionStatus::Ok,
            Self::Deferred { .. } => ResolutionStatus::Deferred,
            Self::Failed(_) => ResolutionStatus::Failed,
        }
    }

    /// Returns `true` when every placeholder was filled.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Returns the concrete URL, if resolution succeeded.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Resolved(url) => Some(url),
            _ => None,
        }
    }

    /// Splits into the status and the concrete URL, if any.
    pub fn into_parts(self) -> (ResolutionStatus, Option<String>) {
        let status = self.status();
        match self {
            Self::Resolved(url) => (status, Some(url)),
            _ => (status, None),
        }
    }

    /// Converts into the concrete URL, failing for deferred or failed
    /// resolutions.
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Resolved(url) => Ok(url),
            Self::Deferred { partial, missing } => Err(Error::unresolved().with_message(
                format!("'{partial}' needs values for {}", missing.join(", ")),
            )),
            Self::Failed(reason) => Err(Error::malformed_url().with_message(reason)),
        }
    }
}

/// Resolves a symbolic engine URL against `ctx`.
pub fn resolve(raw: &str, ctx: &ResolverContext) -> Resolution {
    ctx.resolve(raw)
}

/// Lists placeholder names in order of appearance.
fn placeholders(text: &str) -> std::result::Result<Vec<&str>, String> {
    let mut names = Vec::new();
    let mut open: Option<usize> = None;

    for (at, c) in text.char_indices() {
        match (c, open) {
            ('{', None) => open = Some(at),
            ('{', Some(_)) => return Err(format!("nested '{{' at offset {at} in '{text}'")),
            ('}', None) => return Err(format!("unbalanced '}}' at offset {at} in '{text}'")),
            ('}', Some(start)) => {
                let name = &text[start + 1..at];
                if name.is_empty() {
                    return Err(format!("empty placeholder at offset {start} in '{text}'"));
                }
                names.push(name);
                open = None;
            }
            _ => {}
        }
    }

    match open {
        Some(at) => Err(format!("unclosed '{{' at offset {at} in '{text}'")),
        None => Ok(names),
    }
}

fn dedup(names: Vec<&str>) -> Vec<String> {
    let mut missing: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !missing.iter().any(|m| m == name) {
            missing.push(name.to_owned());
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use conduit_core::ErrorKind;
    use rstest::rstest;

    use super::*;

    fn context() -> ResolverContext {
        ResolverContext::new()
            .with_variable("bucket", "aye-aye-dev")
            .with_variable("colours", "gz+s3+csv://{bucket}/ExampleS3/colours.csv.gz")
    }

    #[test]
    fn test_plain_url_resolves_to_itself() {
        let resolution = context().resolve("csv:///tmp/x.csv");
        assert_eq!(resolution, Resolution::Resolved("csv:///tmp/x.csv".into()));
        assert_eq!(resolution.status(), ResolutionStatus::Ok);
    }

    #[test]
    fn test_nested_placeholders_expand() {
        let resolution = context().resolve("{colours}");
        assert_eq!(
            resolution.url(),
            Some("gz+s3+csv://aye-aye-dev/ExampleS3/colours.csv.gz")
        );
    }

    #[test]
    fn test_missing_variable_defers() {
        let resolution = context().resolve("s3+csv://{bucket}/{region}/{table}/{region}");

        assert_eq!(resolution.status(), ResolutionStatus::Deferred);
        let Resolution::Deferred { partial, missing } = resolution else {
            panic!("expected a deferred resolution");
        };
        assert_eq!(partial, "s3+csv://aye-aye-dev/{region}/{table}/{region}");
        assert_eq!(missing, vec!["region".to_owned(), "table".to_owned()]);
    }

    #[rstest]
    #[case("csv://{bucket")]
    #[case("csv://bucket}")]
    #[case("csv://{}/x")]
    #[case("csv://{a{b}}")]
    fn test_malformed_placeholders_fail(#[case] raw: &str) {
        assert_eq!(context().resolve(raw).status(), ResolutionStatus::Failed);
    }

    #[test]
    fn test_self_reference_fails_at_max_depth() {
        let ctx = ResolverContext::new()
            .with_variable("loop", "x{loop}")
            .with_max_depth(3);

        assert_eq!(ctx.resolve("{loop}").status(), ResolutionStatus::Failed);
    }

    #[test]
    fn test_into_result_kinds() {
        let deferred = ResolverContext::new().resolve("{warehouse}");
        assert_eq!(deferred.into_result().unwrap_err().kind(), ErrorKind::Unresolved);

        let failed = ResolverContext::new().resolve("{");
        assert_eq!(failed.into_result().unwrap_err().kind(), ErrorKind::MalformedUrl);
    }

    #[test]
    fn test_into_parts() {
        let (status, url) = resolve("{warehouse}", &ResolverContext::new()).into_parts();
        assert_eq!(status, ResolutionStatus::Deferred);
        assert_eq!(url, None);
        assert_eq!(status.as_ref(), "DEFERRED");
    }

    #[test]
    fn test_from_json_str() {
        let ctx = ResolverContext::from_json_str(r#"{"variables": {"a": "b"}, "max_depth": 2}"#)
            .unwrap();
        assert_eq!(ctx.variable("a"), Some("b"));
        assert_eq!(ctx.max_depth, 2);

        let err = ResolverContext::from_json_str("[]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_from_env_strips_prefix_and_lowercases() {
        // Cargo exports package metadata to test processes.
        let ctx = ResolverContext::from_env("CARGO_PKG_");
        assert_eq!(ctx.variable("name"), Some("conduit-dal"));
    }

    #[cfg(feature = "dotenv")]
    #[test]
    fn test_from_dotenv() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "BUCKET=aye-aye-dev").unwrap();
        writeln!(file, "TABLE=\"colours\"").unwrap();

        let ctx = ResolverContext::from_dotenv(file.path()).unwrap();
        assert_eq!(ctx.variable("bucket"), Some("aye-aye-dev"));
        assert_eq!(ctx.variable("table"), Some("colours"));

        let err = ResolverContext::from_dotenv("/nonexistent/.env").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
