//! Connector registry and engine-type dispatch.
//!
//! The registry is an ordered list of [`ConnectorDescriptor`]s. Dispatch
//! scans it front to back and returns the first descriptor claiming the
//! engine type of the URL. A later descriptor claiming the same engine type
//! is never reached.

mod descriptor;

use std::borrow::Cow;
use std::sync::{LazyLock, RwLock};

use conduit_core::{Error, Result};

pub use self::descriptor::{BuildFn, ConnectorDescriptor, ConnectorType};
use crate::TRACING_TARGET_REGISTRY;
use crate::core::{AccessMode, BoxedConnector};
use crate::url::{Resolution, ResolverContext, engine_type_of};

static GLOBAL: LazyLock<RwLock<ConnectorRegistry>> =
    LazyLock::new(|| RwLock::new(ConnectorRegistry::new()));

/// Ordered collection of connector descriptors.
#[derive(Debug, Clone)]
pub struct ConnectorRegistry {
    descriptors: Vec<ConnectorDescriptor>,
}

impl ConnectorRegistry {
    /// Creates a registry with no connectors.
    pub fn empty() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    /// Creates a registry holding the built-in connectors.
    pub fn new() -> Self {
        Self {
            descriptors: builtin_descriptors(),
        }
    }

    /// Process-wide default registry, populated with the built-ins on
    /// first use.
    pub fn global() -> &'static RwLock<ConnectorRegistry> {
        &GLOBAL
    }

    /// Restores the built-in set, dropping every registered connector.
    pub fn reset(&mut self) {
        self.descriptors = builtin_descriptors();
        tracing::debug!(
            target: TRACING_TARGET_REGISTRY,
            connectors = self.descriptors.len(),
            "registry reset to built-ins"
        );
    }

    /// Appends a connector.
    ///
    /// Fails with `InvalidConnector` when the descriptor has an empty name,
    /// claims no engine type, or claims a malformed one. Claiming an engine
    /// type already claimed by an earlier descriptor is accepted; the
    /// earlier descriptor keeps winning.
    pub fn register(&mut self, descriptor: ConnectorDescriptor) -> Result<()> {
        descriptor.validate()?;

        let shadowed: Vec<&str> = descriptor
            .engine_types()
            .iter()
            .filter(|engine_type| self.descriptors.iter().any(|d| d.claims(engine_type)))
            .map(String::as_str)
            .collect();

        if !shadowed.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET_REGISTRY,
                connector = descriptor.name(),
                shadowed = ?shadowed,
                "engine types already claimed by an earlier connector"
            );
        }

        tracing::debug!(
            target: TRACING_TARGET_REGISTRY,
            connector = descriptor.name(),
            engine_types = ?descriptor.engine_types(),
            "registered connector"
        );
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Appends a connector by type.
    pub fn register_type<T: ConnectorType>(&mut self) -> Result<()> {
        self.register(ConnectorDescriptor::of::<T>())
    }

    /// Registered descriptors, in dispatch order.
    #[must_use]
    pub fn descriptors(&self) -> &[ConnectorDescriptor] {
        &self.descriptors
    }

    /// Finds the connector for an engine URL.
    ///
    /// Symbolic input is resolved against `ctx` first. A deferred or failed
    /// resolution is not an error here: the raw input is used as is.
    /// Fails with `UnknownEngine` when nothing claims the engine type.
    pub fn resolve_connector(
        &self,
        engine_url: &str,
        ctx: &ResolverContext,
    ) -> Result<&ConnectorDescriptor> {
        let literal = if needs_resolution(engine_url) {
            match ctx.resolve(engine_url) {
                Resolution::Resolved(url) => Cow::Owned(url),
                other => {
                    tracing::debug!(
                        target: TRACING_TARGET_REGISTRY,
                        engine_url,
                        status = %other.status(),
                        "dispatching on the unresolved engine url"
                    );
                    Cow::Borrowed(engine_url)
                }
            }
        } else {
            Cow::Borrowed(engine_url)
        };

        self.dispatch(&literal)
    }

    /// Resolves, dispatches and instantiates an unconnected connector.
    ///
    /// Unlike [`resolve_connector`](Self::resolve_connector), the engine URL
    /// must resolve completely: a deferred resolution fails with
    /// `Unresolved` and a failed one with `MalformedUrl`.
    pub fn open(
        &self,
        engine_url: &str,
        access: AccessMode,
        ctx: &ResolverContext,
    ) -> Result<BoxedConnector> {
        let concrete = if needs_resolution(engine_url) {
            Cow::Owned(ctx.resolve(engine_url).into_result()?)
        } else {
            Cow::Borrowed(engine_url)
        };

        let descriptor = self.dispatch(&concrete)?;
        let connector = descriptor.create(&concrete, access)?;

        tracing::debug!(
            target: TRACING_TARGET_REGISTRY,
            connector = descriptor.name(),
            engine_url = %concrete,
            access = %access,
            "created connector"
        );
        Ok(connector)
    }

    fn dispatch(&self, engine_url: &str) -> Result<&ConnectorDescriptor> {
        let engine_type = engine_type_of(engine_url).ok_or_else(|| {
            Error::unknown_engine()
                .with_message(format!("'{engine_url}' does not name an engine type"))
        })?;

        let descriptor = self
            .descriptors
            .iter()
            .find(|descriptor| descriptor.claims(engine_type))
            .ok_or_else(|| {
                Error::unknown_engine()
                    .with_message(format!("no connector claims engine type '{engine_type}'"))
            })?;

        tracing::trace!(
            target: TRACING_TARGET_REGISTRY,
            engine_type,
            connector = descriptor.name(),
            "dispatched engine url"
        );
        Ok(descriptor)
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds the connector for an engine URL in `registry`.
///
/// Shorthand for [`ConnectorRegistry::resolve_connector`].
pub fn connector_factory<'r>(
    registry: &'r ConnectorRegistry,
    engine_url: &str,
    ctx: &ResolverContext,
) -> Result<&'r ConnectorDescriptor> {
    registry.resolve_connector(engine_url, ctx)
}

fn needs_resolution(engine_url: &str) -> bool {
    engine_type_of(engine_url).is_none() || engine_url.contains(['{', '}'])
}

#[cfg(feature = "csv")]
fn builtin_descriptors() -> Vec<ConnectorDescriptor> {
    use crate::provider::{CsvConnector, TsvConnector};

    vec![
        ConnectorDescriptor::of::<CsvConnector>(),
        ConnectorDescriptor::of::<TsvConnector>(),
    ]
}

#[cfg(not(feature = "csv"))]
fn builtin_descriptors() -> Vec<ConnectorDescriptor> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use conduit_core::ErrorKind;

    use super::*;
    use crate::core::Connector;
    use crate::core::testing::MemoryConnector;

    fn first(engine_url: &str, access: AccessMode) -> Result<BoxedConnector> {
        Ok(Box::new(MemoryConnector::new(engine_url, access)))
    }

    fn second(engine_url: &str, access: AccessMode) -> Result<BoxedConnector> {
        Ok(Box::new(MemoryConnector::new(engine_url, access)))
    }

    fn registry() -> ConnectorRegistry {
        let mut registry = ConnectorRegistry::empty();
        registry
            .register(ConnectorDescriptor::new("first", ["x://"], first))
            .unwrap();
        registry
            .register(ConnectorDescriptor::new("second", ["x://", "gz+x://"], second))
            .unwrap();
        registry
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = registry();
        let ctx = ResolverContext::new();

        for _ in 0..3 {
            let descriptor = registry.resolve_connector("x:///data/a", &ctx).unwrap();
            assert_eq!(descriptor.name(), "first");
        }
    }

    #[test]
    fn test_multi_engine_descriptor() {
        let registry = registry();
        let descriptor = registry
            .resolve_connector("gz+x:///data/a.gz", &ResolverContext::new())
            .unwrap();
        assert_eq!(descriptor.name(), "second");
    }

    #[test]
    fn test_unknown_engine() {
        let registry = registry();
        let ctx = ResolverContext::new();

        let err = registry.resolve_connector("y:///data/a", &ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownEngine);

        let err = registry.open("y:///data/a", AccessMode::Read, &ctx).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnknownEngine);
    }

    #[test]
    fn test_register_rejects_bad_shapes() {
        let mut registry = registry();
        let err = registry
            .register(ConnectorDescriptor::new("broken", ["x"], first))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidConnector);
        assert_eq!(registry.descriptors().len(), 2);
    }

    #[test]
    fn test_symbolic_url_is_resolved_before_dispatch() {
        let registry = registry();
        let ctx = ResolverContext::new().with_variable("source", "gz+x:///data/a.gz");

        let descriptor = registry.resolve_connector("{source}", &ctx).unwrap();
        assert_eq!(descriptor.name(), "second");
    }

    #[test]
    fn test_placeholder_in_scheme_is_resolved() {
        let registry = registry();
        let ctx = ResolverContext::new().with_variable("fmt", "gz+x");

        assert!(needs_resolution("{fmt}:///data/a.gz"));
        assert!(!needs_resolution("x:///data/a"));

        let descriptor = registry.resolve_connector("{fmt}:///data/a.gz", &ctx).unwrap();
        assert_eq!(descriptor.name(), "second");

        let connector = registry
            .open("{fmt}:///data/a.gz", AccessMode::Read, &ctx)
            .unwrap();
        assert_eq!(connector.raw_engine_url(), "gz+x:///data/a.gz");

        let err = registry
            .resolve_connector("{fmt}:///data/a.gz", &ResolverContext::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownEngine);
    }

    #[test]
    fn test_deferred_resolution_falls_back_to_literal() {
        let registry = registry();
        let ctx = ResolverContext::new();

        let descriptor = registry.resolve_connector("x://{bucket}/a", &ctx).unwrap();
        assert_eq!(descriptor.name(), "first");

        let err = registry.resolve_connector("{source}", &ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownEngine);
    }

    #[test]
    fn test_open_requires_full_resolution() {
        let registry = registry();
        let ctx = ResolverContext::new();

        let err = registry
            .open("x://{bucket}/a", AccessMode::Read, &ctx)
            .err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Unresolved);

        let err = registry.open("x://{bucket/a", AccessMode::Read, &ctx).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::MalformedUrl);

        let ctx = ctx.with_variable("bucket", "aye-aye-dev");
        let connector = registry.open("x://{bucket}/a", AccessMode::Read, &ctx).unwrap();
        assert_eq!(connector.raw_engine_url(), "x://aye-aye-dev/a");
    }

    #[test]
    fn test_connector_factory() {
        let registry = registry();
        let descriptor =
            connector_factory(&registry, "x:///data/a", &ResolverContext::new()).unwrap();
        assert_eq!(descriptor.name(), "first");
    }

    #[test]
    fn test_empty_and_reset() {
        let mut registry = registry();
        registry.reset();
        assert_eq!(
            registry.descriptors().len(),
            ConnectorRegistry::new().descriptors().len()
        );
        assert!(ConnectorRegistry::empty().descriptors().is_empty());
    }

    #[cfg(feature = "csv")]
    #[test]
    fn test_builtins_claim_csv_and_tsv() {
        let registry = ConnectorRegistry::new();
        let ctx = ResolverContext::new();

        let csv = registry.resolve_connector("csv:///tmp/x.csv", &ctx).unwrap();
        let tsv = registry.resolve_connector("tsv:///tmp/x.tsv", &ctx).unwrap();
        assert_eq!(csv.name(), "csv");
        assert_eq!(tsv.name(), "tsv");
    }

    #[cfg(feature = "csv")]
    #[test]
    fn test_global_registry_has_builtins() {
        let registry = ConnectorRegistry::global().read().unwrap();
        let descriptor = registry
            .resolve_connector("csv:///tmp/x.csv", &ResolverContext::new())
            .unwrap();
        assert_eq!(descriptor.name(), "csv");
    }
}
