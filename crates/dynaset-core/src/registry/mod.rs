//! Domain-partitioned descriptor registry with an optional external resolver.

mod config;
mod global;
mod resolver;

#[cfg(test)]
mod tests;

use crate::{
    cache::{Cache, CacheError},
    error::{Error, ErrorClass},
    model::{DatasetDescriptor, Descriptor, Dictionary, DictionaryLookup, Extension},
    obs::{MetricsSink, RegistryEvent, RegistryMetrics, RegistryReport, ResolveKind},
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Weak},
};
use thiserror::Error as ThisError;
use tracing::{debug, warn};

// re-exports
pub use config::{DEFAULT_CAPACITY, RegistryConfig};
pub use global::global;
pub use resolver::TypeResolver;

use resolver::ProtectedResolver;

/// Domain id of the shared, read-only dictionaries.
pub const GLOBAL_DOMAIN: i64 = 0;

///
/// RegistryError
///

#[derive(Clone, Debug, ThisError)]
pub enum RegistryError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("resolver: {0}")]
    Resolver(Error),

    #[error("registry config: {message}")]
    Config { message: String },
}

impl RegistryError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Cache(err) => err.class(),
            Self::Resolver(err) => err.class,
            Self::Config { .. } => ErrorClass::Structural,
        }
    }
}

/// Cache keys of a descriptor: lower-cased name and path, without
/// empties or duplicates.
#[must_use]
pub fn index_keys(descriptor: &Descriptor) -> Vec<String> {
    let mut keys = Vec::with_capacity(2);
    for key in [descriptor.name(), descriptor.path()] {
        let key = key.to_lowercase();
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }

    keys
}

type Domain = Cache<Descriptor>;

///
/// Domains
///
/// One cache per domain id. The global domain always exists; other
/// domains appear on first successful register and go away once empty.
///

struct Domains {
    config: RegistryConfig,
    map: Mutex<HashMap<i64, Arc<Domain>>>,
}

impl Domains {
    fn new(config: RegistryConfig) -> Self {
        let mut map = HashMap::new();
        map.insert(GLOBAL_DOMAIN, Arc::new(Self::cache(&config, GLOBAL_DOMAIN)));

        Self {
            config,
            map: Mutex::new(map),
        }
    }

    fn cache(config: &RegistryConfig, domain_id: i64) -> Domain {
        Cache::new(config.capacity_for(domain_id), index_keys)
    }

    fn get(&self, domain_id: i64) -> Option<Arc<Domain>> {
        self.map.lock().get(&domain_id).cloned()
    }
}

///
/// Registry
///
/// Cheap to clone; clones share the same domains, counters, and
/// resolver.
///

#[derive(Clone)]
pub struct Registry {
    domains: Arc<Domains>,
    resolver: Option<Arc<ProtectedResolver>>,
    metrics: Arc<RegistryMetrics>,
    sink: Option<Arc<dyn MetricsSink>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            domains: Arc::new(Domains::new(config)),
            resolver: None,
            metrics: Arc::new(RegistryMetrics::default()),
            sink: None,
        }
    }

    /// Registry over the same domains that falls back to `resolver` on a
    /// miss. Installing the resolver already in place returns an
    /// equivalent registry.
    #[must_use]
    pub fn with_resolver(&self, resolver: Arc<dyn TypeResolver>) -> Self {
        if self
            .resolver
            .as_ref()
            .is_some_and(|current| current.wraps(&resolver))
        {
            return self.clone();
        }

        Self {
            resolver: Some(Arc::new(ProtectedResolver::new(resolver))),
            ..self.clone()
        }
    }

    /// Forward every registry event to `sink` as well.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.domains.config
    }

    #[must_use]
    pub const fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    #[must_use]
    pub fn metrics(&self) -> RegistryReport {
        self.metrics.report()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// Handle that resolves through this registry without keeping it
    /// alive; suitable for datasets the registry itself caches.
    #[must_use]
    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry {
            domains: Arc::downgrade(&self.domains),
            resolver: self.resolver.as_ref().map(Arc::downgrade),
            metrics: Arc::clone(&self.metrics),
            sink: self.sink.clone(),
        }
    }

    /// `downgrade` as a shared lookup.
    #[must_use]
    pub fn as_lookup(&self) -> Arc<dyn DictionaryLookup> {
        Arc::new(self.downgrade())
    }

    fn emit(&self, event: RegistryEvent) {
        self.metrics.record(event);
        if let Some(sink) = &self.sink {
            sink.record(event);
        }
    }

    /// Query exactly one domain by lower-cased name or path.
    #[must_use]
    pub fn lookup(&self, domain_id: i64, key: &str) -> Option<Descriptor> {
        let key = key.to_lowercase();

        self.domains.get(domain_id)?.get(key.as_str())
    }

    /// Number of domains currently holding a cache, the global one included.
    #[must_use]
    pub fn domain_count(&self) -> usize {
        self.domains.map.lock().len()
    }

    /// Cache a descriptor in its own domain.
    pub fn register(&self, descriptor: impl Into<Descriptor>) -> Result<(), RegistryError> {
        let descriptor = descriptor.into();
        let domain_id = descriptor.domain_id();

        let mut map = self.domains.map.lock();
        let (domain, created) = match map.get(&domain_id) {
            Some(domain) => (Arc::clone(domain), false),
            None => (
                Arc::new(Domains::cache(&self.domains.config, domain_id)),
                true,
            ),
        };

        if let Err(err) = domain.add(descriptor) {
            drop(map);
            if matches!(err, CacheError::KeysReserved { .. }) {
                self.emit(RegistryEvent::Conflict { domain_id });
            }
            return Err(err.into());
        }
        if created {
            map.insert(domain_id, domain);
        }
        drop(map);

        self.emit(RegistryEvent::Registered { domain_id });

        Ok(())
    }

    /// Drop a domain-scoped descriptor. Global descriptors stay put.
    pub fn unregister(&self, descriptor: &Descriptor) -> bool {
        let domain_id = descriptor.domain_id();
        if domain_id < 1 {
            return false;
        }

        let mut map = self.domains.map.lock();
        let Some(domain) = map.get(&domain_id).cloned() else {
            return false;
        };

        let removed = domain.delete(descriptor);
        if removed && domain.is_empty() {
            map.remove(&domain_id);
        }
        drop(map);

        if removed {
            self.emit(RegistryEvent::Unregistered { domain_id });
        }

        removed
    }

    /// Drop whatever `key` reaches in `domain_id`.
    pub fn invalidate(&self, domain_id: i64, key: &str) -> bool {
        self.lookup(domain_id, key)
            .is_some_and(|descriptor| self.unregister(&descriptor))
    }

    /// Dictionary visible to `domain_id`: the domain's own, then the
    /// global one, then the resolver.
    pub fn get_dictionary(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Dictionary>>, RegistryError> {
        let domain_id = domain_id.max(GLOBAL_DOMAIN);
        let key = path.to_lowercase();
        if key.is_empty() {
            return Ok(None);
        }

        let mut domains = vec![domain_id];
        if domain_id != GLOBAL_DOMAIN {
            domains.push(GLOBAL_DOMAIN);
        }
        for dc in domains {
            if let Some(Descriptor::Dictionary(found)) = self.lookup(dc, &key) {
                self.emit(RegistryEvent::CacheHit { domain_id: dc });
                return Ok(Some(found));
            }
        }
        self.emit(RegistryEvent::CacheMiss { domain_id });

        let Some(resolver) = self.resolver.as_ref().filter(|_| domain_id > 0) else {
            return Ok(None);
        };

        let kind = ResolveKind::Dictionary;
        debug!(domain_id, path = %key, "delegating dictionary to resolver");
        self.emit(RegistryEvent::ResolverCall { kind, domain_id });

        let found = match resolver.resolve_dictionary(domain_id, &key) {
            Ok(Some(found)) => found,
            Ok(None) => return Ok(None),
            Err(err) => {
                self.emit(RegistryEvent::ResolverError { kind, domain_id });
                return Err(RegistryError::Resolver(err));
            }
        };

        let reported = found.domain_id();
        if reported != domain_id && reported != GLOBAL_DOMAIN {
            warn!(domain_id, reported, path = %key, "resolved dictionary discarded; domain mismatch");
            self.emit(RegistryEvent::Discarded { kind, domain_id });
            return Ok(None);
        }
        if reported > GLOBAL_DOMAIN
            && let Err(err) = self.register(Arc::clone(&found))
        {
            warn!(domain_id, path = %key, error = %err, "resolved dictionary not cached");
        }

        Ok(Some(found))
    }

    /// Extension of `domain_id`, from cache or the resolver.
    pub fn get_extension(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Extension>>, RegistryError> {
        if domain_id < 1 {
            return Ok(None);
        }
        let key = path.to_lowercase();
        if key.is_empty() {
            return Ok(None);
        }

        if let Some(Descriptor::Extension(found)) = self.lookup(domain_id, &key) {
            self.emit(RegistryEvent::CacheHit { domain_id });
            return Ok(Some(found));
        }
        self.emit(RegistryEvent::CacheMiss { domain_id });

        let Some(resolver) = &self.resolver else {
            return Ok(None);
        };

        let kind = ResolveKind::Extension;
        debug!(domain_id, path = %key, "delegating extension to resolver");
        self.emit(RegistryEvent::ResolverCall { kind, domain_id });

        let found = match resolver.resolve_extension(domain_id, &key) {
            Ok(Some(found)) => found,
            Ok(None) => return Ok(None),
            Err(err) => {
                self.emit(RegistryEvent::ResolverError { kind, domain_id });
                return Err(RegistryError::Resolver(err));
            }
        };

        let reported = found.domain_id();
        if reported != domain_id {
            warn!(domain_id, reported, path = %key, "resolved extension discarded; domain mismatch");
            self.emit(RegistryEvent::Discarded { kind, domain_id });
            return Ok(None);
        }
        if let Err(err) = self.register(Arc::clone(&found)) {
            warn!(domain_id, path = %key, error = %err, "resolved extension not cached");
        }

        Ok(Some(found))
    }

    /// Visit cached global dictionaries, oldest first, until `f` returns false.
    pub fn for_each_global_dictionary<F>(&self, mut f: F)
    where
        F: FnMut(&Arc<Dictionary>) -> bool,
    {
        let Some(global) = self.domains.get(GLOBAL_DOMAIN) else {
            return;
        };

        global.for_each(|descriptor| match descriptor {
            Descriptor::Dictionary(dictionary) => f(dictionary),
            Descriptor::Extension(_) => true,
        });
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", self.config())
            .field("domains", &self.domain_count())
            .field("resolver", &self.has_resolver())
            .finish_non_exhaustive()
    }
}

impl DictionaryLookup for Registry {
    fn lookup_dictionary(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Dictionary>>, Error> {
        self.get_dictionary(domain_id, path).map_err(Error::from)
    }
}

///
/// WeakRegistry
///
/// Non-owning registry handle; lookups through a dropped registry find
/// nothing.
///

#[derive(Clone)]
pub struct WeakRegistry {
    domains: Weak<Domains>,
    resolver: Option<Weak<ProtectedResolver>>,
    metrics: Arc<RegistryMetrics>,
    sink: Option<Arc<dyn MetricsSink>>,
}

impl WeakRegistry {
    #[must_use]
    pub fn upgrade(&self) -> Option<Registry> {
        let resolver = match &self.resolver {
            Some(resolver) => Some(resolver.upgrade()?),
            None => None,
        };

        Some(Registry {
            domains: self.domains.upgrade()?,
            resolver,
            metrics: Arc::clone(&self.metrics),
            sink: self.sink.clone(),
        })
    }
}

impl fmt::Debug for WeakRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRegistry")
            .field("alive", &(self.domains.strong_count() > 0))
            .finish_non_exhaustive()
    }
}

impl DictionaryLookup for WeakRegistry {
    fn lookup_dictionary(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Dictionary>>, Error> {
        match self.upgrade() {
            Some(registry) => registry.lookup_dictionary(domain_id, path),
            None => Ok(None),
        }
    }
}
