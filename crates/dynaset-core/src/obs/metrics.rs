use crate::obs::{MetricsSink, RegistryEvent};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

///
/// RegistryMetrics
///
/// In-memory counters for one registry. Counters saturate instead of
/// wrapping.
///

#[derive(Debug)]
pub struct RegistryMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    resolver_calls: AtomicU64,
    resolver_errors: AtomicU64,
    discarded: AtomicU64,
    registered: AtomicU64,
    unregistered: AtomicU64,
    conflicts: AtomicU64,
    since_ms: AtomicI64,
}

impl Default for RegistryMetrics {
    fn default() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            resolver_calls: AtomicU64::new(0),
            resolver_errors: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            registered: AtomicU64::new(0),
            unregistered: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
            since_ms: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }
}

fn bump(counter: &AtomicU64) {
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
        Some(n.saturating_add(1))
    });
}

impl RegistryMetrics {
    #[must_use]
    pub fn report(&self) -> RegistryReport {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);

        RegistryReport {
            hits: load(&self.hits),
            misses: load(&self.misses),
            resolver_calls: load(&self.resolver_calls),
            resolver_errors: load(&self.resolver_errors),
            discarded: load(&self.discarded),
            registered: load(&self.registered),
            unregistered: load(&self.unregistered),
            conflicts: load(&self.conflicts),
            since_ms: self.since_ms.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter and restart the window.
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.resolver_calls,
            &self.resolver_errors,
            &self.discarded,
            &self.registered,
            &self.unregistered,
            &self.conflicts,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.since_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }
}

impl MetricsSink for RegistryMetrics {
    fn record(&self, event: RegistryEvent) {
        let counter = match event {
            RegistryEvent::CacheHit { .. } => &self.hits,
            RegistryEvent::CacheMiss { .. } => &self.misses,
            RegistryEvent::ResolverCall { .. } => &self.resolver_calls,
            RegistryEvent::ResolverError { .. } => &self.resolver_errors,
            RegistryEvent::Discarded { .. } => &self.discarded,
            RegistryEvent::Registered { .. } => &self.registered,
            RegistryEvent::Unregistered { .. } => &self.unregistered,
            RegistryEvent::Conflict { .. } => &self.conflicts,
        };

        bump(counter);
    }
}

///
/// RegistryReport
///
/// Point-in-time copy of the counters, `since_ms` being the Unix time
/// in milliseconds when counting started.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RegistryReport {
    pub hits: u64,
    pub misses: u64,
    pub resolver_calls: u64,
    pub resolver_errors: u64,
    pub discarded: u64,
    pub registered: u64,
    pub unregistered: u64,
    pub conflicts: u64,
    pub since_ms: i64,
}

///
/// TESTS
///
