//! Metrics sink boundary.
//!
//! Registry logic never touches counters directly; every observation is
//! a `RegistryEvent` handed to a `MetricsSink`.

use std::fmt;

///
/// ResolveKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolveKind {
    Dictionary,
    Extension,
}

impl fmt::Display for ResolveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Dictionary => "dictionary",
            Self::Extension => "extension",
        };

        write!(f, "{label}")
    }
}

///
/// RegistryEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RegistryEvent {
    CacheHit {
        domain_id: i64,
    },
    CacheMiss {
        domain_id: i64,
    },
    ResolverCall {
        kind: ResolveKind,
        domain_id: i64,
    },
    ResolverError {
        kind: ResolveKind,
        domain_id: i64,
    },
    /// A resolved descriptor reported a domain other than the one requested.
    Discarded {
        kind: ResolveKind,
        domain_id: i64,
    },
    Registered {
        domain_id: i64,
    },
    Unregistered {
        domain_id: i64,
    },
    Conflict {
        domain_id: i64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: RegistryEvent);
}
