//! Observability: registry counters and the sink boundary they flow through.

mod metrics;
mod sink;

// re-exports
pub use metrics::{RegistryMetrics, RegistryReport};
pub use sink::{MetricsSink, RegistryEvent, ResolveKind};
