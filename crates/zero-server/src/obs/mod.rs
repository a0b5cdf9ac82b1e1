//! Request instrumentation: response observation, metrics, and access logs.
//!
//! Metrics are kept in-process as atomics and exposed through an explicit
//! [`registry::Registry`] rendered by the `/metrics` handler.

pub mod access_log;
pub mod body;
pub mod metrics;
pub mod middleware;
pub mod outcome;
pub mod registry;

pub use access_log::AccessLog;
pub use metrics::HttpMetrics;
pub use middleware::{track_requests, Instrumentation};
pub use outcome::{CallStats, RequestOutcome};
pub use registry::{Collector, Registry};

/// Receives every completed request exactly once.
pub trait RequestObserver: Send + Sync {
    fn observe(&self, outcome: &RequestOutcome);
}
