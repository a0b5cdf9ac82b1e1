//! Shared "accepting traffic" flag and the health payload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use zero_core::BuildInfo;

/// One-way health flag: starts healthy, flips to unhealthy once, never back.
///
/// Cloning shares the flag. Reads and the flip use `SeqCst`, so a flip is
/// visible to every later health check before the caller moves on.
#[derive(Debug, Clone)]
pub struct HealthState {
    healthy: Arc<AtomicBool>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    /// Mark the service unhealthy. Returns `true` if this call made the flip.
    pub fn set_unhealthy(&self) -> bool {
        let flipped = self.healthy.swap(false, Ordering::SeqCst);
        if flipped {
            tracing::info!("health state set to unhealthy");
        }
        flipped
    }
}

/// Body of a successful health check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub build_info: BuildInfo,
    pub hostname: String,
    pub uptime: String,
    pub started_at: String,
}

/// Compact uptime such as `3h4m5s`, `4m5s` or `5.120s`.
pub fn format_uptime(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{s}.{:03}s", d.subsec_millis())
    }
}
