//! Shared application state for the zero server.
//!
//! Built once at startup: resolves the hostname, opens the user store, and
//! registers the request and health collectors on an owned registry. Startup
//! failures come back as `Result` so `main` can exit without serving.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use zero_core::error::{Result, ZeroError};
use zero_core::BuildInfo;

use crate::config::ServerConfig;
use crate::obs::metrics::HealthGauge;
use crate::obs::{AccessLog, HttpMetrics, Instrumentation, Registry, RequestObserver};
use crate::ops::health::HealthState;
use crate::store::{MemoryStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    store: Arc<dyn UserStore>,
    health: HealthState,
}

struct AppStateInner {
    cfg: ServerConfig,
    build: BuildInfo,
    hostname: String,
    started_at: DateTime<Utc>,
    started: Instant,
    registry: Registry,
    http_metrics: Arc<HttpMetrics>,
}

impl AppState {
    /// Build application state with the in-memory store from `cfg.store`.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::open(&cfg.store)?);
        Self::with_store(cfg, store)
    }

    /// Build application state around an already opened store.
    pub fn with_store(cfg: ServerConfig, store: Arc<dyn UserStore>) -> Result<Self> {
        let hostname = resolve_hostname(cfg.server.hostname.as_deref())?;
        let health = HealthState::new();

        let registry = Registry::new();
        let http_metrics = Arc::new(HttpMetrics::new());
        // A rejected collector only costs its series; serving goes on.
        if let Err(e) = registry.register(http_metrics.clone()) {
            tracing::warn!(error = %e, "request metrics not registered");
        }
        if let Err(e) = registry.register(Arc::new(HealthGauge::new(health.clone()))) {
            tracing::warn!(error = %e, "health gauge not registered");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                build: BuildInfo::from_build_env(),
                hostname,
                started_at: Utc::now(),
                started: Instant::now(),
                registry,
                http_metrics,
            }),
            store,
            health,
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn health(&self) -> &HealthState {
        &self.health
    }

    pub fn build_info(&self) -> &BuildInfo {
        &self.inner.build
    }

    pub fn hostname(&self) -> &str {
        &self.inner.hostname
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started.elapsed()
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn http_metrics(&self) -> Arc<HttpMetrics> {
        Arc::clone(&self.inner.http_metrics)
    }

    /// Observers fed by the request middleware: metrics first, then the access log.
    pub fn instrumentation(&self) -> Instrumentation {
        let metrics: Arc<dyn RequestObserver> = self.http_metrics();
        Instrumentation::new(vec![metrics, Arc::new(AccessLog::new())])
    }
}

fn resolve_hostname(configured: Option<&str>) -> Result<String> {
    if let Some(h) = configured {
        return Ok(h.to_string());
    }
    if let Ok(h) = std::env::var("HOSTNAME") {
        if !h.trim().is_empty() {
            return Ok(h.trim().to_string());
        }
    }
    for path in ["/proc/sys/kernel/hostname", "/etc/hostname"] {
        if let Ok(h) = std::fs::read_to_string(path) {
            if !h.trim().is_empty() {
                return Ok(h.trim().to_string());
            }
        }
    }
    Err(ZeroError::Config(
        "hostname lookup failed; set server.hostname".into(),
    ))
}
