//! Explicit metrics registry.
//!
//! Collectors are registered once at startup by whoever owns them; scrapes
//! call `gather()` and see whatever the collectors report at that moment.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use crate::obs::metrics::{encode_text, Desc, MetricFamily};

/// A source of metric families for a pull-based scrape.
pub trait Collector: Send + Sync {
    /// Families this collector will ever report.
    fn describe(&self) -> Vec<Desc>;
    /// Current series; may trail concurrent writers slightly.
    fn collect(&self) -> Vec<MetricFamily>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("metric already registered: {0}")]
    Duplicate(String),
}

#[derive(Default)]
pub struct Registry {
    inner: RwLock<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    names: HashSet<String>,
    collectors: Vec<Arc<dyn Collector>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collector. Fails without side effects when any of its metric
    /// names is already taken.
    pub fn register(&self, collector: Arc<dyn Collector>) -> Result<(), RegistryError> {
        let descs = collector.describe();
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let mut fresh = HashSet::new();
        for d in &descs {
            if inner.names.contains(&d.name) || !fresh.insert(d.name.clone()) {
                return Err(RegistryError::Duplicate(d.name.clone()));
            }
        }

        inner.names.extend(fresh);
        inner.collectors.push(collector);
        Ok(())
    }

    /// Descriptions of every registered family.
    pub fn describe(&self) -> Vec<Desc> {
        self.collectors().iter().flat_map(|c| c.describe()).collect()
    }

    /// Snapshot every registered collector, families sorted by name.
    pub fn gather(&self) -> Vec<MetricFamily> {
        let mut families: Vec<MetricFamily> =
            self.collectors().iter().flat_map(|c| c.collect()).collect();
        families.sort_by(|a, b| a.desc.name.cmp(&b.desc.name));
        for f in &mut families {
            f.samples.sort_by(|a, b| a.labels.cmp(&b.labels));
        }
        families
    }

    /// Prometheus text exposition of `gather()`.
    pub fn render(&self) -> String {
        encode_text(&self.gather())
    }

    // Collectors are cloned out so no lock is held while they run.
    fn collectors(&self) -> Vec<Arc<dyn Collector>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .collectors
            .clone()
    }
}
