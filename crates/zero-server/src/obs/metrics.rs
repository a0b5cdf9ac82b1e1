//! Labelled counter and histogram vectors, plus the HTTP request series.
//!
//! Series are keyed by sorted label vectors in a `DashMap`, values are atomics,
//! so recording never takes a lock across requests. Histogram buckets are fixed
//! in microseconds to keep the hot path free of floating point math; they are
//! converted to seconds only when a snapshot is taken.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::http::{Method, StatusCode};

use crate::obs::outcome::RequestOutcome;
use crate::obs::registry::Collector;
use crate::obs::RequestObserver;
use crate::ops::health::HealthState;

/// Sorted `(label, value)` pairs identifying one series.
pub type LabelSet = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelSet {
    let mut key: LabelSet = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelSet, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Current value of one series (0 when never observed).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn snapshot(&self) -> Vec<Sample> {
        self.map
            .iter()
            .map(|r| Sample {
                labels: r.key().clone(),
                value: SampleValue::Counter(r.value().load(Ordering::Relaxed)),
            })
            .collect()
    }
}

// Fixed buckets in microseconds, matching the usual Prometheus defaults:
// 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const BUCKETS_MICROS: [u64; 11] = [
    5_000, 10_000, 25_000, 50_000, 100_000, 250_000, 500_000, 1_000_000, 2_500_000, 5_000_000,
    10_000_000,
];

struct AtomicHistogram {
    count: AtomicU64,
    sum_micros: AtomicU64,
    buckets: [AtomicU64; BUCKETS_MICROS.len()],
}

impl Default for AtomicHistogram {
    fn default() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum_micros: AtomicU64::new(0),
            buckets: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelSet, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum_micros.fetch_add(micros, Ordering::Relaxed);

        // Cumulative buckets: every bucket whose bound covers the value.
        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn snapshot(&self) -> Vec<Sample> {
        self.map
            .iter()
            .map(|r| {
                let hist = r.value();
                let count = hist.count.load(Ordering::Relaxed);
                // Writers may be mid-update; never report a bucket above the total.
                let buckets = BUCKETS_MICROS
                    .iter()
                    .zip(hist.buckets.iter())
                    .map(|(&le, b)| (le as f64 / 1e6, b.load(Ordering::Relaxed).min(count)))
                    .collect();
                Sample {
                    labels: r.key().clone(),
                    value: SampleValue::Histogram(HistogramSnapshot {
                        buckets,
                        count,
                        sum_seconds: hist.sum_micros.load(Ordering::Relaxed) as f64 / 1e6,
                    }),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

/// Static description of one metric family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desc {
    pub name: String,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// `(upper bound in seconds, cumulative count)`, `+Inf` excluded.
    pub buckets: Vec<(f64, u64)>,
    pub count: u64,
    pub sum_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Counter(u64),
    Gauge(i64),
    Histogram(HistogramSnapshot),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: LabelSet,
    pub value: SampleValue,
}

impl Sample {
    /// Value of a label in this series, if present.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Point-in-time view of one family as handed to a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub desc: Desc,
    pub samples: Vec<Sample>,
}

fn label_str(labels: &LabelSet) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn series(name: &str, labels: &str) -> String {
    if labels.is_empty() {
        name.to_string()
    } else {
        format!("{}{{{}}}", name, labels)
    }
}

/// Render families in the Prometheus text exposition format.
pub fn encode_text(families: &[MetricFamily]) -> String {
    let mut out = String::new();
    for f in families {
        let name = &f.desc.name;
        let _ = writeln!(out, "# HELP {} {}", name, f.desc.help);
        let _ = writeln!(out, "# TYPE {} {}", name, f.desc.kind.as_str());
        for s in &f.samples {
            let labels = label_str(&s.labels);
            match &s.value {
                SampleValue::Counter(v) => {
                    let _ = writeln!(out, "{} {}", series(name, &labels), v);
                }
                SampleValue::Gauge(v) => {
                    let _ = writeln!(out, "{} {}", series(name, &labels), v);
                }
                SampleValue::Histogram(h) => {
                    let prefix = if labels.is_empty() {
                        String::new()
                    } else {
                        format!("{},", labels)
                    };
                    for (le, count) in &h.buckets {
                        let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
                    }
                    let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, h.count);
                    let _ = writeln!(out, "{} {}", series(&format!("{name}_sum"), &labels), h.sum_seconds);
                    let _ = writeln!(out, "{} {}", series(&format!("{name}_count"), &labels), h.count);
                }
            }
        }
    }
    out
}

pub const REQUESTS_TOTAL: &str = "monitoring_rest_http_requests_total";
pub const REQUEST_DURATION: &str = "monitoring_rest_http_durations_histogram_seconds";
const REQUEST_LABELS: &[&str] = &["code", "method", "endpoint"];

/// Request counter and latency histogram keyed by (code, method, endpoint).
///
/// The endpoint label is the raw request path, so its cardinality follows
/// whatever clients ask for.
#[derive(Default)]
pub struct HttpMetrics {
    requests: CounterVec,
    duration: HistogramVec,
}

impl HttpMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, status: StatusCode, method: &Method, route: &str, elapsed: Duration) {
        let code = status.as_u16().to_string();
        let labels = [
            ("code", code.as_str()),
            ("method", method.as_str()),
            ("endpoint", route),
        ];
        self.requests.inc(&labels);
        self.duration.observe(&labels, elapsed);
    }

    /// Requests recorded for one label tuple.
    pub fn request_count(&self, status: StatusCode, method: &Method, route: &str) -> u64 {
        let code = status.as_u16().to_string();
        self.requests.get(&[
            ("code", code.as_str()),
            ("method", method.as_str()),
            ("endpoint", route),
        ])
    }
}

impl RequestObserver for HttpMetrics {
    fn observe(&self, outcome: &RequestOutcome) {
        self.record_request(outcome.status, &outcome.method, &outcome.route, outcome.elapsed);
    }
}

impl Collector for HttpMetrics {
    fn describe(&self) -> Vec<Desc> {
        vec![
            Desc {
                name: REQUESTS_TOTAL.into(),
                help: "Total number of requests received.",
                kind: MetricKind::Counter,
                labels: REQUEST_LABELS,
            },
            Desc {
                name: REQUEST_DURATION.into(),
                help: "Request time duration.",
                kind: MetricKind::Histogram,
                labels: REQUEST_LABELS,
            },
        ]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut descs = self.describe().into_iter();
        let mut out = Vec::with_capacity(2);
        if let Some(desc) = descs.next() {
            out.push(MetricFamily { desc, samples: self.requests.snapshot() });
        }
        if let Some(desc) = descs.next() {
            out.push(MetricFamily { desc, samples: self.duration.snapshot() });
        }
        out
    }
}

pub const HEALTHY: &str = "monitoring_rest_healthy";

/// Exposes the health flag as a 0/1 gauge.
pub struct HealthGauge {
    health: HealthState,
}

impl HealthGauge {
    pub fn new(health: HealthState) -> Self {
        Self { health }
    }
}

impl Collector for HealthGauge {
    fn describe(&self) -> Vec<Desc> {
        vec![Desc {
            name: HEALTHY.into(),
            help: "1 while the service accepts traffic, 0 once draining.",
            kind: MetricKind::Gauge,
            labels: &[],
        }]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let value = i64::from(self.health.is_healthy());
        self.describe()
            .into_iter()
            .map(|desc| MetricFamily {
                desc,
                samples: vec![Sample { labels: Vec::new(), value: SampleValue::Gauge(value) }],
            })
            .collect()
    }
}
