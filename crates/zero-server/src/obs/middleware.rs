//! Request instrumentation middleware.
//!
//! Wraps the routed handler: captures request metadata and the start time,
//! runs the handler once, then swaps the response body for an
//! [`InstrumentedBody`] that reports to every observer when the body is done.
//! Handlers are unaware of any of this.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::obs::body::InstrumentedBody;
use crate::obs::outcome::{CallStats, RequestMeta, RequestOutcome};
use crate::obs::RequestObserver;

/// Ordered set of observers fed with each completed request.
#[derive(Clone, Default)]
pub struct Instrumentation {
    observers: Arc<Vec<Arc<dyn RequestObserver>>>,
}

impl Instrumentation {
    pub fn new(observers: Vec<Arc<dyn RequestObserver>>) -> Self {
        Self {
            observers: Arc::new(observers),
        }
    }

    /// Feed one outcome to every observer, in registration order. A failing
    /// observer is logged and skipped; the rest still run.
    pub fn report(&self, outcome: &RequestOutcome) {
        for obs in self.observers.iter() {
            if catch_unwind(AssertUnwindSafe(|| obs.observe(outcome))).is_err() {
                tracing::warn!(uri = %outcome.uri, "request observer panicked; report skipped");
            }
        }
    }
}

pub async fn track_requests(
    State(instr): State<Instrumentation>,
    req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let meta = RequestMeta::from_request(&req);

    let response = next.run(req).await;

    let (parts, body) = response.into_parts();
    let mut stats = CallStats::new();
    stats.record_status(parts.status);

    let body = InstrumentedBody::new(
        body,
        stats,
        Box::new(move |stats: CallStats| {
            let outcome = RequestOutcome::new(meta, &stats, started.elapsed());
            instr.report(&outcome);
        }),
    );

    Response::from_parts(parts, Body::new(body))
}
