//! Per-request observation state.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request, StatusCode, Version};

/// Observes the status and byte count of one response without altering it.
///
/// The status is locked in by the first write: once body bytes have gone out
/// the head is on the wire, so later status changes are not what the client saw.
#[derive(Debug, Default, Clone)]
pub struct CallStats {
    status: Option<StatusCode>,
    bytes: u64,
}

impl CallStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_status(&mut self, status: StatusCode) {
        if self.bytes == 0 {
            self.status = Some(status);
        }
    }

    pub fn record_write(&mut self, n: usize) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.bytes += n as u64;
    }

    /// Status observed so far; implicit 200 when nothing set one.
    pub fn status_code(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Cumulative bytes handed to the transport.
    pub fn response_size(&self) -> u64 {
        self.bytes
    }
}

/// Request metadata captured before the inner handler runs.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Method,
    pub uri: String,
    pub route: String,
    pub version: Version,
    pub remote_addr: String,
    pub user_agent: String,
}

impl RequestMeta {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let uri = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());

        Self {
            method: req.method().clone(),
            uri,
            route: req.uri().path().to_string(),
            version: req.version(),
            remote_addr: client_addr(req.headers(), peer),
            user_agent: req
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Client address: first non-empty `X-Forwarded-For` entry, else the peer.
pub fn client_addr(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').map(str::trim).find(|s| !s.is_empty()));

    match (forwarded, peer) {
        (Some(f), _) => f.to_string(),
        (None, Some(p)) => p.to_string(),
        (None, None) => "-".to_string(),
    }
}

/// Everything known about one completed request.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub status: StatusCode,
    pub response_bytes: u64,
    pub method: Method,
    /// Path and query as requested; used in the access log.
    pub uri: String,
    /// Path only; used as the metric endpoint label.
    pub route: String,
    pub version: Version,
    pub elapsed: Duration,
    pub remote_addr: String,
    pub user_agent: String,
}

impl RequestOutcome {
    pub fn new(meta: RequestMeta, stats: &CallStats, elapsed: Duration) -> Self {
        Self {
            status: stats.status_code(),
            response_bytes: stats.response_size(),
            method: meta.method,
            uri: meta.uri,
            route: meta.route,
            version: meta.version,
            elapsed,
            remote_addr: meta.remote_addr,
            user_agent: meta.user_agent,
        }
    }
}
