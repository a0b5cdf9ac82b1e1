//! One log line per completed request.

use std::fmt::Write;

use crate::obs::outcome::RequestOutcome;
use crate::obs::RequestObserver;

#[derive(Debug, Default, Clone, Copy)]
pub struct AccessLog;

impl AccessLog {
    pub fn new() -> Self {
        Self
    }

    /// `<client> - "<METHOD> <uri> <proto>" <status> <bytes> "<ua>" Took: <elapsed>`
    pub fn format_line(o: &RequestOutcome) -> String {
        let mut line = String::with_capacity(128);
        let _ = write!(
            line,
            "{} - \"{} {} {:?}\" {} {} \"{}\" Took: {:?}",
            o.remote_addr,
            o.method,
            o.uri,
            o.version,
            o.status.as_u16(),
            o.response_bytes,
            o.user_agent,
            o.elapsed,
        );
        line
    }
}

impl RequestObserver for AccessLog {
    fn observe(&self, o: &RequestOutcome) {
        let line = Self::format_line(o);
        tracing::info!(
            target: "zero::access",
            remote = %o.remote_addr,
            method = %o.method,
            uri = %o.uri,
            status = o.status.as_u16(),
            bytes = o.response_bytes,
            elapsed_us = u64::try_from(o.elapsed.as_micros()).unwrap_or(u64::MAX),
            "{line}"
        );
    }
}
