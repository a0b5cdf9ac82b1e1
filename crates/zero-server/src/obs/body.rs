//! Response body wrapper that counts bytes on their way to the transport.
//!
//! Frames are forwarded untouched, including size hints, so framing decisions
//! (content-length vs chunked) are exactly what the inner body would produce.
//! The completion callback fires once: at end of stream, on a body error, or
//! when the body is dropped early (client gone, connection aborted).

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::obs::outcome::CallStats;

pub type OnComplete = Box<dyn FnOnce(CallStats) + Send + 'static>;

pub struct InstrumentedBody {
    inner: Body,
    stats: CallStats,
    on_complete: Option<OnComplete>,
}

impl InstrumentedBody {
    pub fn new(inner: Body, stats: CallStats, on_complete: OnComplete) -> Self {
        Self {
            inner,
            stats,
            on_complete: Some(on_complete),
        }
    }

    fn finish(&mut self) {
        if let Some(cb) = self.on_complete.take() {
            cb(std::mem::take(&mut self.stats));
        }
    }
}

impl HttpBody for InstrumentedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.stats.record_write(data.len());
                }
            }
            Poll::Ready(Some(Err(_))) | Poll::Ready(None) => this.finish(),
            Poll::Pending => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for InstrumentedBody {
    fn drop(&mut self) {
        self.finish();
    }
}
