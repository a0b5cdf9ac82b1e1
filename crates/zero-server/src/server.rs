//! Accept loop and connection tasks.
//!
//! Connections speak HTTP/1.1 and each one runs, handler included, inside a
//! task held by the accept loop's `JoinSet`. Dropping the accept task drops
//! that set, which aborts every connection it started.

use std::io;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use zero_core::error::Result;

use crate::ops::shutdown::{Orchestrator, ShutdownReport};

// Pause after a failed accept, typically file descriptor exhaustion.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Serve `app` on `listener` in a background task and block on the shutdown
/// sequence until it reaches a terminal state.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    orchestrator: Orchestrator,
) -> Result<ShutdownReport> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "http server listening");
    }

    let stop = CancellationToken::new();
    let handle = tokio::spawn(accept_loop(listener, app, stop.clone()));

    orchestrator.drive(handle, stop).await
}

/// Accept until `stop` fires, then close the listener and wait for every open
/// connection to finish its in-flight request.
async fn accept_loop(listener: TcpListener, app: Router, stop: CancellationToken) -> io::Result<()> {
    let http = http1::Builder::new();
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let app = app.clone();
                    let svc = TowerToHyperService::new(tower::service_fn(
                        move |mut req: Request<Incoming>| {
                            req.extensions_mut().insert(ConnectInfo(peer));
                            app.clone().oneshot(req)
                        },
                    ));
                    let conn = http.serve_connection(TokioIo::new(stream), svc);
                    let stop = stop.clone();

                    connections.spawn(async move {
                        tokio::pin!(conn);
                        let served = tokio::select! {
                            res = conn.as_mut() => res,
                            _ = stop.cancelled() => {
                                conn.as_mut().graceful_shutdown();
                                conn.as_mut().await
                            }
                        };
                        if let Err(e) = served {
                            tracing::debug!(%peer, error = %e, "connection closed with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
            Some(done) = connections.join_next() => reap(done),
        }
    }

    drop(listener);
    tracing::debug!(open = connections.len(), "listener closed; draining connections");
    while let Some(done) = connections.join_next().await {
        reap(done);
    }
    Ok(())
}

fn reap(done: std::result::Result<(), JoinError>) {
    if let Err(e) = done {
        if e.is_panic() {
            tracing::error!(error = %e, "connection task panicked");
        }
    }
}
