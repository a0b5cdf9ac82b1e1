#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode, Version};
use axum::{middleware, routing::get, Router};
use tower::ServiceExt;

use zero_server::obs::outcome::{client_addr, RequestMeta};
use zero_server::obs::{track_requests, AccessLog, CallStats, Instrumentation, RequestOutcome};
use zero_server::obs::RequestObserver;

use common::body_string;

fn outcome() -> RequestOutcome {
    RequestOutcome {
        status: StatusCode::NOT_FOUND,
        response_bytes: 42,
        method: Method::GET,
        uri: "/api/users/9?verbose=1".into(),
        route: "/api/users/9".into(),
        version: Version::HTTP_11,
        elapsed: Duration::from_millis(3),
        remote_addr: "10.0.0.7".into(),
        user_agent: "curl/8.0".into(),
    }
}

#[test]
fn line_format() {
    assert_eq!(
        AccessLog::format_line(&outcome()),
        "10.0.0.7 - \"GET /api/users/9?verbose=1 HTTP/1.1\" 404 42 \"curl/8.0\" Took: 3ms"
    );
}

#[test]
fn client_address_resolution() {
    let peer: SocketAddr = "192.168.1.5:40000".parse().unwrap();
    let mut headers = HeaderMap::new();

    assert_eq!(client_addr(&headers, None), "-");
    assert_eq!(client_addr(&headers, Some(peer)), "192.168.1.5:40000");

    headers.insert("x-forwarded-for", HeaderValue::from_static(" , 203.0.113.9, 10.0.0.1"));
    assert_eq!(client_addr(&headers, Some(peer)), "203.0.113.9");

    headers.insert("x-forwarded-for", HeaderValue::from_static(" "));
    assert_eq!(client_addr(&headers, Some(peer)), "192.168.1.5:40000");
}

#[test]
fn request_meta_uses_connect_info() {
    let peer: SocketAddr = "127.0.0.1:5555".parse().unwrap();
    let mut req = Request::builder()
        .method("DELETE")
        .uri("/api/users/1?x=y")
        .header("user-agent", "probe")
        .body(())
        .unwrap();
    req.extensions_mut().insert(ConnectInfo(peer));

    let meta = RequestMeta::from_request(&req);
    assert_eq!(meta.method, Method::DELETE);
    assert_eq!(meta.uri, "/api/users/1?x=y");
    assert_eq!(meta.route, "/api/users/1");
    assert_eq!(meta.remote_addr, "127.0.0.1:5555");
    assert_eq!(meta.user_agent, "probe");

    let out = RequestOutcome::new(meta, &CallStats::new(), Duration::from_millis(1));
    assert_eq!(out.status, StatusCode::OK);
    assert_eq!(out.response_bytes, 0);
}

struct Panicky;

impl RequestObserver for Panicky {
    fn observe(&self, _outcome: &RequestOutcome) {
        panic!("observer failure");
    }
}

#[derive(Default)]
struct Recorder {
    calls: AtomicUsize,
    last: Mutex<Option<RequestOutcome>>,
}

impl RequestObserver for Recorder {
    fn observe(&self, outcome: &RequestOutcome) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(outcome.clone());
    }
}

#[tokio::test]
async fn failing_observer_does_not_affect_response_or_others() {
    let recorder = Arc::new(Recorder::default());
    let instr = Instrumentation::new(vec![
        Arc::new(Panicky),
        recorder.clone() as Arc<dyn RequestObserver>,
    ]);
    let app = Router::new()
        .route("/hello", get(|| async { (StatusCode::ACCEPTED, "hello") }))
        .layer(middleware::from_fn_with_state(instr, track_requests));

    let req = Request::builder()
        .uri("/hello")
        .header("x-forwarded-for", "198.51.100.2")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(body_string(resp).await, "hello");

    assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
    let seen = recorder.last.lock().unwrap().clone().unwrap();
    assert_eq!(seen.status, StatusCode::ACCEPTED);
    assert_eq!(seen.response_bytes, 5);
    assert_eq!(seen.remote_addr, "198.51.100.2");
    assert_eq!(seen.route, "/hello");
}

#[tokio::test]
async fn served_requests_carry_the_peer_address() {
    use zero_server::ops::health::HealthState;
    use zero_server::ops::shutdown::{DrainPolicy, Orchestrator, ShutdownSignal};

    let recorder = Arc::new(Recorder::default());
    let instr = Instrumentation::new(vec![recorder.clone() as Arc<dyn RequestObserver>]);
    let app = Router::new()
        .route("/hello", get(|| async { "hello" }))
        .layer(middleware::from_fn_with_state(instr, track_requests));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let signal = ShutdownSignal::new();
    let policy = DrainPolicy {
        grace_period: Duration::ZERO,
        shutdown_timeout: Duration::from_secs(5),
    };
    let orch = Orchestrator::new(HealthState::new(), policy, signal.clone());
    let serving = tokio::spawn(zero_server::server::serve(listener, app, orch));

    let (status, _) = common::raw_get(addr, "/hello").await;
    assert_eq!(status, 200);

    signal.trigger();
    serving.await.unwrap().unwrap();

    let seen = recorder.last.lock().unwrap().clone().unwrap();
    assert!(seen.remote_addr.starts_with("127.0.0.1:"), "{}", seen.remote_addr);
    assert_eq!(seen.version, Version::HTTP_11);
}
