#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use zero_server::router::build_router;

use common::{body_json, get, post, test_state};

#[tokio::test]
async fn list_returns_seeded_users_in_id_order() {
    let router = build_router(test_state());
    let resp = router.oneshot(get("/api/users")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = body_json(resp).await;
    let users = v.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["id"], 1);
    assert_eq!(users[0]["firstName"], "Ada");
    assert_eq!(users[1]["id"], 2);
    assert_eq!(users[1]["secondName"], "Turing");
    assert_eq!(users[1]["birthDate"], "1912-06-23T00:00:00Z");
}

#[tokio::test]
async fn add_then_get_user() {
    let router = build_router(test_state());
    let body = json!({
        "firstName": "Grace",
        "secondName": "Hopper",
        "birthDate": "1906-12-09T00:00:00Z"
    });

    let resp = router
        .clone()
        .oneshot(post("/api/users", body.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["id"], 3);
    assert_eq!(created["firstName"], "Grace");

    let resp = router.clone().oneshot(get("/api/users/3")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, created);

    let resp = router.oneshot(get("/api/users")).await.unwrap();
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn missing_user_is_404() {
    let router = build_router(test_state());
    let resp = router.oneshot(get("/api/users/99")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(resp).await,
        json!({"httpStatus": 404, "error": "can't find user with id: 99"})
    );
}

#[tokio::test]
async fn non_numeric_id_is_400() {
    let router = build_router(test_state());
    let resp = router.oneshot(get("/api/users/abc")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await,
        json!({"httpStatus": 400, "error": "invalid user id: abc"})
    );
}

#[tokio::test]
async fn malformed_or_invalid_payload_is_400() {
    let router = build_router(test_state());

    for payload in [
        "{not json".to_string(),
        json!({"firstName": "X", "secondName": "Y", "birthDate": "2000-01-01T00:00:00Z", "age": 3})
            .to_string(),
    ] {
        let resp = router.clone().oneshot(post("/api/users", payload)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = body_json(resp).await;
        assert_eq!(v["error"], "can't deserialize json with user");
    }

    let blank = json!({"firstName": " ", "secondName": "Y", "birthDate": "2000-01-01T00:00:00Z"});
    let resp = router.oneshot(post("/api/users", blank.to_string())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "firstName must not be empty");
}

#[tokio::test]
async fn error_simulator_echoes_body() {
    let router = build_router(test_state());
    let resp = router
        .oneshot(post("/api/error", "boom happened"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(resp).await,
        json!({"httpStatus": 500, "error": "boom happened"})
    );
}

#[tokio::test]
async fn unknown_route_is_404_and_counted() {
    let state = test_state();
    let router = build_router(state.clone());
    let resp = router.oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(resp).await,
        json!({"httpStatus": 404, "error": "not found: /nope"})
    );

    assert_eq!(
        state
            .http_metrics()
            .request_count(StatusCode::NOT_FOUND, &axum::http::Method::GET, "/nope"),
        1
    );
}
