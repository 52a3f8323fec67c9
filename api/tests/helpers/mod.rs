#![allow(dead_code)]

use api::state::AppState;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use db::LatenessPolicy;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;
use util::{retry::RetryPolicy, ws::WebSocketManager};

/// Router over a fresh in-memory database, plus the state behind it.
pub async fn make_test_app() -> (Router, AppState) {
    let db = db::test_utils::setup_test_db().await;
    let state = AppState::new(
        db,
        WebSocketManager::new(),
        LatenessPolicy::new(15),
        RetryPolicy::none(),
    );
    (api::app(state.clone()), state)
}

pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, bytes.to_vec())
}

/// Sends a request and parses the `ApiResponse` envelope.
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(app, method, uri, body).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn create_student(app: &Router, code: &str, first: &str) -> Value {
    let (status, json) = send(
        app,
        "POST",
        "/api/students",
        Some(serde_json::json!({
            "first_name": first,
            "last_name": "Test",
            "student_code": code,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"].clone()
}

pub async fn create_class(app: &Router, name: &str, date: &str, time: &str) -> Value {
    let (status, json) = send(
        app,
        "POST",
        "/api/classes",
        Some(serde_json::json!({ "name": name, "date": date, "time": time })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"].clone()
}

/// Serves `app` on a random local port.
pub async fn spawn_server(app: Router) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
