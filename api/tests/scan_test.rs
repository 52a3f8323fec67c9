mod helpers;

use axum::http::StatusCode;
use helpers::{create_class, create_student, make_test_app, send};
use serde_json::json;

#[tokio::test]
async fn resolve_identifies_students_and_classes() {
    let (app, _) = make_test_app().await;
    let ada = create_student(&app, "STU20240001", "Ada").await;
    let class = create_class(&app, "Lab A", "2024-03-01", "09:00").await;

    let (status, json) = send(&app, "POST", "/api/scan/resolve", Some(json!({ "payload": ada["qr_payload"] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["kind"], "student");
    assert_eq!(json["data"]["student"]["student_code"], "STU20240001");
    assert_eq!(json["data"]["class"], serde_json::Value::Null);

    let (status, json) = send(&app, "POST", "/api/scan/resolve", Some(json!({ "payload": class["qr_payload"] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["kind"], "class");
    assert_eq!(json["data"]["class"]["name"], "Lab A");
}

#[tokio::test]
async fn resolve_rejects_garbage_and_reports_unknown_codes() {
    let (app, _) = make_test_app().await;

    let (status, json) = send(&app, "POST", "/api/scan/resolve", Some(json!({ "payload": "https://example.com" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Scan payload not recognized");

    let (status, _) = send(&app, "POST", "/api/scan/resolve", Some(json!({ "payload": "STUDENT:STU20249999:1" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
