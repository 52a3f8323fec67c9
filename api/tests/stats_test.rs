mod helpers;

use axum::http::StatusCode;
use helpers::{create_class, create_student, make_test_app, send};
use serde_json::json;

#[tokio::test]
async fn class_and_summary_statistics() {
    let (app, _) = make_test_app().await;
    let ada = create_student(&app, "STU20240001", "Ada").await;
    let alan = create_student(&app, "STU20240002", "Alan").await;
    create_student(&app, "STU20240003", "Absent").await;
    create_student(&app, "STU20240004", "Missing").await;

    let past = create_class(&app, "Lab A", "2024-03-01", "09:00").await;
    let upcoming = create_class(&app, "Upcoming", "2099-01-01", "09:00").await;

    for s in [&ada, &alan] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/classes/{}/scan", past["id"]),
            Some(json!({ "payload": s["qr_payload"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = send(&app, "GET", &format!("/api/classes/{}/stats", past["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    let stats = &json["data"];
    assert_eq!(stats["attendance_count"], 2);
    assert_eq!(stats["late_count"], 2);
    assert_eq!(stats["on_time_count"], 0);
    assert_eq!(stats["absent_count"], 2);
    assert_eq!(stats["attendance_rate"], 50.0);
    assert_eq!(stats["is_full"], false);

    let (_, json) = send(&app, "GET", &format!("/api/classes/{}/stats", upcoming["id"]), None).await;
    assert_eq!(json["data"]["absent_count"], 0);
    assert_eq!(json["data"]["average_arrival"], "N/A");

    let (status, json) = send(&app, "GET", "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    let summary = &json["data"];
    assert_eq!(summary["total_students"], 4);
    assert_eq!(summary["total_classes"], 2);
    assert_eq!(summary["total_attendance"], 2);
    assert_eq!(summary["total_late"], 2);
    // (50 + 0) / 2
    assert_eq!(summary["average_attendance_rate"], 25.0);

    let (status, _) = send(&app, "GET", "/api/classes/999/stats", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_store_has_zero_rates() {
    let (app, _) = make_test_app().await;
    let (_, json) = send(&app, "GET", "/api/stats", None).await;
    assert_eq!(json["data"]["average_attendance_rate"], 0.0);
    assert_eq!(json["data"]["classes"].as_array().unwrap().len(), 0);
}
