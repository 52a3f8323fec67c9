use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use db::models::attendance_record;
use db::models::class_session::{self, NewClass};
use serde::Deserialize;
use util::config;
use validator::Validate;

use super::common::{ClassResponse, ScanResponse};
use crate::response::ApiResponse;
use crate::routes::common::{PayloadReq, error_response, parse_class_time, validation_error};
use crate::state::{AppState, topics};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassReq {
    #[validate(length(min = 1, max = 100, message = "Class name must be 1-100 characters"))]
    pub name: String,
    /// `YYYY-MM-DD`
    pub date: NaiveDate,
    /// `HH:MM` on the class wall clock
    pub time: String,
    /// Defaults to `DEFAULT_CLASS_CAPACITY`.
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i32>,
}

/// POST /api/classes
///
/// - `201 Created` with the class and its QR payload
/// - `400 Bad Request` for a missing name, bad time or capacity below 1
pub async fn create_class(
    State(state): State<AppState>,
    Json(req): Json<CreateClassReq>,
) -> Response {
    if let Err(e) = req.validate() {
        return validation_error(&e);
    }
    let Some(time) = parse_class_time(&req.time) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error("Time must be HH:MM")),
        )
            .into_response();
    };

    let input = NewClass {
        name: req.name,
        class_date: req.date,
        class_time: time,
        capacity: req.capacity,
    };

    match class_session::Model::create(
        state.db(),
        input,
        config::default_class_capacity(),
        Utc::now(),
    )
    .await
    {
        Ok(c) => {
            let body = ClassResponse::from(c);
            state.notify(topics::CLASSES, "class.created", &body).await;
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(body, "Class created")),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/classes/{class_id}/scan
///
/// Records attendance for the student whose QR payload was scanned.
///
/// - `201 Created` with status `present` or `late`
/// - `400 Bad Request` for an unrecognised payload or a class code
/// - `404 Not Found` for an unknown class or student
/// - `409 Conflict` when the student is already recorded for this class
pub async fn scan_into_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(req): Json<PayloadReq>,
) -> Response {
    if let Err(e) = req.validate() {
        return validation_error(&e);
    }

    match attendance_record::Model::mark_from_payload(
        state.db(),
        state.policy(),
        class_id,
        &req.payload,
        Utc::now(),
    )
    .await
    {
        Ok(marked) => {
            let body = ScanResponse::from(marked);
            state
                .notify(topics::ATTENDANCE, "attendance.marked", &body)
                .await;
            let message = format!("{} marked {}", body.student.full_name, body.status);
            (StatusCode::CREATED, Json(ApiResponse::success(body, message))).into_response()
        }
        Err(e) => {
            tracing::info!(class_id, "Scan rejected: {e}");
            error_response(e)
        }
    }
}
