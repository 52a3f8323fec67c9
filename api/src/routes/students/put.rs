use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::student;
use serde::Deserialize;
use validator::Validate;

use super::common::StudentResponse;
use crate::response::ApiResponse;
use crate::routes::common::{error_response, validation_error};
use crate::state::{AppState, topics};

/// Code and QR payload are immutable and not accepted here.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStudentReq {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,
    pub email: Option<String>,
}

/// PUT /api/students/{student_id}
pub async fn update_student(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Json(req): Json<UpdateStudentReq>,
) -> Response {
    if let Err(e) = req.validate() {
        return validation_error(&e);
    }

    match student::Model::update_profile(
        state.db(),
        student_id,
        &req.first_name,
        &req.last_name,
        req.email.as_deref(),
    )
    .await
    {
        Ok(s) => {
            let body = StudentResponse::from(s);
            state
                .notify(topics::STUDENTS, "student.updated", &body)
                .await;
            (
                StatusCode::OK,
                Json(ApiResponse::success(body, "Student updated")),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}
