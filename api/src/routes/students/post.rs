use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use db::models::student::{self, NewStudent};
use serde::Deserialize;
use util::config;
use validator::Validate;

use super::common::StudentResponse;
use crate::response::ApiResponse;
use crate::routes::common::{error_response, validation_error};
use crate::state::{AppState, topics};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentReq {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,
    pub email: Option<String>,
    /// Generated from `STUDENT_CODE_PREFIX` and the current year when absent.
    #[validate(length(max = 32, message = "Student code must be at most 32 characters"))]
    pub student_code: Option<String>,
}

/// POST /api/students
///
/// - `201 Created` with the student, including its QR payload
/// - `400 Bad Request` for missing names, a bad email or an invalid code
/// - `409 Conflict` when the code or email is taken
pub async fn create_student(
    State(state): State<AppState>,
    Json(req): Json<CreateStudentReq>,
) -> Response {
    if let Err(e) = req.validate() {
        return validation_error(&e);
    }

    let input = NewStudent {
        first_name: req.first_name,
        last_name: req.last_name,
        email: ::common::non_blank(req.email.as_deref()),
        student_code: ::common::non_blank(req.student_code.as_deref()),
    };

    match student::Model::create(state.db(), input, &config::student_code_prefix(), Utc::now())
        .await
    {
        Ok(s) => {
            let body = StudentResponse::from(s);
            state
                .notify(topics::STUDENTS, "student.created", &body)
                .await;
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(body, "Student registered")),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}
