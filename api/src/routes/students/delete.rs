use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::student;
use serde_json::json;

use crate::response::ApiResponse;
use crate::routes::common::{db_error, not_found};
use crate::state::{AppState, topics};

/// DELETE /api/students/{student_id}
///
/// Removes the student and, through the cascade, all of their attendance.
pub async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Response {
    match student::Model::delete_by_id(state.db(), student_id).await {
        Ok(true) => {
            let payload = json!({ "student_id": student_id });
            state
                .notify(topics::STUDENTS, "student.deleted", &payload)
                .await;
            state
                .notify(topics::ATTENDANCE, "attendance.removed", &payload)
                .await;
            (
                StatusCode::OK,
                Json(ApiResponse::success((), "Student deleted")),
            )
                .into_response()
        }
        Ok(false) => not_found(format!("Student {student_id} not found")),
        Err(e) => db_error("Failed to delete student", e),
    }
}
