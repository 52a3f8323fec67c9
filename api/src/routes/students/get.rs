use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::{attendance_record, student};
use serde::Deserialize;
use validator::Validate;

use super::common::{RecordResponse, StudentResponse};
use crate::response::ApiResponse;
use crate::routes::common::{
    DEFAULT_PER_PAGE, Page, db_error, not_found, page_of, validation_error,
};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ListStudentsQuery {
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u64>,
    /// Partial match on code, names or email.
    pub q: Option<String>,
    /// `student_code` | `first_name` | `last_name` | `created_at`, `-` for descending.
    pub sort: Option<String>,
}

/// GET /api/students
///
/// Paginated student list. Without `q` or `sort` the cached full list is used.
///
/// - `200 OK` with `{ items, page, per_page, total }`
/// - `400 Bad Request` for out-of-range paging
/// - `500 Internal Server Error`
pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<ListStudentsQuery>,
) -> Response {
    if let Err(e) = query.validate() {
        return validation_error(&e);
    }
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);
    let q = ::common::non_blank(query.q.as_deref());

    let body: Page<StudentResponse> = if q.is_none() && query.sort.is_none() {
        match state.students().await {
            Ok(all) => page_of(all.as_slice(), page, per_page, |s| StudentResponse::from(s)),
            Err(e) => return db_error("Failed to load students", e),
        }
    } else {
        let filter = student::StudentQuery {
            q,
            sort: query.sort.clone(),
            page,
            per_page,
        };
        let db = state.db();
        let filter = &filter;
        match state.read(|| student::Model::list(db, filter)).await {
            Ok((rows, total)) => Page {
                items: rows.iter().map(StudentResponse::from).collect(),
                page,
                per_page,
                total,
            },
            Err(e) => return db_error("Failed to list students", e),
        }
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(body, "Students retrieved")),
    )
        .into_response()
}

/// GET /api/students/{student_id}
pub async fn get_student(State(state): State<AppState>, Path(student_id): Path<i64>) -> Response {
    let db = state.db();
    match state.read(|| student::Model::find_by_id(db, student_id)).await {
        Ok(Some(s)) => (
            StatusCode::OK,
            Json(ApiResponse::success(StudentResponse::from(s), "Student retrieved")),
        )
            .into_response(),
        Ok(None) => not_found(format!("Student {student_id} not found")),
        Err(e) => db_error("Failed to load student", e),
    }
}

/// GET /api/students/{student_id}/records
///
/// The student's attendance, most recent first.
pub async fn get_student_records(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Response {
    let db = state.db();
    match state.read(|| student::Model::find_by_id(db, student_id)).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(format!("Student {student_id} not found")),
        Err(e) => return db_error("Failed to load student", e),
    }

    match state
        .read(|| attendance_record::Model::records_for_student(db, student_id))
        .await
    {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                rows.into_iter().map(RecordResponse::from).collect::<Vec<_>>(),
                "Attendance records retrieved",
            )),
        )
            .into_response(),
        Err(e) => db_error("Failed to load attendance records", e),
    }
}
