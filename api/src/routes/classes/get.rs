use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use db::analytics;
use db::models::{attendance_record, class_session};
use serde::Deserialize;
use validator::Validate;

use super::common::ClassResponse;
use crate::response::ApiResponse;
use crate::routes::common::{
    DEFAULT_PER_PAGE, Page, db_error, error_response, not_found, page_of, validation_error,
};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ListClassesQuery {
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u64>,
    /// Partial match on class name.
    pub q: Option<String>,
    /// Inclusive lower bound on the class date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the class date.
    pub to: Option<NaiveDate>,
    /// `date` | `name` | `created_at`, `-` for descending. Default is most recent first.
    pub sort: Option<String>,
}

/// GET /api/classes
///
/// Paginated class list. Unfiltered, default-sorted requests come from the cache.
///
/// - `200 OK` with `{ items, page, per_page, total }`
/// - `400 Bad Request` for bad paging or `from` after `to`
pub async fn list_classes(
    State(state): State<AppState>,
    Query(query): Query<ListClassesQuery>,
) -> Response {
    if let Err(e) = query.validate() {
        return validation_error(&e);
    }
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error("`from` must not be after `to`")),
            )
                .into_response();
        }
    }

    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);
    let q = ::common::non_blank(query.q.as_deref());
    let unfiltered = q.is_none() && query.from.is_none() && query.to.is_none();

    let body: Page<ClassResponse> = if unfiltered && query.sort.is_none() {
        match state.classes().await {
            Ok(all) => page_of(all.as_slice(), page, per_page, |c| ClassResponse::from(c)),
            Err(e) => return db_error("Failed to load classes", e),
        }
    } else {
        let filter = class_session::ClassQuery {
            q,
            from: query.from,
            to: query.to,
            sort: query.sort.clone(),
            page,
            per_page,
        };
        let db = state.db();
        let filter = &filter;
        match state.read(|| class_session::Model::list(db, filter)).await {
            Ok((rows, total)) => Page {
                items: rows.iter().map(ClassResponse::from).collect(),
                page,
                per_page,
                total,
            },
            Err(e) => return db_error("Failed to list classes", e),
        }
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(body, "Classes retrieved")),
    )
        .into_response()
}

/// GET /api/classes/{class_id}
pub async fn get_class(State(state): State<AppState>, Path(class_id): Path<i64>) -> Response {
    let db = state.db();
    match state.read(|| class_session::Model::find_by_id(db, class_id)).await {
        Ok(Some(c)) => (
            StatusCode::OK,
            Json(ApiResponse::success(ClassResponse::from(c), "Class retrieved")),
        )
            .into_response(),
        Ok(None) => not_found(format!("Class {class_id} not found")),
        Err(e) => db_error("Failed to load class", e),
    }
}

async fn load_rows(
    state: &AppState,
    class_id: i64,
) -> Result<Vec<attendance_record::ClassAttendanceRow>, Response> {
    let db = state.db();
    match state.read(|| class_session::Model::find_by_id(db, class_id)).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(not_found(format!("Class {class_id} not found"))),
        Err(e) => return Err(db_error("Failed to load class", e)),
    }
    state
        .read(|| attendance_record::Model::records_for_class(db, class_id))
        .await
        .map_err(|e| db_error("Failed to load attendance records", e))
}

/// GET /api/classes/{class_id}/records
///
/// Records in arrival order, each with the student's code and names.
pub async fn get_class_records(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Response {
    match load_rows(&state, class_id).await {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(rows, "Attendance records retrieved")),
        )
            .into_response(),
        Err(resp) => resp,
    }
}

/// GET /api/classes/{class_id}/records/export
///
/// `text/csv` attachment with columns
/// `class_id,student_code,first_name,last_name,status,marked_at`.
pub async fn export_class_records_csv(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Response {
    let rows = match load_rows(&state, class_id).await {
        Ok(rows) => rows,
        Err(resp) => return resp,
    };

    let csv = attendance_record::to_csv(&rows);
    let filename = format!("attendance_class_{class_id}.csv");

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .unwrap_or(HeaderValue::from_static("attachment")),
    );

    (StatusCode::OK, headers, csv).into_response()
}

/// GET /api/classes/{class_id}/stats
///
/// Attendance count, punctuality, absences and rate for one class.
pub async fn get_class_stats(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Response {
    match analytics::load_class_stats(state.db(), state.policy(), class_id, Utc::now()).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(ApiResponse::success(stats, "Class statistics computed")),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
