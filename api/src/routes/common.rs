//! Helpers shared by the route groups: error mapping, pagination and time parsing.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveTime;
use db::AttendanceError;
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::response::ApiResponse;

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;

const STORE_FAILURE: &str = "A database error occurred, please try again";

/// Maps a domain error onto status + envelope. Store failures are logged and
/// answered with a generic message.
pub fn error_response(err: AttendanceError) -> Response {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else if err.is_conflict() {
        StatusCode::CONFLICT
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    if let AttendanceError::Database(e) = &err {
        tracing::error!("Store failure: {e}");
        return (status, Json(ApiResponse::<()>::error(STORE_FAILURE))).into_response();
    }

    (status, Json(ApiResponse::<()>::error(err.to_string()))).into_response()
}

pub fn db_error(context: &str, err: DbErr) -> Response {
    tracing::error!("{context}: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error(STORE_FAILURE)),
    )
        .into_response()
}

pub fn validation_error(errors: &ValidationErrors) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(::common::format_validation_errors(
            errors,
        ))),
    )
        .into_response()
}

pub fn not_found(message: impl Into<String>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error(message)),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

/// Slices an already-sorted list into one page.
pub fn page_of<T, U>(all: &[T], page: u64, per_page: u64, map: impl Fn(&T) -> U) -> Page<U> {
    let start = page.saturating_sub(1).saturating_mul(per_page) as usize;
    let items = all
        .iter()
        .skip(start)
        .take(per_page as usize)
        .map(map)
        .collect();
    Page {
        items,
        page,
        per_page,
        total: all.len() as u64,
    }
}

/// Body of both scan endpoints.
#[derive(Debug, Deserialize, Validate)]
pub struct PayloadReq {
    #[validate(length(min = 1, message = "Payload is required"))]
    pub payload: String,
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_class_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_past_the_end_are_empty() {
        let all = [1, 2, 3, 4, 5];
        let p = page_of(&all, 2, 2, |n| n * 10);
        assert_eq!(p.items, vec![30, 40]);
        assert_eq!(p.total, 5);
        assert!(page_of(&all, 4, 2, |n| *n).items.is_empty());
    }

    #[test]
    fn class_times() {
        assert_eq!(parse_class_time("09:00"), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(parse_class_time("14:30:15"), NaiveTime::from_hms_opt(14, 30, 15));
        assert_eq!(parse_class_time("9am"), None);
    }
}
