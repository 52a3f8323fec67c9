//! `/api/scan`: identify what a scanned string refers to without recording anything.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use db::scan::{self, Resolved};
use serde::Serialize;
use validator::Validate;

use crate::response::ApiResponse;
use crate::routes::classes::common::ClassResponse;
use crate::routes::common::{PayloadReq, error_response, validation_error};
use crate::routes::students::common::StudentResponse;
use crate::state::AppState;

pub fn scan_routes() -> Router<AppState> {
    Router::new().route("/resolve", post(resolve_payload))
}

#[derive(Debug, Serialize)]
pub struct ResolvedResponse {
    /// `student` or `class`
    pub kind: &'static str,
    pub student: Option<StudentResponse>,
    pub class: Option<ClassResponse>,
}

impl From<Resolved> for ResolvedResponse {
    fn from(r: Resolved) -> Self {
        let kind = r.kind();
        match r {
            Resolved::Student(s) => Self {
                kind,
                student: Some(s.into()),
                class: None,
            },
            Resolved::Class(c) => Self {
                kind,
                student: None,
                class: Some(c.into()),
            },
        }
    }
}

/// POST /api/scan/resolve
///
/// - `200 OK` with `{ kind, student | class }`
/// - `400 Bad Request` when the string is not a recognised payload
/// - `404 Not Found` when it is well-formed but matches nothing
async fn resolve_payload(State(state): State<AppState>, Json(req): Json<PayloadReq>) -> Response {
    if let Err(e) = req.validate() {
        return validation_error(&e);
    }

    match scan::resolve(state.db(), &req.payload).await {
        Ok(resolved) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ResolvedResponse::from(resolved),
                "Payload resolved",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
