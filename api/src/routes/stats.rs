use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use db::analytics;

use crate::response::ApiResponse;
use crate::routes::common::db_error;
use crate::state::AppState;

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/", get(get_summary))
}

/// GET /api/stats
///
/// Totals across every class plus per-class statistics, recomputed on each call.
async fn get_summary(State(state): State<AppState>) -> Response {
    let db = state.db();
    let policy = state.policy();
    let now = Utc::now();

    match state
        .read(|| analytics::load_summary(db, policy, now))
        .await
    {
        Ok(summary) => (
            StatusCode::OK,
            Json(ApiResponse::success(summary, "Attendance summary computed")),
        )
            .into_response(),
        Err(e) => db_error("Failed to compute attendance summary", e),
    }
}
