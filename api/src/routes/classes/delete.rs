use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::class_session;
use serde_json::json;

use crate::response::ApiResponse;
use crate::routes::common::{db_error, not_found};
use crate::state::{AppState, topics};

/// DELETE /api/classes/{class_id}
///
/// Removes the class and, through the cascade, its attendance records.
pub async fn delete_class(State(state): State<AppState>, Path(class_id): Path<i64>) -> Response {
    match class_session::Model::delete_by_id(state.db(), class_id).await {
        Ok(true) => {
            let payload = json!({ "class_id": class_id });
            state
                .notify(topics::CLASSES, "class.deleted", &payload)
                .await;
            state
                .notify(topics::ATTENDANCE, "attendance.removed", &payload)
                .await;
            (
                StatusCode::OK,
                Json(ApiResponse::success((), "Class deleted")),
            )
                .into_response()
        }
        Ok(false) => not_found(format!("Class {class_id} not found")),
        Err(e) => db_error("Failed to delete class", e),
    }
}
