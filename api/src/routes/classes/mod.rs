//! `/api/classes`: class sessions, their records, statistics and scanning.

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod common;
pub mod delete;
pub mod get;
pub mod post;

pub fn classes_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_classes).post(post::create_class))
        .route(
            "/{class_id}",
            get(get::get_class).delete(delete::delete_class),
        )
        .route("/{class_id}/records", get(get::get_class_records))
        .route(
            "/{class_id}/records/export",
            get(get::export_class_records_csv),
        )
        .route("/{class_id}/stats", get(get::get_class_stats))
        .route("/{class_id}/scan", post(post::scan_into_class))
}
