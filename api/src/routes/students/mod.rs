//! `/api/students`: registration, profile edits, lookup and deletion.

use axum::{Router, routing::get};

use crate::state::AppState;

pub mod common;
pub mod delete;
pub mod get;
pub mod post;
pub mod put;

pub fn students_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_students).post(post::create_student))
        .route(
            "/{student_id}",
            get(get::get_student)
                .put(put::update_student)
                .delete(delete::delete_student),
        )
        .route("/{student_id}/records", get(get::get_student_records))
}
