//! HTTP route entry point for `/api/...`.
//!
//! - `/health` liveness probe
//! - `/students` student registry
//! - `/classes` class sessions, scanning, records and per-class statistics
//! - `/scan` payload resolution
//! - `/stats` cross-class summary

use axum::Router;

use crate::routes::{
    classes::classes_routes, health::health_routes, scan::scan_routes, stats::stats_routes,
    students::students_routes,
};
use crate::state::AppState;

pub mod classes;
pub mod common;
pub mod health;
pub mod scan;
pub mod stats;
pub mod students;

/// Builds the `/api` router with `AppState` applied.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/students", students_routes())
        .nest("/classes", classes_routes())
        .nest("/scan", scan_routes())
        .nest("/stats", stats_routes())
        .with_state(app_state)
}
