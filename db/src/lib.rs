pub mod analytics;
pub mod codes;
pub mod error;
pub mod lateness;
pub mod models;
pub mod payload;
pub mod scan;
pub mod test_utils;

pub use error::{AttendanceError, AttendanceResult};
pub use lateness::LatenessPolicy;

use sea_orm::{Database, DatabaseConnection, DbErr};
use std::path::Path;
use util::config;

/// Connects using `DATABASE_PATH`, creating the parent directory of a file path.
pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    Database::connect(&database_url(&config::database_path())).await
}

/// A value that is already a DSN is used as-is; anything else is a SQLite file path.
pub fn database_url(path_or_url: &str) -> String {
    if path_or_url.starts_with("sqlite:") {
        return path_or_url.to_string();
    }
    if let Some(parent) = Path::new(path_or_url).parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("Could not create {}: {e}", parent.display());
        }
    }
    format!("sqlite://{path_or_url}?mode=rwc")
}
