//! Application state shared by every route handler.
//!
//! Holds the database connection, the change-feed manager, the lateness
//! policy used by both scanning and statistics, and the list caches.

use std::future::Future;
use std::sync::Arc;

use db::LatenessPolicy;
use db::error::is_transient;
use db::models::{class_session, student};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use util::cache::ReadThroughCache;
use util::retry::{RetryPolicy, retry_read};
use util::ws::{WebSocketManager, emit};

/// Change-feed topics, one per table.
pub mod topics {
    pub const STUDENTS: &str = "students";
    pub const CLASSES: &str = "classes";
    pub const ATTENDANCE: &str = "attendance";

    pub const ALL: [&str; 3] = [STUDENTS, CLASSES, ATTENDANCE];
}

#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    ws: WebSocketManager,
    policy: LatenessPolicy,
    retry: RetryPolicy,
    students: ReadThroughCache<Vec<student::Model>>,
    classes: ReadThroughCache<Vec<class_session::Model>>,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        ws: WebSocketManager,
        policy: LatenessPolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            db,
            ws,
            policy,
            retry,
            students: ReadThroughCache::new(),
            classes: ReadThroughCache::new(),
        }
    }

    /// State with the lateness and retry policies taken from configuration.
    pub fn from_config(db: DatabaseConnection, ws: WebSocketManager) -> Self {
        Self::new(db, ws, LatenessPolicy::from_config(), RetryPolicy::from_config())
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn ws(&self) -> &WebSocketManager {
        &self.ws
    }

    pub fn ws_clone(&self) -> WebSocketManager {
        self.ws.clone()
    }

    pub fn policy(&self) -> &LatenessPolicy {
        &self.policy
    }

    /// Runs an idempotent read with bounded retry on connection failures.
    pub async fn read<T, F, Fut>(&self, op: F) -> Result<T, DbErr>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DbErr>>,
    {
        retry_read(self.retry, is_transient, op).await
    }

    /// Every student, served from cache until the next student change.
    pub async fn students(&self) -> Result<Arc<Vec<student::Model>>, DbErr> {
        let db = &self.db;
        self.students
            .get_or_load(|| self.read(|| student::Model::all(db)))
            .await
    }

    /// Every class, served from cache until the next class change.
    pub async fn classes(&self) -> Result<Arc<Vec<class_session::Model>>, DbErr> {
        let db = &self.db;
        self.classes
            .get_or_load(|| self.read(|| class_session::Model::all(db)))
            .await
    }

    /// Invalidates whatever is cached for `topic`, then publishes the change.
    pub async fn notify<T: Serialize>(&self, topic: &str, event: &str, payload: &T) {
        match topic {
            topics::STUDENTS => self.students.invalidate().await,
            topics::CLASSES => self.classes.invalidate().await,
            _ => {}
        }
        emit(&self.ws, topic, event, payload).await;
    }
}
