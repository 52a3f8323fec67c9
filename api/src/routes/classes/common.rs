use db::models::{attendance_record, class_session};
use serde::Serialize;

use crate::routes::students::common::StudentResponse;

#[derive(Debug, Clone, Serialize)]
pub struct ClassResponse {
    pub id: i64,
    pub name: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub capacity: i32,
    pub qr_payload: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&class_session::Model> for ClassResponse {
    fn from(c: &class_session::Model) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            date: c.class_date.format("%Y-%m-%d").to_string(),
            time: c.class_time.format("%H:%M").to_string(),
            capacity: c.capacity,
            qr_payload: c.qr_payload.clone(),
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

impl From<class_session::Model> for ClassResponse {
    fn from(c: class_session::Model) -> Self {
        Self::from(&c)
    }
}

/// Result of `POST /classes/{class_id}/scan`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    pub record_id: i64,
    pub status: attendance_record::AttendanceStatus,
    pub marked_at: String,
    pub student: StudentResponse,
    pub class: ClassResponse,
}

impl From<attendance_record::MarkedAttendance> for ScanResponse {
    fn from(m: attendance_record::MarkedAttendance) -> Self {
        Self {
            record_id: m.record.id,
            status: m.record.status,
            marked_at: m.record.marked_at.to_rfc3339(),
            student: StudentResponse::from(m.student),
            class: ClassResponse::from(m.class),
        }
    }
}
