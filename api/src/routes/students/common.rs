use db::models::{attendance_record, student};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StudentResponse {
    pub id: i64,
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: Option<String>,
    /// String to render as the student's QR code.
    pub qr_payload: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&student::Model> for StudentResponse {
    fn from(s: &student::Model) -> Self {
        Self {
            id: s.id,
            student_code: s.student_code.clone(),
            first_name: s.first_name.clone(),
            last_name: s.last_name.clone(),
            full_name: s.full_name(),
            email: s.email.clone(),
            qr_payload: s.qr_payload.clone(),
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

impl From<student::Model> for StudentResponse {
    fn from(s: student::Model) -> Self {
        Self::from(&s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordResponse {
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub status: attendance_record::AttendanceStatus,
    pub marked_at: String,
}

impl From<attendance_record::Model> for RecordResponse {
    fn from(r: attendance_record::Model) -> Self {
        Self {
            id: r.id,
            student_id: r.student_id,
            class_id: r.class_id,
            status: r.status,
            marked_at: r.marked_at.to_rfc3339(),
        }
    }
}
