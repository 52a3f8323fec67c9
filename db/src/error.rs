//! Error taxonomy for student, class and attendance operations.
//!
//! Callers branch on the variant: validation problems are reported before the
//! store is touched, conflicts and lookup misses are user-facing, and
//! `Database` is the only infrastructure failure.

use sea_orm::{DbErr, SqlErr};

use crate::payload::PayloadError;

pub type AttendanceResult<T> = Result<T, AttendanceError>;

#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Scan payload not recognized")]
    PayloadNotRecognized,

    #[error("Expected a {expected} code but scanned a {found} code")]
    WrongPayloadKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("A student with this code already exists")]
    DuplicateStudentCode,

    #[error("A student with this email already exists")]
    DuplicateEmail,

    #[error("A record with this scan payload already exists")]
    DuplicatePayload,

    #[error("Attendance already recorded for this student in this class")]
    AlreadyRecorded { student_id: i64, class_id: i64 },

    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("Class not found: {0}")]
    ClassNotFound(i64),

    #[error("No student or class matches this scan payload")]
    PayloadNotFound,

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl AttendanceError {
    /// True for the "already exists / already recorded" family.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateStudentCode
                | Self::DuplicateEmail
                | Self::DuplicatePayload
                | Self::AlreadyRecorded { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::StudentNotFound(_) | Self::ClassNotFound(_) | Self::PayloadNotFound
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::PayloadNotRecognized | Self::WrongPayloadKind { .. }
        )
    }
}

impl From<PayloadError> for AttendanceError {
    fn from(_: PayloadError) -> Self {
        Self::PayloadNotRecognized
    }
}

/// Returns the violated `table.column` list if `err` is a unique-constraint
/// violation, e.g. `"students.student_code"`.
pub fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => Some(msg),
        _ => None,
    }
}

/// Connection-class failures that are worth retrying for reads.
pub fn is_transient(err: &DbErr) -> bool {
    matches!(err, DbErr::ConnectionAcquire(_) | DbErr::Conn(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_variants() {
        assert!(AttendanceError::DuplicateStudentCode.is_conflict());
        assert!(
            AttendanceError::AlreadyRecorded {
                student_id: 1,
                class_id: 2
            }
            .is_conflict()
        );
        assert!(AttendanceError::ClassNotFound(3).is_not_found());
        assert!(AttendanceError::PayloadNotFound.is_not_found());
        assert!(AttendanceError::PayloadNotRecognized.is_validation());

        let transport = AttendanceError::Database(DbErr::Custom("disk I/O error".into()));
        assert!(!transport.is_conflict());
        assert!(!transport.is_not_found());
    }

    #[test]
    fn custom_errors_are_not_unique_violations() {
        assert_eq!(unique_violation(&DbErr::Custom("boom".into())), None);
        assert!(!is_transient(&DbErr::Custom("boom".into())));
    }
}
