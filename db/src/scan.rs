//! Turning a raw scanned string into the student or class it names.

use sea_orm::DbConn;

use crate::error::{AttendanceError, AttendanceResult};
use crate::models::{class_session, student};
use crate::payload::ScanPayload;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Student(student::Model),
    Class(class_session::Model),
}

impl Resolved {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Student(_) => "student",
            Self::Class(_) => "class",
        }
    }
}

/// Classifies `raw` by its tag and looks it up.
///
/// Garbage is [`AttendanceError::PayloadNotRecognized`]; a well-formed payload
/// that matches nothing is [`AttendanceError::PayloadNotFound`]. Students are
/// matched on the embedded code, classes on the exact payload string.
pub async fn resolve(db: &DbConn, raw: &str) -> AttendanceResult<Resolved> {
    let payload: ScanPayload = raw.parse()?;

    let found = match &payload {
        ScanPayload::Student { code, .. } => student::Model::find_by_code(db, code)
            .await?
            .map(Resolved::Student),
        ScanPayload::Class { .. } => class_session::Model::find_by_payload(db, raw)
            .await?
            .map(Resolved::Class),
    };

    found.ok_or(AttendanceError::PayloadNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::class_session::NewClass;
    use crate::models::student::NewStudent;
    use crate::test_utils::setup_test_db;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    #[tokio::test]
    async fn resolves_both_kinds_and_reports_misses() {
        let db = setup_test_db().await;
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

        let s = student::Model::create(
            &db,
            NewStudent {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: None,
                student_code: Some("STU20240001".into()),
            },
            "STU",
            now,
        )
        .await
        .unwrap();
        let c = class_session::Model::create(
            &db,
            NewClass {
                name: "Lab A".into(),
                class_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                class_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                capacity: None,
            },
            50,
            now,
        )
        .await
        .unwrap();

        assert_eq!(resolve(&db, &s.qr_payload).await.unwrap(), Resolved::Student(s));
        let class = resolve(&db, &format!(" {} ", c.qr_payload)).await.unwrap();
        assert_eq!(class.kind(), "class");

        assert!(matches!(
            resolve(&db, "STUDENT:STU99999999:1").await,
            Err(AttendanceError::PayloadNotFound)
        ));
        assert!(matches!(
            resolve(&db, "not a code").await,
            Err(AttendanceError::PayloadNotRecognized)
        ));
    }
}
