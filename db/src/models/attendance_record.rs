//! Attendance records and the rule that creates them.
//!
//! A record joins one student to one class session. The pair is unique: the
//! first accepted scan decides the status and nothing ever changes it.

use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QueryOrder, SqlErr};
use serde::{Deserialize, Serialize};

use super::{class_session, student};
use crate::error::{AttendanceError, AttendanceResult};
use crate::lateness::LatenessPolicy;
use crate::payload::ScanPayload;

pub const CSV_HEADER: &str = "class_id,student_code,first_name,last_name,status,marked_at";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub status: AttendanceStatus,
    /// Arrival time used for lateness.
    pub marked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// `Absent` exists in the schema but is never written; absence is the lack of a row.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "late")]
    Late,
    #[sea_orm(string_value = "absent")]
    Absent,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::class_session::Entity",
        from = "Column::ClassId",
        to = "super::class_session::Column::Id",
        on_delete = "Cascade"
    )]
    Class,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::class_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Result of a successful scan.
#[derive(Debug, Clone, Serialize)]
pub struct MarkedAttendance {
    pub record: Model,
    pub student: student::Model,
    pub class: class_session::Model,
}

/// A class record joined with the student it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassAttendanceRow {
    pub id: i64,
    pub class_id: i64,
    pub student_id: i64,
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
    pub status: AttendanceStatus,
    pub marked_at: DateTime<Utc>,
}

impl Model {
    /// Records that the student with `student_code` attended `class_id` at `now`.
    ///
    /// Lookups run first: an unknown class is [`AttendanceError::ClassNotFound`],
    /// an unknown student [`AttendanceError::StudentNotFound`]. An existing record
    /// for the pair is [`AttendanceError::AlreadyRecorded`] and nothing is written.
    /// Otherwise exactly one insert is attempted; if a concurrent scan won the
    /// race the unique index rejects it and the result is also `AlreadyRecorded`.
    pub async fn mark(
        db: &DbConn,
        policy: &LatenessPolicy,
        class_id: i64,
        student_code: &str,
        now: DateTime<Utc>,
    ) -> AttendanceResult<MarkedAttendance> {
        let class = class_session::Model::find_by_id(db, class_id)
            .await?
            .ok_or(AttendanceError::ClassNotFound(class_id))?;

        let student = student::Model::find_by_code(db, student_code)
            .await?
            .ok_or_else(|| AttendanceError::StudentNotFound(student_code.trim().to_owned()))?;

        if Self::find_pair(db, student.id, class.id).await?.is_some() {
            return Err(AttendanceError::AlreadyRecorded {
                student_id: student.id,
                class_id: class.id,
            });
        }

        let status = policy.classify(policy.start_of(&class), now);
        let record = Self::insert_once(db, &student, &class, status, now).await?;

        tracing::info!(
            class_id = class.id,
            student_code = %student.student_code,
            status = %record.status,
            "Attendance recorded"
        );

        Ok(MarkedAttendance {
            record,
            student,
            class,
        })
    }

    /// Decodes a scanned string and marks the student it names.
    pub async fn mark_from_payload(
        db: &DbConn,
        policy: &LatenessPolicy,
        class_id: i64,
        raw_payload: &str,
        now: DateTime<Utc>,
    ) -> AttendanceResult<MarkedAttendance> {
        let payload: ScanPayload = raw_payload.parse()?;
        match payload.student_code() {
            Some(code) => Self::mark(db, policy, class_id, code, now).await,
            None => Err(AttendanceError::WrongPayloadKind {
                expected: "student",
                found: payload.kind(),
            }),
        }
    }

    async fn insert_once(
        db: &DbConn,
        student: &student::Model,
        class: &class_session::Model,
        status: AttendanceStatus,
        now: DateTime<Utc>,
    ) -> AttendanceResult<Model> {
        let active_model = ActiveModel {
            student_id: Set(student.id),
            class_id: Set(class.id),
            status: Set(status),
            marked_at: Set(now),
            created_at: Set(now),
            ..Default::default()
        };

        match active_model.insert(db).await {
            Ok(record) => Ok(record),
            Err(err) => Err(Self::classify_insert_err(db, err, student, class).await),
        }
    }

    async fn classify_insert_err(
        db: &DbConn,
        err: DbErr,
        student: &student::Model,
        class: &class_session::Model,
    ) -> AttendanceError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(cols)) if cols.contains("attendance_records") => {
                AttendanceError::AlreadyRecorded {
                    student_id: student.id,
                    class_id: class.id,
                }
            }
            // A parent vanished between lookup and insert.
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                match class_session::Model::find_by_id(db, class.id).await {
                    Ok(None) => AttendanceError::ClassNotFound(class.id),
                    Ok(Some(_)) => AttendanceError::StudentNotFound(student.student_code.clone()),
                    Err(_) => AttendanceError::Database(err),
                }
            }
            _ => AttendanceError::Database(err),
        }
    }

    pub async fn find_pair(
        db: &DbConn,
        student_id: i64,
        class_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::ClassId.eq(class_id))
            .one(db)
            .await
    }

    pub async fn count_for_class(db: &DbConn, class_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .count(db)
            .await
    }

    pub async fn all(db: &DbConn) -> Result<Vec<Model>, DbErr> {
        Entity::find().order_by_asc(Column::MarkedAt).all(db).await
    }

    pub async fn find_by_class(db: &DbConn, class_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::MarkedAt)
            .all(db)
            .await
    }

    /// Records for a class in arrival order, with student details.
    pub async fn records_for_class(
        db: &DbConn,
        class_id: i64,
    ) -> Result<Vec<ClassAttendanceRow>, DbErr> {
        let rows = Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::MarkedAt)
            .find_also_related(student::Entity)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(record, student)| {
                let student = student?;
                Some(ClassAttendanceRow {
                    id: record.id,
                    class_id: record.class_id,
                    student_id: record.student_id,
                    student_code: student.student_code,
                    first_name: student.first_name,
                    last_name: student.last_name,
                    status: record.status,
                    marked_at: record.marked_at,
                })
            })
            .collect())
    }

    /// A student's records, most recent first.
    pub async fn records_for_student(db: &DbConn, student_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::MarkedAt)
            .all(db)
            .await
    }
}

/// Renders class records as CSV with a header row.
pub fn to_csv(rows: &[ClassAttendanceRow]) -> String {
    fn esc(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }

    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for r in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            r.class_id,
            esc(&r.student_code),
            esc(&r.first_name),
            esc(&r.last_name),
            r.status,
            r.marked_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::class_session::NewClass;
    use crate::models::student::NewStudent;
    use crate::test_utils::setup_test_db;
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    async fn seed(db: &DbConn) -> (student::Model, student::Model, class_session::Model) {
        let created = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let mut students = Vec::new();
        for (code, first) in [("STU20240001", "Ada"), ("STU20240002", "Alan")] {
            let s = student::Model::create(
                db,
                NewStudent {
                    first_name: first.into(),
                    last_name: "Test".into(),
                    email: None,
                    student_code: Some(code.into()),
                },
                "STU",
                created,
            )
            .await
            .unwrap();
            students.push(s);
        }
        let class = class_session::Model::create(
            db,
            NewClass {
                name: "Lab A".into(),
                class_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                class_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                capacity: None,
            },
            50,
            created,
        )
        .await
        .unwrap();
        let second = students.pop().unwrap();
        let first = students.pop().unwrap();
        (first, second, class)
    }

    #[tokio::test]
    async fn scan_scenario_present_duplicate_late() {
        let db = setup_test_db().await;
        let (_, _, class) = seed(&db).await;
        let policy = LatenessPolicy::new(15);

        let first = Model::mark(&db, &policy, class.id, "STU20240001", at(9, 5, 0))
            .await
            .unwrap();
        assert_eq!(first.record.status, AttendanceStatus::Present);
        assert_eq!(first.record.marked_at, at(9, 5, 0));

        let again = Model::mark(&db, &policy, class.id, "STU20240001", at(9, 6, 0)).await;
        assert!(matches!(again, Err(AttendanceError::AlreadyRecorded { .. })));
        assert_eq!(Model::count_for_class(&db, class.id).await.unwrap(), 1);

        let late = Model::mark(&db, &policy, class.id, "STU20240002", at(9, 20, 0))
            .await
            .unwrap();
        assert_eq!(late.record.status, AttendanceStatus::Late);
        assert_eq!(Model::count_for_class(&db, class.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn boundary_scan_is_present() {
        let db = setup_test_db().await;
        let (_, _, class) = seed(&db).await;
        let marked = Model::mark(&db, &LatenessPolicy::new(15), class.id, "STU20240001", at(9, 15, 0))
            .await
            .unwrap();
        assert_eq!(marked.record.status, AttendanceStatus::Present);
    }

    #[tokio::test]
    async fn lookup_misses_are_distinct() {
        let db = setup_test_db().await;
        let (_, _, class) = seed(&db).await;
        let policy = LatenessPolicy::default();

        let err = Model::mark(&db, &policy, 9999, "STU20240001", at(9, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::ClassNotFound(9999)));

        let err = Model::mark(&db, &policy, class.id, "NOPE", at(9, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::StudentNotFound(ref c) if c == "NOPE"));
        assert!(Model::all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unique_index_rejection_is_already_recorded() {
        let db = setup_test_db().await;
        let (ada, _, class) = seed(&db).await;

        Model::insert_once(&db, &ada, &class, AttendanceStatus::Present, at(9, 1, 0))
            .await
            .unwrap();
        // Skips the pre-check, as a concurrent scan would.
        let err = Model::insert_once(&db, &ada, &class, AttendanceStatus::Present, at(9, 1, 0))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AttendanceError::AlreadyRecorded { student_id, class_id }
                if student_id == ada.id && class_id == class.id),
            "{err:?}"
        );
        assert_eq!(Model::count_for_class(&db, class.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn vanished_class_is_not_found_not_conflict() {
        let db = setup_test_db().await;
        let (ada, _, class) = seed(&db).await;
        class_session::Model::delete_by_id(&db, class.id).await.unwrap();

        let err = Model::insert_once(&db, &ada, &class, AttendanceStatus::Present, at(9, 1, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::ClassNotFound(_)), "{err:?}");
    }

    #[tokio::test]
    async fn payload_scans_require_a_student_code() {
        let db = setup_test_db().await;
        let (ada, _, class) = seed(&db).await;
        let policy = LatenessPolicy::default();

        let marked = Model::mark_from_payload(&db, &policy, class.id, &ada.qr_payload, at(9, 2, 0))
            .await
            .unwrap();
        assert_eq!(marked.student.id, ada.id);

        let err = Model::mark_from_payload(&db, &policy, class.id, &class.qr_payload, at(9, 2, 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AttendanceError::WrongPayloadKind {
                expected: "student",
                found: "class"
            }
        ));

        let err = Model::mark_from_payload(&db, &policy, class.id, "hello", at(9, 2, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::PayloadNotRecognized));
    }

    #[tokio::test]
    async fn deleting_either_parent_cascades() {
        let db = setup_test_db().await;
        let (ada, alan, class) = seed(&db).await;
        let policy = LatenessPolicy::default();
        Model::mark(&db, &policy, class.id, &ada.student_code, at(9, 1, 0)).await.unwrap();
        Model::mark(&db, &policy, class.id, &alan.student_code, at(9, 2, 0)).await.unwrap();

        student::Model::delete_by_id(&db, ada.id).await.unwrap();
        assert!(Model::records_for_student(&db, ada.id).await.unwrap().is_empty());
        assert_eq!(Model::count_for_class(&db, class.id).await.unwrap(), 1);

        class_session::Model::delete_by_id(&db, class.id).await.unwrap();
        assert!(Model::all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn class_rows_join_students_and_export_as_csv() {
        let db = setup_test_db().await;
        let (ada, alan, class) = seed(&db).await;
        let policy = LatenessPolicy::default();
        Model::mark(&db, &policy, class.id, &alan.student_code, at(9, 30, 0)).await.unwrap();
        Model::mark(&db, &policy, class.id, &ada.student_code, at(8, 59, 0)).await.unwrap();

        let rows = Model::records_for_class(&db, class.id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].student_code, "STU20240001");
        assert_eq!(rows[1].status, AttendanceStatus::Late);

        let csv = to_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            format!("{},STU20240001,Ada,Test,present,2024-03-01T08:59:00Z", class.id)
        );
        assert!(lines[2].ends_with(",late,2024-03-01T09:30:00Z"));
    }

    #[test]
    fn csv_escapes_commas_and_quotes() {
        let row = ClassAttendanceRow {
            id: 1,
            class_id: 7,
            student_id: 3,
            student_code: "S1".into(),
            first_name: "Mary, Jr".into(),
            last_name: "O\"Neil".into(),
            status: AttendanceStatus::Present,
            marked_at: at(9, 0, 0),
        };
        let csv = to_csv(&[row]);
        assert!(csv.contains("\"Mary, Jr\",\"O\"\"Neil\""));
    }

    #[test]
    fn status_text_matches_stored_values() {
        assert_eq!(AttendanceStatus::Present.to_string(), "present");
        assert_eq!(AttendanceStatus::Late.to_string(), "late");
        assert_eq!(AttendanceStatus::Absent.to_string(), "absent");
        assert_eq!("LATE".parse::<AttendanceStatus>(), Ok(AttendanceStatus::Late));
        assert!("tardy".parse::<AttendanceStatus>().is_err());
    }
}
