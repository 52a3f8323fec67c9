//! Entity and business logic for registered students.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, PaginatorTrait, QueryOrder};
use serde::Serialize;

use crate::codes::{generate_student_code, validate_student_code};
use crate::error::{AttendanceError, AttendanceResult, unique_violation};
use crate::payload::ScanPayload;

pub const MAX_NAME_LEN: usize = 100;

/// A student who can be scanned into classes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Externally meaningful code, e.g. `STU20240001`. Unique and immutable.
    #[sea_orm(unique)]
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
    /// Unique when present.
    #[sea_orm(unique)]
    pub email: Option<String>,
    /// String encoded into the student's QR code. Unique and immutable.
    #[sea_orm(unique)]
    pub qr_payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    AttendanceRecords,
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Registration input. A missing `student_code` is generated.
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub student_code: Option<String>,
}

/// Filters for [`Model::list`].
#[derive(Debug, Clone, Default)]
pub struct StudentQuery {
    /// Case-insensitive match on code, first name, last name or email.
    pub q: Option<String>,
    /// `student_code` | `first_name` | `last_name` | `created_at`, `-` prefix for descending.
    pub sort: Option<String>,
    pub page: u64,
    pub per_page: u64,
}

pub(crate) fn clean_name(field: &str, raw: &str) -> AttendanceResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AttendanceError::Validation(format!("{field} is required")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AttendanceError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_owned())
}

fn clean_email(raw: Option<&str>) -> AttendanceResult<Option<String>> {
    match raw.map(str::trim).filter(|e| !e.is_empty()) {
        None => Ok(None),
        Some(e) if e.contains('@') && !e.starts_with('@') && !e.ends_with('@') => {
            Ok(Some(e.to_lowercase()))
        }
        Some(_) => Err(AttendanceError::Validation("Email is not valid".into())),
    }
}

fn map_write_err(err: DbErr) -> AttendanceError {
    match unique_violation(&err) {
        Some(cols) if cols.contains("students.student_code") => {
            AttendanceError::DuplicateStudentCode
        }
        Some(cols) if cols.contains("students.email") => AttendanceError::DuplicateEmail,
        Some(cols) if cols.contains("students.qr_payload") => AttendanceError::DuplicatePayload,
        _ => AttendanceError::Database(err),
    }
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Registers a student, generating a code with `code_prefix` if none was given.
    ///
    /// All validation happens before the store is touched. A code collision is
    /// reported as [`AttendanceError::DuplicateStudentCode`]; nothing is retried.
    pub async fn create(
        db: &DbConn,
        input: NewStudent,
        code_prefix: &str,
        now: DateTime<Utc>,
    ) -> AttendanceResult<Model> {
        let first_name = clean_name("First name", &input.first_name)?;
        let last_name = clean_name("Last name", &input.last_name)?;
        let email = clean_email(input.email.as_deref())?;
        let student_code = match input.student_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => validate_student_code(code)?,
            _ => validate_student_code(&generate_student_code(code_prefix, now))?,
        };
        let qr_payload = ScanPayload::student(&student_code, now).to_string();

        let active_model = ActiveModel {
            student_code: Set(student_code),
            first_name: Set(first_name),
            last_name: Set(last_name),
            email: Set(email),
            qr_payload: Set(qr_payload),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let student = active_model.insert(db).await.map_err(map_write_err)?;
        tracing::info!(
            student_id = student.id,
            code = %student.student_code,
            "Registered student"
        );
        Ok(student)
    }

    /// Edits names and email. Code and payload are never touched.
    pub async fn update_profile(
        db: &DbConn,
        id: i64,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
    ) -> AttendanceResult<Model> {
        let first_name = clean_name("First name", first_name)?;
        let last_name = clean_name("Last name", last_name)?;
        let email = clean_email(email)?;

        let model = Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AttendanceError::StudentNotFound(id.to_string()))?;

        let mut active_model: ActiveModel = model.into();
        active_model.first_name = Set(first_name);
        active_model.last_name = Set(last_name);
        active_model.email = Set(email);
        active_model.updated_at = Set(Utc::now());
        active_model.update(db).await.map_err(map_write_err)
    }

    pub async fn find_by_id(db: &DbConn, id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_code(db: &DbConn, code: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::StudentCode.eq(code.trim()))
            .one(db)
            .await
    }

    pub async fn find_by_payload(db: &DbConn, payload: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::QrPayload.eq(payload.trim()))
            .one(db)
            .await
    }

    /// Every student, ordered by code.
    pub async fn all(db: &DbConn) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .order_by_asc(Column::StudentCode)
            .all(db)
            .await
    }

    pub async fn count(db: &DbConn) -> Result<u64, DbErr> {
        Entity::find().count(db).await
    }

    /// Filtered, sorted page of students plus the total number of matches.
    pub async fn list(db: &DbConn, query: &StudentQuery) -> Result<(Vec<Model>, u64), DbErr> {
        let mut sel = Entity::find();

        if let Some(q) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            sel = sel.filter(
                Condition::any()
                    .add(Column::StudentCode.contains(q))
                    .add(Column::FirstName.contains(q))
                    .add(Column::LastName.contains(q))
                    .add(Column::Email.contains(q)),
            );
        }

        sel = match query.sort.as_deref() {
            Some(sort) if sort.starts_with('-') => match &sort[1..] {
                "first_name" => sel.order_by_desc(Column::FirstName),
                "last_name" => sel.order_by_desc(Column::LastName),
                "created_at" => sel.order_by_desc(Column::CreatedAt),
                _ => sel.order_by_desc(Column::StudentCode),
            },
            Some("first_name") => sel.order_by_asc(Column::FirstName),
            Some("last_name") => sel.order_by_asc(Column::LastName),
            Some("created_at") => sel.order_by_asc(Column::CreatedAt),
            _ => sel.order_by_asc(Column::StudentCode),
        };

        let paginator = sel.paginate(db, query.per_page.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(query.page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    /// Deletes a student; their attendance records go with them (FK cascade).
    ///
    /// Returns `false` if no such student existed.
    pub async fn delete_by_id(db: &DbConn, id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(id).exec(db).await?;
        if res.rows_affected > 0 {
            tracing::info!(student_id = id, "Deleted student");
        }
        Ok(res.rows_affected > 0)
    }
}
