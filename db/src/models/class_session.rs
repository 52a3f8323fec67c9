//! Entity and business logic for scheduled class sessions.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, PaginatorTrait, QueryOrder};
use serde::Serialize;

use crate::error::{AttendanceError, AttendanceResult, unique_violation};
use crate::models::student::clean_name;
use crate::payload::ScanPayload;

/// A class session students are scanned into.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub class_date: NaiveDate,
    /// Start time on the class wall clock, truncated to the minute.
    pub class_time: NaiveTime,
    /// Advisory only. Nothing stops a scan once it is reached.
    pub capacity: i32,
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

#[derive(Debug, Clone)]
pub struct NewClass {
    pub name: String,
    pub class_date: NaiveDate,
    pub class_time: NaiveTime,
    /// Falls back to the configured default when `None`.
    pub capacity: Option<i32>,
}

/// Filters for [`Model::list`].
#[derive(Debug, Clone, Default)]
pub struct ClassQuery {
    /// Match on class name.
    pub q: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// `date` | `name` | `created_at`, `-` prefix for descending. Default `-date`.
    pub sort: Option<String>,
    pub page: u64,
    pub per_page: u64,
}

fn map_write_err(err: DbErr) -> AttendanceError {
    match unique_violation(&err) {
        Some(cols) if cols.contains("classes.qr_payload") => AttendanceError::DuplicatePayload,
        _ => AttendanceError::Database(err),
    }
}

impl Model {
    /// Creates a class session and its scan payload.
    pub async fn create(
        db: &DbConn,
        input: NewClass,
        default_capacity: i32,
        now: DateTime<Utc>,
    ) -> AttendanceResult<Model> {
        let name = clean_name("Class name", &input.name)?;
        let capacity = input.capacity.unwrap_or(default_capacity);
        if capacity < 1 {
            return Err(AttendanceError::Validation(
                "Capacity must be at least 1".into(),
            ));
        }
        let class_time = input
            .class_time
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(input.class_time);

        let qr_payload = ScanPayload::class(&name, input.class_date, class_time, now).to_string();

        let active_model = ActiveModel {
            name: Set(name),
            class_date: Set(input.class_date),
            class_time: Set(class_time),
            capacity: Set(capacity),
            qr_payload: Set(qr_payload),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let class = active_model.insert(db).await.map_err(map_write_err)?;
        tracing::info!(class_id = class.id, name = %class.name, "Created class");
        Ok(class)
    }

    pub async fn find_by_id(db: &DbConn, id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_payload(db: &DbConn, payload: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::QrPayload.eq(payload.trim()))
            .one(db)
            .await
    }

    /// Every class, most recent first.
    pub async fn all(db: &DbConn) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .order_by_desc(Column::ClassDate)
            .order_by_desc(Column::ClassTime)
            .all(db)
            .await
    }

    pub async fn count(db: &DbConn) -> Result<u64, DbErr> {
        Entity::find().count(db).await
    }

    pub async fn list(db: &DbConn, query: &ClassQuery) -> Result<(Vec<Model>, u64), DbErr> {
        let mut cond = Condition::all();
        if let Some(q) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            cond = cond.add(Column::Name.contains(q));
        }
        if let Some(from) = query.from {
            cond = cond.add(Column::ClassDate.gte(from));
        }
        if let Some(to) = query.to {
            cond = cond.add(Column::ClassDate.lte(to));
        }
        let mut sel = Entity::find().filter(cond);

        sel = match query.sort.as_deref() {
            Some("date") => sel
                .order_by_asc(Column::ClassDate)
                .order_by_asc(Column::ClassTime),
            Some("name") => sel.order_by_asc(Column::Name),
            Some("-name") => sel.order_by_desc(Column::Name),
            Some("created_at") => sel.order_by_asc(Column::CreatedAt),
            Some("-created_at") => sel.order_by_desc(Column::CreatedAt),
            _ => sel
                .order_by_desc(Column::ClassDate)
                .order_by_desc(Column::ClassTime),
        };

        let paginator = sel.paginate(db, query.per_page.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(query.page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    /// Deletes a class; its attendance records go with it (FK cascade).
    pub async fn delete_by_id(db: &DbConn, id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(id).exec(db).await?;
        if res.rows_affected > 0 {
            tracing::info!(class_id = id, "Deleted class");
        }
        Ok(res.rows_affected > 0)
    }
}
