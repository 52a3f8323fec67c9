//! Read-only attendance statistics.
//!
//! Everything here is recomputed from the rows on each call. The loaders issue
//! a handful of queries and hand the rows to the pure functions below.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{DbConn, DbErr};
use serde::Serialize;

use crate::error::{AttendanceError, AttendanceResult};
use crate::lateness::LatenessPolicy;
use crate::models::{attendance_record, class_session, student};

pub const ON_TIME_LABEL: &str = "On time";
/// Shown when a class has no records to average.
pub const NO_ARRIVALS_LABEL: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassStats {
    pub class_id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub capacity: i32,
    pub attendance_count: u64,
    pub on_time_count: u64,
    pub late_count: u64,
    /// Registered students without a record, once the class has started.
    pub absent_count: u64,
    /// Percentage of all registered students, one decimal.
    pub attendance_rate: f64,
    pub average_arrival: String,
    /// Label only; capacity is never enforced.
    pub is_full: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub total_students: u64,
    pub total_classes: u64,
    pub total_attendance: u64,
    pub total_late: u64,
    /// Unweighted mean of the per-class rates.
    pub average_attendance_rate: f64,
    pub classes: Vec<ClassStats>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `count / total_students * 100`, or 0 when nobody is registered.
pub fn attendance_rate(count: u64, total_students: u64) -> f64 {
    if total_students == 0 {
        return 0.0;
    }
    round1(count as f64 / total_students as f64 * 100.0)
}

/// `"On time"` for a non-positive mean offset, otherwise `"+Nm"` in whole
/// minutes (never below `+1m`).
pub fn format_arrival(mean_minutes: Option<f64>) -> String {
    match mean_minutes {
        None => NO_ARRIVALS_LABEL.to_string(),
        Some(m) if m <= 0.0 => ON_TIME_LABEL.to_string(),
        Some(m) => format!("+{:.0}m", m.round().max(1.0)),
    }
}

/// Statistics for one class given the records that belong to it.
pub fn class_stats(
    policy: &LatenessPolicy,
    class: &class_session::Model,
    records: &[&attendance_record::Model],
    total_students: u64,
    now: DateTime<Utc>,
) -> ClassStats {
    let start = policy.start_of(class);
    let attendance_count = records.len() as u64;

    let late_count = records
        .iter()
        .filter(|r| policy.is_late(start, r.marked_at))
        .count() as u64;

    let mean_minutes = if records.is_empty() {
        None
    } else {
        let total_secs: i64 = records
            .iter()
            .map(|r| policy.elapsed(start, r.marked_at).num_seconds())
            .sum();
        Some(total_secs as f64 / records.len() as f64 / 60.0)
    };

    let absent_count = if now >= start {
        total_students.saturating_sub(attendance_count)
    } else {
        0
    };

    ClassStats {
        class_id: class.id,
        name: class.name.clone(),
        date: class.class_date,
        time: class.class_time,
        capacity: class.capacity,
        attendance_count,
        on_time_count: attendance_count - late_count,
        late_count,
        absent_count,
        attendance_rate: attendance_rate(attendance_count, total_students),
        average_arrival: format_arrival(mean_minutes),
        is_full: attendance_count >= class.capacity.max(0) as u64,
    }
}

/// Per-class statistics plus cross-class totals, in the order `classes` is given.
pub fn summarize(
    policy: &LatenessPolicy,
    classes: &[class_session::Model],
    records: &[attendance_record::Model],
    total_students: u64,
    now: DateTime<Utc>,
) -> AttendanceSummary {
    let mut by_class: HashMap<i64, Vec<&attendance_record::Model>> = HashMap::new();
    for r in records {
        by_class.entry(r.class_id).or_default().push(r);
    }

    let stats: Vec<ClassStats> = classes
        .iter()
        .map(|c| {
            let rows = by_class.get(&c.id).map(Vec::as_slice).unwrap_or(&[]);
            class_stats(policy, c, rows, total_students, now)
        })
        .collect();

    let average_attendance_rate = if stats.is_empty() {
        0.0
    } else {
        round1(stats.iter().map(|s| s.attendance_rate).sum::<f64>() / stats.len() as f64)
    };

    AttendanceSummary {
        total_students,
        total_classes: stats.len() as u64,
        total_attendance: stats.iter().map(|s| s.attendance_count).sum(),
        total_late: stats.iter().map(|s| s.late_count).sum(),
        average_attendance_rate,
        classes: stats,
    }
}

pub async fn load_summary(
    db: &DbConn,
    policy: &LatenessPolicy,
    now: DateTime<Utc>,
) -> Result<AttendanceSummary, DbErr> {
    let total_students = student::Model::count(db).await?;
    let classes = class_session::Model::all(db).await?;
    let records = attendance_record::Model::all(db).await?;
    Ok(summarize(policy, &classes, &records, total_students, now))
}

pub async fn load_class_stats(
    db: &DbConn,
    policy: &LatenessPolicy,
    class_id: i64,
    now: DateTime<Utc>,
) -> AttendanceResult<ClassStats> {
    let class = class_session::Model::find_by_id(db, class_id)
        .await?
        .ok_or(AttendanceError::ClassNotFound(class_id))?;
    let total_students = student::Model::count(db).await?;
    let records = attendance_record::Model::find_by_class(db, class_id).await?;
    let refs: Vec<&attendance_record::Model> = records.iter().collect();
    Ok(class_stats(policy, &class, &refs, total_students, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance_record::AttendanceStatus;
    use crate::models::class_session::NewClass;
    use crate::models::student::NewStudent;
    use crate::test_utils::setup_test_db;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    fn class(id: i64, capacity: i32) -> class_session::Model {
        class_session::Model {
            id,
            name: format!("Class {id}"),
            class_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            class_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            capacity,
            qr_payload: format!("CLASS:{id}"),
            created_at: at(8, 0),
            updated_at: at(8, 0),
        }
    }

    fn record(id: i64, class_id: i64, marked_at: DateTime<Utc>) -> attendance_record::Model {
        attendance_record::Model {
            id,
            student_id: id,
            class_id,
            status: AttendanceStatus::Present,
            marked_at,
            created_at: marked_at,
        }
    }

    #[test]
    fn rate_is_zero_without_students() {
        assert_eq!(attendance_rate(0, 0), 0.0);
        assert_eq!(attendance_rate(5, 0), 0.0);
        assert_eq!(attendance_rate(1, 3), 33.3);
        assert_eq!(attendance_rate(2, 3), 66.7);
    }

    #[test]
    fn arrival_labels() {
        assert_eq!(format_arrival(None), "N/A");
        assert_eq!(format_arrival(Some(-4.0)), "On time");
        assert_eq!(format_arrival(Some(0.0)), "On time");
        assert_eq!(format_arrival(Some(0.4)), "+1m");
        assert_eq!(format_arrival(Some(12.5)), "+13m");
    }

    #[test]
    fn counts_use_the_shared_threshold() {
        let policy = LatenessPolicy::new(15);
        let c = class(1, 2);
        let rows = [record(1, 1, at(9, 5)), record(2, 1, at(9, 20)), record(3, 1, at(9, 15))];
        let refs: Vec<_> = rows.iter().collect();

        let stats = class_stats(&policy, &c, &refs, 4, at(10, 0));
        assert_eq!(stats.attendance_count, 3);
        assert_eq!(stats.on_time_count, 2);
        assert_eq!(stats.late_count, 1);
        assert_eq!(stats.absent_count, 1);
        assert_eq!(stats.attendance_rate, 75.0);
        assert_eq!(stats.average_arrival, "+13m");
        assert!(stats.is_full);
    }

    #[test]
    fn slightly_late_mean_is_not_on_time() {
        let policy = LatenessPolicy::new(15);
        let c = class(1, 50);
        let rows = [
            record(1, 1, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 24).unwrap()),
            record(2, 1, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 24).unwrap()),
        ];
        let refs: Vec<_> = rows.iter().collect();

        let stats = class_stats(&policy, &c, &refs, 2, at(10, 0));
        assert_eq!(stats.on_time_count, 2);
        assert_eq!(stats.average_arrival, "+1m");
    }

    #[test]
    fn nobody_is_absent_before_the_class_starts() {
        let policy = LatenessPolicy::default();
        let stats = class_stats(&policy, &class(1, 50), &[], 10, at(8, 30));
        assert_eq!(stats.absent_count, 0);
        assert_eq!(stats.average_arrival, NO_ARRIVALS_LABEL);
        assert!(!stats.is_full);
    }

    #[test]
    fn summary_averages_rates_and_sums_counts() {
        let policy = LatenessPolicy::new(15);
        let classes = [class(1, 50), class(2, 50), class(3, 50)];
        let rows = [
            record(1, 1, at(9, 0)),
            record(2, 1, at(9, 30)),
            record(3, 2, at(9, 40)),
        ];

        let summary = summarize(&policy, &classes, &rows, 4, at(12, 0));
        assert_eq!(summary.total_classes, 3);
        assert_eq!(summary.total_attendance, 3);
        assert_eq!(summary.total_late, 2);
        // (50 + 25 + 0) / 3
        assert_eq!(summary.average_attendance_rate, 25.0);
        assert_eq!(summary.classes[2].attendance_count, 0);
    }

    #[test]
    fn empty_summary_has_no_nan() {
        let summary = summarize(&LatenessPolicy::default(), &[], &[], 0, at(9, 0));
        assert_eq!(summary.average_attendance_rate, 0.0);
        assert!(summary.classes.is_empty());
    }

    #[tokio::test]
    async fn lab_a_scenario_from_the_store() {
        let db = setup_test_db().await;
        let policy = LatenessPolicy::new(15);
        let created = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        for code in ["STU20240001", "STU20240002"] {
            student::Model::create(
                &db,
                NewStudent {
                    first_name: "Test".into(),
                    last_name: code.into(),
                    email: None,
                    student_code: Some(code.into()),
                },
                "STU",
                created,
            )
            .await
            .unwrap();
        }
        let lab = class_session::Model::create(
            &db,
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

        attendance_record::Model::mark(&db, &policy, lab.id, "STU20240001", at(9, 5))
            .await
            .unwrap();
        attendance_record::Model::mark(&db, &policy, lab.id, "STU20240002", at(9, 20))
            .await
            .unwrap();

        let stats = load_class_stats(&db, &policy, lab.id, at(10, 0)).await.unwrap();
        assert_eq!(stats.attendance_count, 2);
        assert_eq!(stats.on_time_count, 1);
        assert_eq!(stats.late_count, 1);
        assert_eq!(stats.attendance_rate, 100.0);

        let summary = load_summary(&db, &policy, at(10, 0)).await.unwrap();
        assert_eq!(summary.total_students, 2);
        assert_eq!(summary.classes, vec![stats]);

        assert!(matches!(
            load_class_stats(&db, &policy, 404, at(10, 0)).await,
            Err(AttendanceError::ClassNotFound(404))
        ));
    }
}
