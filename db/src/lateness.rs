//! Present/late classification shared by the recording rule and analytics.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

use crate::models::attendance_record::AttendanceStatus;
use crate::models::class_session;
use util::config;

/// One threshold, one clock. Build it once and pass the same value to
/// `attendance_record::Model::mark` and to `analytics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatenessPolicy {
    pub late_threshold_minutes: i64,
    pub utc_offset: FixedOffset,
}

impl Default for LatenessPolicy {
    fn default() -> Self {
        Self::new(15)
    }
}

impl LatenessPolicy {
    /// Policy with class times interpreted as UTC.
    pub fn new(late_threshold_minutes: i64) -> Self {
        Self {
            late_threshold_minutes,
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_offset_minutes(mut self, minutes: i32) -> Self {
        if let Some(offset) = FixedOffset::east_opt(minutes * 60) {
            self.utc_offset = offset;
        } else {
            tracing::warn!("Ignoring out-of-range UTC offset of {minutes} minutes");
        }
        self
    }

    /// `LATE_THRESHOLD_MINUTES` + `CLASS_UTC_OFFSET_MINUTES`.
    pub fn from_config() -> Self {
        Self::new(config::late_threshold_minutes())
            .with_offset_minutes(config::class_utc_offset_minutes())
    }

    pub fn threshold(&self) -> Duration {
        Duration::minutes(self.late_threshold_minutes)
    }

    /// UTC instant at which a class held on `date` at `time` (local wall clock) starts.
    pub fn class_start(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(time);
        // A fixed offset has no gaps or folds, so the mapping is always single.
        self.utc_offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&local))
    }

    pub fn start_of(&self, class: &class_session::Model) -> DateTime<Utc> {
        self.class_start(class.class_date, class.class_time)
    }

    /// Signed offset of an arrival relative to class start.
    pub fn elapsed(&self, start: DateTime<Utc>, marked_at: DateTime<Utc>) -> Duration {
        marked_at - start
    }

    /// `Late` strictly after the threshold; arriving exactly on it is still `Present`.
    pub fn classify(&self, start: DateTime<Utc>, marked_at: DateTime<Utc>) -> AttendanceStatus {
        if self.is_late(start, marked_at) {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }

    pub fn is_late(&self, start: DateTime<Utc>, marked_at: DateTime<Utc>) -> bool {
        self.elapsed(start, marked_at) > self.threshold()
    }
}
