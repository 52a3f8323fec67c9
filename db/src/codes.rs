//! Human-readable student codes.
//!
//! Generated codes look like `STU20240042`: a prefix, the current year and a
//! zero-padded random suffix. There is no retry on collision; the unique index
//! rejects the insert and the caller is told to try again.

use chrono::{DateTime, Datelike, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::error::{AttendanceError, AttendanceResult};
use crate::payload::DELIMITER;

/// Width of the random numeric suffix.
pub const SUFFIX_WIDTH: usize = 4;

pub const MAX_CODE_LEN: usize = 32;

static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Builds a code from `prefix`, the year of `now` and a random suffix.
pub fn generate_student_code(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10u32.pow(SUFFIX_WIDTH as u32));
    format_student_code(prefix, now.year(), suffix)
}

pub fn format_student_code(prefix: &str, year: i32, suffix: u32) -> String {
    format!("{prefix}{year}{suffix:0width$}", width = SUFFIX_WIDTH)
}

/// Checks an operator-supplied (or generated) code and returns it trimmed.
///
/// Codes end up inside scan payloads, so anything outside `[A-Za-z0-9_-]`
/// (the payload delimiter in particular) is rejected here.
pub fn validate_student_code(raw: &str) -> AttendanceResult<String> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(AttendanceError::Validation(
            "Student code must not be empty".into(),
        ));
    }
    if code.contains(DELIMITER) {
        return Err(AttendanceError::Validation(format!(
            "Student code must not contain '{DELIMITER}'"
        )));
    }
    if code.len() > MAX_CODE_LEN {
        return Err(AttendanceError::Validation(format!(
            "Student code must be at most {MAX_CODE_LEN} characters"
        )));
    }
    if !CODE_RE.is_match(code) {
        return Err(AttendanceError::Validation(
            "Student code may only contain letters, digits, '-' and '_'".into(),
        ));
    }
    Ok(code.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generated_codes_have_prefix_year_and_fixed_width_suffix() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        for _ in 0..50 {
            let code = generate_student_code("STU", now);
            assert!(code.starts_with("STU2024"), "{code}");
            assert_eq!(code.len(), "STU2024".len() + SUFFIX_WIDTH);
            assert!(code["STU2024".len()..].chars().all(|c| c.is_ascii_digit()));
            assert!(validate_student_code(&code).is_ok());
        }
    }

    #[test]
    fn suffix_is_zero_padded() {
        assert_eq!(format_student_code("STU", 2024, 1), "STU20240001");
        assert_eq!(format_student_code("S", 2025, 9999), "S20259999");
    }

    #[test]
    fn rejects_delimiter_and_blank_codes() {
        assert!(matches!(
            validate_student_code("STU:1"),
            Err(AttendanceError::Validation(_))
        ));
        assert!(validate_student_code("   ").is_err());
        assert!(validate_student_code("has space").is_err());
        assert!(validate_student_code(&"X".repeat(MAX_CODE_LEN + 1)).is_err());
    }

    #[test]
    fn trims_valid_codes() {
        assert_eq!(validate_student_code("  STU20240001 ").unwrap(), "STU20240001");
    }
}
