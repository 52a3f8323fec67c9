//! Scan payloads: the strings encoded into student and class QR codes.
//!
//! ```text
//! STUDENT:<student code>:<issued at, unix millis>
//! CLASS:<percent-encoded name>:<YYYY-MM-DD>:<HHMM>:<issued at, unix millis>
//! ```
//!
//! The tag tells a scanner what it is looking at. Student codes are validated
//! so they never contain the delimiter; class names are free text and are
//! percent-encoded instead.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::codes::validate_student_code;

pub const DELIMITER: char = ':';
pub const STUDENT_TAG: &str = "STUDENT";
pub const CLASS_TAG: &str = "CLASS";

/// Characters escaped inside free-text payload components.
const COMPONENT: &AsciiSet = &CONTROLS.add(b':').add(b'%');

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H%M";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("unknown payload tag")]
    UnknownTag,
    #[error("malformed payload: {0}")]
    Malformed(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPayload {
    Student {
        code: String,
        issued_at_ms: i64,
    },
    Class {
        name: String,
        date: NaiveDate,
        time: NaiveTime,
        issued_at_ms: i64,
    },
}

impl ScanPayload {
    pub fn student(code: &str, issued_at: DateTime<Utc>) -> Self {
        Self::Student {
            code: code.to_owned(),
            issued_at_ms: issued_at.timestamp_millis(),
        }
    }

    pub fn class(name: &str, date: NaiveDate, time: NaiveTime, issued_at: DateTime<Utc>) -> Self {
        Self::Class {
            name: name.to_owned(),
            date,
            time,
            issued_at_ms: issued_at.timestamp_millis(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Student { .. } => "student",
            Self::Class { .. } => "class",
        }
    }

    /// The student code, if this is a student payload.
    pub fn student_code(&self) -> Option<&str> {
        match self {
            Self::Student { code, .. } => Some(code),
            Self::Class { .. } => None,
        }
    }
}

impl fmt::Display for ScanPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student { code, issued_at_ms } => {
                write!(f, "{STUDENT_TAG}{DELIMITER}{code}{DELIMITER}{issued_at_ms}")
            }
            Self::Class {
                name,
                date,
                time,
                issued_at_ms,
            } => write!(
                f,
                "{CLASS_TAG}{d}{name}{d}{date}{d}{time}{d}{issued_at_ms}",
                d = DELIMITER,
                name = utf8_percent_encode(name, COMPONENT),
                date = date.format(DATE_FORMAT),
                time = time.format(TIME_FORMAT),
            ),
        }
    }
}

impl FromStr for ScanPayload {
    type Err = PayloadError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.trim().split(DELIMITER).collect();

        match parts.as_slice() {
            [STUDENT_TAG, code, issued] => {
                let code = validate_student_code(code)
                    .map_err(|_| PayloadError::Malformed("invalid student code"))?;
                Ok(Self::Student {
                    code,
                    issued_at_ms: parse_millis(issued)?,
                })
            }
            [STUDENT_TAG, ..] => Err(PayloadError::Malformed("student payload needs 3 fields")),
            [CLASS_TAG, name, date, time, issued] => {
                let name = percent_decode_str(name)
                    .decode_utf8()
                    .map_err(|_| PayloadError::Malformed("class name is not UTF-8"))?
                    .into_owned();
                if name.trim().is_empty() {
                    return Err(PayloadError::Malformed("empty class name"));
                }
                let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
                    .map_err(|_| PayloadError::Malformed("invalid class date"))?;
                let time = NaiveTime::parse_from_str(time, TIME_FORMAT)
                    .map_err(|_| PayloadError::Malformed("invalid class time"))?;
                Ok(Self::Class {
                    name,
                    date,
                    time,
                    issued_at_ms: parse_millis(issued)?,
                })
            }
            [CLASS_TAG, ..] => Err(PayloadError::Malformed("class payload needs 5 fields")),
            _ => Err(PayloadError::UnknownTag),
        }
    }
}

fn parse_millis(raw: &str) -> Result<i64, PayloadError> {
    raw.parse::<i64>()
        .map_err(|_| PayloadError::Malformed("invalid timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn student_payload_recovers_code() {
        let encoded = ScanPayload::student("STU20240001", at()).to_string();
        assert!(encoded.starts_with("STUDENT:STU20240001:"));

        let decoded: ScanPayload = encoded.parse().unwrap();
        assert_eq!(decoded.student_code(), Some("STU20240001"));
        assert_eq!(decoded.kind(), "student");
    }

    #[test]
    fn class_names_with_delimiter_survive() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let original = ScanPayload::class("Lab A: 100% practical", date, time, at());

        let encoded = original.to_string();
        assert_eq!(encoded.matches(DELIMITER).count(), 4);

        let decoded: ScanPayload = encoded.parse().unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn unknown_or_garbled_input_is_not_recognized() {
        assert_eq!(
            "https://example.com".parse::<ScanPayload>(),
            Err(PayloadError::UnknownTag)
        );
        assert_eq!("".parse::<ScanPayload>(), Err(PayloadError::UnknownTag));
        assert!(matches!(
            "STUDENT:STU1".parse::<ScanPayload>(),
            Err(PayloadError::Malformed(_))
        ));
        assert!(matches!(
            "STUDENT:STU1:yesterday".parse::<ScanPayload>(),
            Err(PayloadError::Malformed(_))
        ));
        assert!(matches!(
            "CLASS:Lab:2024-13-01:0900:1".parse::<ScanPayload>(),
            Err(PayloadError::Malformed(_))
        ));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let decoded: ScanPayload = "  STUDENT:STU20240002:1709281800000\n".parse().unwrap();
        assert_eq!(decoded.student_code(), Some("STU20240002"));
    }
}
