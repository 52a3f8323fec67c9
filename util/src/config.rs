//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    /// Minutes after class start after which an arrival counts as late.
    pub late_threshold_minutes: i64,
    /// Offset (in minutes east of UTC) of the wall clock class dates/times are written in.
    pub class_utc_offset_minutes: i32,
    pub student_code_prefix: String,
    pub default_class_capacity: i32,
    pub read_retry_attempts: u32,
    pub read_retry_base_ms: u64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value '{raw}' for {key}; falling back to {default}");
            default
        }),
        Err(_) => default,
    }
}

/// Longest prefix that still leaves room for the year and the 4-digit suffix
/// inside a 32-character student code.
const MAX_CODE_PREFIX_LEN: usize = 24;
const DEFAULT_CODE_PREFIX: &str = "STU";

/// Generated student codes end up inside scan payloads, so the prefix may only
/// use `[A-Za-z0-9_-]`.
fn code_prefix_or_default(raw: String) -> String {
    let prefix = raw.trim();
    let valid = !prefix.is_empty()
        && prefix.len() <= MAX_CODE_PREFIX_LEN
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        prefix.to_string()
    } else {
        tracing::warn!(
            "Invalid value '{raw}' for STUDENT_CODE_PREFIX; falling back to {DEFAULT_CODE_PREFIX}"
        );
        DEFAULT_CODE_PREFIX.to_string()
    }
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Every key has a default, so this never fails; malformed numbers are
    /// logged and replaced by their default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: var_or("APP_ENV", "development"),
            project_name: var_or("PROJECT_NAME", "qr-attendance"),
            log_level: var_or("LOG_LEVEL", "api=info,db=info"),
            log_file: var_or("LOG_FILE", "api.log"),
            log_to_stdout: var_or("LOG_TO_STDOUT", "false") == "true",
            database_path: var_or("DATABASE_PATH", "data/attendance.db"),
            host: var_or("HOST", "127.0.0.1"),
            port: parse_or("PORT", 3000),
            late_threshold_minutes: parse_or("LATE_THRESHOLD_MINUTES", 15),
            class_utc_offset_minutes: parse_or("CLASS_UTC_OFFSET_MINUTES", 0),
            student_code_prefix: code_prefix_or_default(var_or(
                "STUDENT_CODE_PREFIX",
                DEFAULT_CODE_PREFIX,
            )),
            default_class_capacity: parse_or("DEFAULT_CLASS_CAPACITY", 50),
            read_retry_attempts: parse_or("READ_RETRY_ATTEMPTS", 3),
            read_retry_base_ms: parse_or("READ_RETRY_BASE_MS", 100),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock
                .write()
                .expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_port(value: u16) {
        AppConfig::set_field(|cfg| cfg.port = value);
    }

    pub fn set_late_threshold_minutes(value: i64) {
        AppConfig::set_field(|cfg| cfg.late_threshold_minutes = value);
    }

    pub fn set_class_utc_offset_minutes(value: i32) {
        AppConfig::set_field(|cfg| cfg.class_utc_offset_minutes = value);
    }

    pub fn set_student_code_prefix(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.student_code_prefix = value.into());
    }

    pub fn set_default_class_capacity(value: i32) {
        AppConfig::set_field(|cfg| cfg.default_class_capacity = value);
    }
}

// --- Free accessors ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn late_threshold_minutes() -> i64 {
    AppConfig::global().late_threshold_minutes
}

pub fn class_utc_offset_minutes() -> i32 {
    AppConfig::global().class_utc_offset_minutes
}

pub fn student_code_prefix() -> String {
    AppConfig::global().student_code_prefix.clone()
}

pub fn default_class_capacity() -> i32 {
    AppConfig::global().default_class_capacity
}

pub fn read_retry_attempts() -> u32 {
    AppConfig::global().read_retry_attempts
}

pub fn read_retry_base_ms() -> u64 {
    AppConfig::global().read_retry_base_ms
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_apply_when_unset() {
        unsafe {
            env::remove_var("LATE_THRESHOLD_MINUTES");
            env::remove_var("STUDENT_CODE_PREFIX");
        }
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.late_threshold_minutes, 15);
        assert_eq!(cfg.student_code_prefix, "STU");
        assert_eq!(cfg.default_class_capacity, 50);
    }

    #[test]
    #[serial]
    fn malformed_numbers_fall_back_to_default() {
        unsafe {
            env::set_var("LATE_THRESHOLD_MINUTES", "soon");
        }
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.late_threshold_minutes, 15);
        unsafe {
            env::remove_var("LATE_THRESHOLD_MINUTES");
        }
    }

    #[test]
    #[serial]
    fn unusable_code_prefix_falls_back_to_default() {
        for bad in ["S:", "S T", "", "ABCDEFGHIJKLMNOPQRSTUVWXYZ"] {
            unsafe {
                env::set_var("STUDENT_CODE_PREFIX", bad);
            }
            assert_eq!(AppConfig::from_env().student_code_prefix, "STU", "{bad:?}");
        }
        unsafe {
            env::set_var("STUDENT_CODE_PREFIX", " LAB_1 ");
        }
        assert_eq!(AppConfig::from_env().student_code_prefix, "LAB_1");
        unsafe {
            env::remove_var("STUDENT_CODE_PREFIX");
        }
    }

    #[test]
    #[serial]
    fn setters_override_global() {
        AppConfig::set_late_threshold_minutes(20);
        assert_eq!(late_threshold_minutes(), 20);
        AppConfig::reset();
        assert_eq!(late_threshold_minutes(), 15);
    }
}
