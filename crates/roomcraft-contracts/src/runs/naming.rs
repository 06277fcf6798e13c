use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::error::DesignError;

/// How per-run output identifiers are generated.
///
/// `Timestamp` keeps the `YYYYMMDD_HHMMSS` pattern; two runs started in the
/// same second share a name under it. The other strategies widen the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputNaming {
    #[default]
    Timestamp,
    TimestampMillis,
    TimestampUuid,
}

impl OutputNaming {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::TimestampMillis => "timestamp-millis",
            Self::TimestampUuid => "timestamp-uuid",
        }
    }

    pub fn stamp(self, now: DateTime<Local>) -> String {
        let base = now.format("%Y%m%d_%H%M%S").to_string();
        match self {
            Self::Timestamp => base,
            Self::TimestampMillis => format!("{base}_{:03}", now.timestamp_subsec_millis()),
            Self::TimestampUuid => {
                let id = Uuid::new_v4().simple().to_string();
                format!("{base}_{}", &id[..8])
            }
        }
    }

    pub fn file_name(self, prefix: &str, ext: &str, now: DateTime<Local>) -> String {
        format!("{prefix}_{}.{ext}", self.stamp(now))
    }

    pub fn path_in(self, dir: &Path, prefix: &str, ext: &str) -> PathBuf {
        dir.join(self.file_name(prefix, ext, Local::now()))
    }
}

/// Opaque id tying run-log events to one run.
pub fn new_run_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl fmt::Display for OutputNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputNaming {
    type Err = DesignError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "" | "timestamp" => Ok(Self::Timestamp),
            "timestamp-millis" | "millis" => Ok(Self::TimestampMillis),
            "timestamp-uuid" | "uuid" => Ok(Self::TimestampUuid),
            other => Err(DesignError::configuration(format!(
                "unknown output naming strategy '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_now() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 12, 13, 21, 1, 29)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn timestamp_matches_documented_pattern() {
        let name = OutputNaming::Timestamp.file_name("poc_results", "json", fixed_now());
        assert_eq!(name, "poc_results_20251213_210129.json");
    }

    #[test]
    fn millis_and_uuid_widen_the_stamp() {
        let millis = OutputNaming::TimestampMillis.stamp(fixed_now());
        assert_eq!(millis, "20251213_210129_000");

        let first = OutputNaming::TimestampUuid.stamp(fixed_now());
        let second = OutputNaming::TimestampUuid.stamp(fixed_now());
        assert!(first.starts_with("20251213_210129_"));
        assert_eq!(first.len(), "20251213_210129_".len() + 8);
        assert_ne!(first, second);
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(
            "timestamp_uuid".parse::<OutputNaming>().ok(),
            Some(OutputNaming::TimestampUuid)
        );
        assert_eq!("".parse::<OutputNaming>().ok(), Some(OutputNaming::Timestamp));
        assert!("random".parse::<OutputNaming>().is_err());
    }
}
