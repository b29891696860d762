//! Log file records parsed from glog file names.
//!
//! glog names its files `<program>.<host>.<user>.log.<LEVEL>.<YYYYMMDD>-<HHMMSS>.<pid>`;
//! once compressed a trailing `.gz` is added. Everything the engine knows about
//! a file besides its size comes from that name.

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use crate::compress::GZIP_SUFFIX;

static FILE_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.+\.(INFO|WARNING|ERROR|FATAL)\.(\d{8}-\d{6})\.\d+$")
        .expect("Invalid log file name regex")
});

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Log severity embedded in a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Level {
    /// All levels, in the order retention processes them.
    pub const ALL: [Level; 4] = [Level::Info, Level::Warning, Level::Error, Level::Fatal];

    /// Name as it appears in file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INFO" => Ok(Self::Info),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "FATAL" => Ok(Self::Fatal),
            _ => Err(format!("Unknown log level: {s}")),
        }
    }
}

/// Fields recovered from a log file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedName {
    pub level: Level,
    pub created_at: DateTime<Utc>,
    pub compressed: bool,
}

/// Parse a glog file name.
///
/// Returns `None` when the name does not have the
/// `<...>.<LEVEL>.<8 digits>-<6 digits>.<pid>[.gz]` shape. A timestamp whose
/// digits do not form a valid date degrades to the Unix epoch.
pub fn parse_log_file_name(name: &str) -> Option<ParsedName> {
    let (stem, compressed) = match name.strip_suffix(GZIP_SUFFIX) {
        Some(stem) => (stem, true),
        None => (name, false),
    };

    let caps = FILE_NAME_REGEX.captures(stem)?;
    let level = caps[1].parse().ok()?;
    let created_at = match NaiveDateTime::parse_from_str(&caps[2], TIMESTAMP_FORMAT) {
        Ok(naive) => naive.and_utc(),
        Err(e) => {
            debug!(file = name, error = %e, "Invalid timestamp in log file name");
            DateTime::UNIX_EPOCH
        }
    };

    Some(ParsedName {
        level,
        created_at,
        compressed,
    })
}

/// A log file found by a directory scan.
///
/// Records are rebuilt on every scan; `level` and `created_at` never change
/// for the lifetime of a record, even when compression renames the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    pub level: Level,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub compressed: bool,
}

impl LogFile {
    /// Build a record for `path` if its file name is a recognized log name.
    pub fn from_path(path: impl Into<PathBuf>, size_bytes: u64) -> Option<Self> {
        let path = path.into();
        let parsed = parse_log_file_name(path.file_name()?.to_str()?)?;
        Some(Self {
            path,
            level: parsed.level,
            created_at: parsed.created_at,
            size_bytes,
            compressed: parsed.compressed,
        })
    }

    /// File name component of the path.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Whether the file was created strictly before `cutoff`.
    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        self.created_at < cutoff
    }

    /// Point the record at its compressed sibling.
    pub(crate) fn mark_compressed(&mut self, path: &Path) {
        self.path = path.to_path_buf();
        self.compressed = true;
    }
}

impl fmt::Display for LogFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_plain_name() {
        let parsed = parse_log_file_name("one.rz-reqmngt1-eu.root.log.ERROR.20150320-103857.29198")
            .expect("should parse");
        assert_eq!(parsed.level, Level::Error);
        assert_eq!(
            parsed.created_at,
            Utc.with_ymd_and_hms(2015, 3, 20, 10, 38, 57).unwrap()
        );
        assert!(!parsed.compressed);
    }

    #[test]
    fn test_parse_strips_gz_before_reading_fields() {
        let parsed = parse_log_file_name("app.INFO.20150330-130800.999.gz").expect("should parse");
        assert_eq!(parsed.level, Level::Info);
        assert!(parsed.compressed);
        assert_eq!(
            parsed.created_at,
            Utc.with_ymd_and_hms(2015, 3, 30, 13, 8, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_unrecognized_shapes() {
        for name in [
            "app.INFO",
            "app.log",
            "app.DEBUG.20150320-103857.1",
            "app.INFO.2015032-103857.1",
            "app.INFO.20150320-103857",
            "app.INFO.20150320-103857.1.bz2",
            "INFO.20150320-103857.1",
            "app.INFO.20150320-103857.pid",
        ] {
            assert!(parse_log_file_name(name).is_none(), "{name} should not parse");
        }
    }

    #[test]
    fn test_invalid_timestamp_degrades_to_epoch() {
        let parsed = parse_log_file_name("app.WARNING.20151399-250000.7").expect("shape matches");
        assert_eq!(parsed.level, Level::Warning);
        assert_eq!(parsed.created_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_log_file_from_path() {
        let file = LogFile::from_path("/logs/app.FATAL.20150101-000000.100", 42).expect("parses");
        assert_eq!(file.level, Level::Fatal);
        assert_eq!(file.size_bytes, 42);
        assert_eq!(file.file_name(), "app.FATAL.20150101-000000.100");
        assert!(LogFile::from_path("/logs/app.FATAL", 1).is_none());
    }

    #[test]
    fn test_is_older_than() {
        let file = LogFile::from_path("/logs/app.INFO.20150101-000000.100", 0).unwrap();
        let cutoff = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 1).unwrap();
        assert!(file.is_older_than(cutoff));
        assert!(!file.is_older_than(file.created_at));
    }

    #[test]
    fn test_level_round_trip_through_str() {
        for level in Level::ALL {
            assert_eq!(level.as_str().parse::<Level>(), Ok(level));
        }
        assert!("info".parse::<Level>().is_err());
    }
}
