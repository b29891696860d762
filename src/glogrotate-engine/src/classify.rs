//! Grouping of scanned files by severity level.

use std::collections::BTreeMap;

use crate::record::{Level, LogFile};

/// Files of each level, newest first.
pub type LevelFiles = BTreeMap<Level, Vec<LogFile>>;

/// Group `files` by level, preserving their relative order.
///
/// Levels with no files are absent from the map.
pub fn classify(files: impl IntoIterator<Item = LogFile>) -> LevelFiles {
    let mut levels = LevelFiles::new();
    for file in files {
        levels.entry(file.level).or_default().push(file);
    }
    levels
}
