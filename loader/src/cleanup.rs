//! Removal of staging directories left behind by earlier processes.
//!
//! A process that exits abnormally never drops its extractor, so its staging
//! directory stays in the temp root. Directories carrying the staging marker
//! are removed once they are older than a minimum age; younger ones may
//! belong to a process that is still starting up.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::time::{Duration, SystemTime};

use crate::staging::STAGING_PREFIX;

/// What a cleanup pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// Directories removed.
    pub removed: Vec<Utf8PathBuf>,
    /// Marked directories younger than the minimum age.
    pub kept: Vec<Utf8PathBuf>,
    /// Directories whose age could not be read or that could not be removed.
    pub failed: Vec<Utf8PathBuf>,
}

impl CleanupReport {
    /// Whether the pass touched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.kept.is_empty() && self.failed.is_empty()
    }

    /// Append the results of another pass.
    pub fn absorb(&mut self, other: Self) {
        self.removed.extend(other.removed);
        self.kept.extend(other.kept);
        self.failed.extend(other.failed);
    }
}

/// Remove marked directories under `temp_root` that are at least `min_age`
/// old.
///
/// Never fails: an unreadable root yields an empty report, and per-entry
/// failures are logged and recorded in [`CleanupReport::failed`].
#[must_use]
pub fn remove_leftovers(temp_root: &Utf8Path, min_age: Duration) -> CleanupReport {
    let mut report = CleanupReport::default();
    let entries = match temp_root.read_dir_utf8() {
        Ok(entries) => entries,
        Err(err) => {
            log::debug!("skipping leftover cleanup in {temp_root}: {err}");
            return report;
        }
    };

    let now = SystemTime::now();
    for entry in entries.flatten() {
        if !entry.file_name().starts_with(STAGING_PREFIX) {
            continue;
        }
        let path = entry.path().to_owned();
        let modified = match entry.metadata().and_then(|meta| {
            if meta.is_dir() {
                meta.modified()
            } else {
                Err(std::io::Error::other("not a directory"))
            }
        }) {
            Ok(modified) => modified,
            Err(err) => {
                log::debug!("ignoring {path}: {err}");
                report.failed.push(path);
                continue;
            }
        };

        // A clock that moved backwards makes the entry look brand new.
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < min_age {
            report.kept.push(path);
            continue;
        }

        match fs::remove_dir_all(&path) {
            Ok(()) => {
                log::debug!("removed leftover staging directory {path}");
                report.removed.push(path);
            }
            Err(err) => {
                log::warn!("failed to remove leftover staging directory {path}: {err}");
                report.failed.push(path);
            }
        }
    }
    report
}
