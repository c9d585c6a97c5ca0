//! Uniquely named staging directories.
//!
//! Each extractor owns one directory under the temp root, named with the
//! [`STAGING_PREFIX`] marker so leftover cleanup can recognise it later.
//! Names carry a millisecond timestamp and an attempt counter; collisions
//! are resolved by bumping the counter.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{LoaderError, Result};

/// Marker prefix for staging directories created by this crate.
pub const STAGING_PREFIX: &str = "nativelib-loader_";

/// A staging directory exclusively owned by one extractor.
///
/// The directory is removed recursively when dropped unless it was marked
/// as kept.
#[derive(Debug)]
pub struct StagingDirectory {
    path: Utf8PathBuf,
    keep: bool,
}

impl StagingDirectory {
    /// Create a fresh staging directory under `temp_root`.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::ExtractionIo`] when the directory cannot be
    /// created for any reason other than a name collision.
    pub fn create_in(temp_root: &Utf8Path) -> Result<Self> {
        let path = create_unique_dir(temp_root, STAGING_PREFIX)?;
        log::debug!("created staging directory {path}");
        Ok(Self { path, keep: false })
    }

    /// Create a staging directory under the first usable root.
    ///
    /// `preferred` is created if missing; when that fails `fallback` is
    /// tried instead.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::ExtractionIo`] when neither root is usable.
    pub fn create_with_fallback(preferred: &Utf8Path, fallback: &Utf8Path) -> Result<Self> {
        match ensure_root(preferred) {
            Ok(()) => Self::create_in(preferred),
            Err(err) => {
                log::warn!("temp root {preferred} is unusable ({err}); falling back to {fallback}");
                ensure_root(fallback).map_err(|source| LoaderError::extraction(fallback, source))?;
                Self::create_in(fallback)
            }
        }
    }

    /// Path of the staging directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Keep or release the directory when this value is dropped.
    pub fn set_keep(&mut self, keep: bool) {
        self.keep = keep;
    }

    /// Whether the directory survives drop.
    #[must_use]
    pub const fn is_kept(&self) -> bool {
        self.keep
    }

    /// Create a per-context subdirectory named `{context}.{millis}.{attempt}`.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::ExtractionIo`] when the directory cannot be
    /// created.
    pub fn create_context_dir(&self, context: &str) -> Result<Utf8PathBuf> {
        let path = create_unique_dir(&self.path, &format!("{context}."))?;
        log::debug!("created context directory {path}");
        Ok(path)
    }
}

impl Drop for StagingDirectory {
    fn drop(&mut self) {
        if self.keep {
            log::debug!("keeping staging directory {}", self.path);
            return;
        }
        if let Err(err) = fs::remove_dir_all(&self.path) {
            log::debug!("could not remove staging directory {}: {err}", self.path);
        }
    }
}

/// The system temp directory, when it is valid UTF-8.
#[must_use]
pub fn system_temp_dir() -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(std::env::temp_dir()).ok()
}

fn ensure_root(root: &Utf8Path) -> io::Result<()> {
    if root.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(root)
}

/// Create `{parent}/{stem}{millis}.{attempt}`, bumping `attempt` while the
/// name is taken.
pub(crate) fn create_unique_dir(parent: &Utf8Path, stem: &str) -> Result<Utf8PathBuf> {
    let millis = now_millis();
    let mut last_collision = None;
    for attempt in 0..u32::MAX {
        let candidate = parent.join(format!("{stem}{millis}.{attempt}"));
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                last_collision = Some(candidate);
            }
            Err(err) => return Err(LoaderError::extraction(candidate, err)),
        }
    }
    Err(LoaderError::extraction(
        last_collision.unwrap_or_else(|| parent.to_owned()),
        io::Error::from(io::ErrorKind::AlreadyExists),
    ))
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis())
}
