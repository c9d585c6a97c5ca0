//! Bundles backed by zip archives (including jars).

use camino::Utf8Path;
use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::sync::Mutex;
use zip::ZipArchive;
use zip::result::ZipError;

use super::{ResourceBundle, entry_path, not_found};

/// A bundle whose entries live in a zip archive.
///
/// Reading an entry needs exclusive access to the archive, so the archive
/// sits behind a mutex and the bundle can be shared between threads.
pub struct ZipBundle<R = File> {
    label: String,
    archive: Mutex<ZipArchive<R>>,
}

impl ZipBundle<File> {
    /// Open a zip archive on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a zip archive.
    pub fn open(path: &Utf8Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, format!("archive {path}"))
    }
}

impl<R: Read + Seek> ZipBundle<R> {
    /// Wrap any seekable reader holding a zip archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the central directory cannot be read.
    pub fn from_reader(reader: R, label: impl Into<String>) -> io::Result<Self> {
        let archive = ZipArchive::new(reader).map_err(zip_error)?;
        Ok(Self {
            label: label.into(),
            archive: Mutex::new(archive),
        })
    }
}

impl<R: Read + Seek + Send> ResourceBundle for ZipBundle<R> {
    fn contains(&self, path: &str) -> bool {
        let Ok(entry) = entry_path(path) else {
            return false;
        };
        self.archive
            .lock()
            .is_ok_and(|archive| archive.index_for_name(&entry).is_some())
    }

    fn copy_to(&self, path: &str, out: &mut dyn Write) -> io::Result<u64> {
        let entry = entry_path(path)?;
        let mut archive = self
            .archive
            .lock()
            .map_err(|_| io::Error::other(format!("{} lock poisoned", self.label)))?;
        let mut file = match archive.by_name(&entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(not_found(path, &self.label)),
            Err(err) => return Err(zip_error(err)),
        };
        io::copy(&mut file, out)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

impl<R> std::fmt::Debug for ZipBundle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipBundle")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

fn zip_error(err: ZipError) -> io::Error {
    match err {
        ZipError::Io(source) => source,
        ZipError::FileNotFound => io::Error::new(io::ErrorKind::NotFound, err),
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}
