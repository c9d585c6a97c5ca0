//! Bundles backed by a directory tree.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::{self, Write};

use super::{ResourceBundle, entry_path, not_found};

/// A bundle whose entries are files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: Utf8PathBuf,
}

impl DirectoryBundle {
    /// Create a bundle rooted at `root`. The directory is not checked here.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The bundle root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<Utf8PathBuf> {
        let entry = entry_path(path)?;
        Ok(entry
            .split('/')
            .fold(self.root.clone(), |acc, segment| acc.join(segment)))
    }
}

impl ResourceBundle for DirectoryBundle {
    fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_ok_and(|file| file.is_file())
    }

    fn copy_to(&self, path: &str, out: &mut dyn Write) -> io::Result<u64> {
        let file_path = self.resolve(path)?;
        if !file_path.is_file() {
            return Err(not_found(path, &self.describe()));
        }
        let mut file = File::open(&file_path)?;
        io::copy(&mut file, out)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root)
    }
}
