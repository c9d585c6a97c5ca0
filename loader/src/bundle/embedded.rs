//! Bundles held in memory.
//!
//! Useful when the native libraries are compiled into the executable with
//! `include_bytes!`, either as individual files or as one `.tar.zst` archive.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use super::{ResourceBundle, entry_path, not_found};

/// A bundle whose entries are byte buffers keyed by path.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedBundle {
    label: String,
    entries: BTreeMap<String, Vec<u8>>,
}

impl EmbeddedBundle {
    /// Create an empty bundle with a diagnostic label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is empty or contains `.`/`..` segments.
    pub fn insert(&mut self, path: &str, bytes: impl Into<Vec<u8>>) -> io::Result<()> {
        let entry = entry_path(path)?;
        self.entries.insert(entry, bytes.into());
        Ok(())
    }

    /// Builder-style variant of [`Self::insert`].
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is empty or contains `.`/`..` segments.
    pub fn with_entry(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> io::Result<Self> {
        self.insert(path, bytes)?;
        Ok(self)
    }

    /// Index every regular file of a zstd-compressed tar archive.
    ///
    /// Directory entries, links and other special entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is not a valid `.tar.zst` archive or an
    /// entry path would escape the bundle.
    pub fn from_tar_zst(reader: impl Read, label: impl Into<String>) -> io::Result<Self> {
        let decoder = zstd::Decoder::new(reader)?;
        let mut archive = tar::Archive::new(decoder);
        let mut bundle = Self::new(label);

        for entry_result in archive.entries()? {
            let mut entry = entry_result?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let path = entry.path()?.to_string_lossy().replace('\\', "/");
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;
            bundle.insert(&path, bytes)?;
        }

        log::debug!(
            "indexed {} entries from {}",
            bundle.entries.len(),
            bundle.label
        );
        Ok(bundle)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bundle has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceBundle for EmbeddedBundle {
    fn contains(&self, path: &str) -> bool {
        entry_path(path).is_ok_and(|entry| self.entries.contains_key(&entry))
    }

    fn copy_to(&self, path: &str, out: &mut dyn Write) -> io::Result<u64> {
        let entry = entry_path(path)?;
        let bytes = self
            .entries
            .get(&entry)
            .ok_or_else(|| not_found(path, &self.label))?;
        io::copy(&mut bytes.as_slice(), out)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
