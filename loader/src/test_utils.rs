//! Shared test utilities for the loader crate.

use camino::{Utf8Path, Utf8PathBuf};
use std::io;

use crate::platform::PlatformSignals;

pub use crate::image::RecordingImageLoader;

/// Write `entries` below `root`, creating parent directories as needed.
///
/// Entry paths use `/` separators, matching bundle paths.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be written.
pub fn write_library_tree(root: &Utf8Path, entries: &[(&str, &[u8])]) -> io::Result<()> {
    for (path, bytes) in entries {
        let target = path
            .split('/')
            .fold(root.to_owned(), |acc: Utf8PathBuf, segment| acc.join(segment));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, bytes)?;
    }
    Ok(())
}

/// Fixed platform signals describing a simulated host.
#[derive(Debug, Clone, Default)]
pub struct FixedSignals {
    /// Raw OS name.
    pub os_name: String,
    /// Raw architecture name.
    pub arch: String,
    /// Generic pointer-width signal.
    pub pointer_width: Option<String>,
    /// Vendor pointer-width signal.
    pub vendor_pointer_width: Option<String>,
}

impl FixedSignals {
    /// Signals for `os_name` on `arch` with a generic pointer width.
    #[must_use]
    pub fn new(os_name: &str, arch: &str, bits: &str) -> Self {
        Self {
            os_name: os_name.to_owned(),
            arch: arch.to_owned(),
            pointer_width: Some(bits.to_owned()),
            vendor_pointer_width: None,
        }
    }
}

impl PlatformSignals for FixedSignals {
    fn os_name(&self) -> String {
        self.os_name.clone()
    }

    fn arch(&self) -> String {
        self.arch.clone()
    }

    fn pointer_width(&self) -> Option<String> {
        self.pointer_width.clone()
    }

    fn vendor_pointer_width(&self) -> Option<String> {
        self.vendor_pointer_width.clone()
    }
}
