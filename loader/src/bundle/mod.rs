//! Resource bundles that carry packaged native libraries.
//!
//! A bundle is anything that can answer "do you have this path?" and stream
//! the bytes behind it: a directory tree, a zip archive, or entries baked into
//! the binary. Paths are bundle-relative and `/`-separated.
//!
//! # Sub-modules
//!
//! - [`archive`]: zip and jar archives.
//! - [`classpath`]: an ordered list of bundles searched first-match.
//! - [`directory`]: a directory tree on disk.
//! - [`embedded`]: in-memory entries, optionally indexed from `.tar.zst`.

pub mod archive;
pub mod classpath;
pub mod directory;
pub mod embedded;

pub use archive::ZipBundle;
pub use classpath::{Classpath, open_bundle};
pub use directory::DirectoryBundle;
pub use embedded::EmbeddedBundle;

use std::io::{self, Write};

/// A source of packaged resources.
pub trait ResourceBundle: Send + Sync {
    /// Whether the bundle holds a file at `path`.
    fn contains(&self, path: &str) -> bool;

    /// Stream the file at `path` into `out`, returning the bytes copied.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::NotFound`] when the entry does not exist, or
    /// any error raised while reading or writing.
    fn copy_to(&self, path: &str, out: &mut dyn Write) -> io::Result<u64>;

    /// A short description for diagnostics.
    fn describe(&self) -> String;
}

impl<B: ResourceBundle + ?Sized> ResourceBundle for Box<B> {
    fn contains(&self, path: &str) -> bool {
        (**self).contains(path)
    }

    fn copy_to(&self, path: &str, out: &mut dyn Write) -> io::Result<u64> {
        (**self).copy_to(path, out)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Normalize a bundle path, rejecting anything that could escape the bundle.
///
/// Leading slashes are dropped; empty, `.` and `..` segments are refused.
pub(crate) fn entry_path(path: &str) -> io::Result<String> {
    let trimmed = path.trim_start_matches('/');
    let valid = !trimmed.is_empty()
        && trimmed
            .split('/')
            .all(|segment| !matches!(segment, "" | "." | ".."));
    if valid {
        Ok(trimmed.to_owned())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid bundle path: {path}"),
        ))
    }
}

pub(crate) fn not_found(path: &str, bundle: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{path} not found in {bundle}"),
    )
}
