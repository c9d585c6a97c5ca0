//! Mapping extracted libraries into the running process.
//!
//! A library image attaches to the process once and stays attached; the
//! production [`ProcessImageLoader`] therefore keeps every handle it opens in
//! a process-wide registry and never unloads them.

use camino::{Utf8Path, Utf8PathBuf};
use libloading::Library;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use crate::error::{LoaderError, Result};

/// Loads an extracted library file into the process.
#[cfg_attr(test, mockall::automock)]
pub trait ImageLoader {
    /// Load the library at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::NativeLoad`] when the dynamic loader rejects
    /// the file.
    fn load(&self, path: &Utf8Path) -> Result<()>;
}

type Registry = Mutex<HashMap<Utf8PathBuf, Arc<Library>>>;

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| Mutex::new(HashMap::new()));

/// Loads libraries with the platform dynamic loader via `libloading`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessImageLoader;

impl ProcessImageLoader {
    /// The retained handle for a library loaded through this type.
    #[must_use]
    pub fn library(path: &Utf8Path) -> Option<Arc<Library>> {
        REGISTRY
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Paths of every library loaded so far.
    #[must_use]
    pub fn loaded_paths() -> Vec<Utf8PathBuf> {
        let mut paths: Vec<_> = REGISTRY
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}

impl ImageLoader for ProcessImageLoader {
    fn load(&self, path: &Utf8Path) -> Result<()> {
        let mut registry = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
        if registry.contains_key(path) {
            log::debug!("{path} is already loaded");
            return Ok(());
        }
        // SAFETY: loading runs the library's initialisers. Callers stage
        // libraries from bundles they ship, so the code is trusted.
        let library = unsafe { Library::new(path.as_std_path()) }.map_err(|err| {
            LoaderError::NativeLoad {
                path: path.to_owned(),
                reason: err.to_string(),
            }
        })?;
        log::debug!("loaded native library {path}");
        registry.insert(path.to_owned(), Arc::new(library));
        Ok(())
    }
}

/// An [`ImageLoader`] that records paths instead of loading them.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct RecordingImageLoader {
    loaded: Arc<Mutex<Vec<Utf8PathBuf>>>,
    reject: bool,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingImageLoader {
    /// A loader that accepts every file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader that rejects every file with [`LoaderError::NativeLoad`].
    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    /// A handle that observes the same record after `self` is moved.
    #[must_use]
    pub fn observer(&self) -> Self {
        Self {
            loaded: Arc::clone(&self.loaded),
            reject: self.reject,
        }
    }

    /// Paths passed to [`ImageLoader::load`], in call order.
    #[must_use]
    pub fn loaded(&self) -> Vec<Utf8PathBuf> {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ImageLoader for RecordingImageLoader {
    fn load(&self, path: &Utf8Path) -> Result<()> {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_owned());
        if self.reject {
            return Err(LoaderError::NativeLoad {
                path: path.to_owned(),
                reason: "rejected by test loader".to_owned(),
            });
        }
        Ok(())
    }
}
