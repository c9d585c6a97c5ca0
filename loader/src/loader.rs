//! Resolve, locate, extract, and load in one call.
//!
//! [`NativeLoader`] ties the layers together: it resolves the platform from
//! its signals, expands the platform into candidate bundle directories,
//! locates the library in its class path, stages it through an
//! [`Extractor`], and hands the extracted file to an [`ImageLoader`].
//!
//! A platform with no known build is not an error here: the outcome is
//! [`LoadOutcome::Unsupported`] so callers can fall back to a pure
//! implementation.

use camino::{Utf8Path, Utf8PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::bundle::Classpath;
use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::extract::Extractor;
use crate::image::{ImageLoader, ProcessImageLoader};
use crate::locate::{locate, versioned_library_name};
use crate::manifest::manifest_directories;
use crate::paths::{candidate_directories, dir_prefix, join_dir};
use crate::platform::{OsFamily, PlatformSignals, PlatformTuple, SystemSignals};
use crate::sysinfo::resolve_sysinfo;

/// Result of a staging request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The library was extracted and loaded into the process.
    Loaded {
        /// Path of the extracted file.
        path: Utf8PathBuf,
        /// Platform the library was selected for.
        platform: PlatformTuple,
    },
    /// The library was extracted but not loaded.
    Extracted {
        /// Path of the extracted file.
        path: Utf8PathBuf,
        /// Platform the library was selected for.
        platform: PlatformTuple,
    },
    /// No build is available for this platform.
    Unsupported {
        /// Why the platform could not be served.
        reason: String,
    },
}

impl LoadOutcome {
    /// Path of the extracted file, if there is one.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Loaded { path, .. } | Self::Extracted { path, .. } => Some(path),
            Self::Unsupported { .. } => None,
        }
    }

    /// Platform the library was selected for, if one was.
    #[must_use]
    pub const fn platform(&self) -> Option<&PlatformTuple> {
        match self {
            Self::Loaded { platform, .. } | Self::Extracted { platform, .. } => Some(platform),
            Self::Unsupported { .. } => None,
        }
    }

    /// Whether the library is now loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Stages native libraries from a class path and loads them.
///
/// # Examples
///
/// ```no_run
/// use nativelib::bundle::{Classpath, DirectoryBundle};
/// use nativelib::loader::{LoadOutcome, NativeLoader};
///
/// let classpath = Classpath::new().with(DirectoryBundle::new("/opt/app/lib"));
/// let mut loader = NativeLoader::new(classpath);
/// match loader.stage_and_load::<&str>("dummy", &[]) {
///     Ok(LoadOutcome::Loaded { path, .. }) => println!("loaded {path}"),
///     Ok(other) => println!("running without native code: {other:?}"),
///     Err(err) => eprintln!("{err}"),
/// }
/// ```
pub struct NativeLoader {
    classpath: Classpath,
    config: LoaderConfig,
    signals: Box<dyn PlatformSignals + Send>,
    image_loader: Box<dyn ImageLoader + Send>,
    extractor: Option<Extractor>,
}

impl NativeLoader {
    /// A loader over `classpath` with default configuration, live platform
    /// signals, and the process image loader.
    #[must_use]
    pub fn new(classpath: Classpath) -> Self {
        Self {
            classpath,
            config: LoaderConfig::default(),
            signals: Box::new(SystemSignals),
            image_loader: Box::new(ProcessImageLoader),
            extractor: None,
        }
    }

    /// A loader configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle path or configuration file named in
    /// the environment cannot be used.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Classpath::from_env()?).with_config(LoaderConfig::from_env()?))
    }

    /// Replace the configuration.
    ///
    /// Takes effect for the staging directory only if nothing has been
    /// extracted yet.
    #[must_use]
    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the platform signals, for example to simulate another host.
    #[must_use]
    pub fn with_signals(mut self, signals: impl PlatformSignals + Send + 'static) -> Self {
        self.signals = Box::new(signals);
        self
    }

    /// Replace the image loader.
    #[must_use]
    pub fn with_image_loader(mut self, image_loader: impl ImageLoader + Send + 'static) -> Self {
        self.image_loader = Box::new(image_loader);
        self
    }

    /// The class path searched for libraries.
    #[must_use]
    pub const fn classpath(&self) -> &Classpath {
        &self.classpath
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The staging directory, once something has been extracted.
    #[must_use]
    pub fn staging_dir(&self) -> Option<&Utf8Path> {
        self.extractor.as_ref().and_then(Extractor::staging_dir)
    }

    /// Resolve the platform from this loader's signals.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::UnsupportedPlatform`] when the OS family cannot
    /// be determined.
    pub fn platform(&self) -> Result<PlatformTuple> {
        PlatformTuple::from_signals(self.signals.as_ref())
    }

    /// Bundle directories to probe for `platform`, in priority order.
    ///
    /// Configured search roots come before `search_roots`. When the platform
    /// is not in the default table, the override roots are probed directly:
    /// first `{root}/{canonical path}/`, then `{root}/`.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::UnmappedPlatform`] when the platform is not in
    /// the default table and no override roots exist.
    pub fn candidates<S: AsRef<str>>(
        &self,
        platform: &PlatformTuple,
        search_roots: &[S],
    ) -> Result<Vec<String>> {
        let overrides: Vec<&str> = self
            .config
            .search_roots
            .iter()
            .map(String::as_str)
            .chain(search_roots.iter().map(AsRef::as_ref))
            .collect();
        match candidate_directories(platform, &overrides) {
            Err(err @ LoaderError::UnmappedPlatform { .. }) if !overrides.is_empty() => {
                log::warn!("{err}; probing override roots only");
                let canonical = platform.canonical_path();
                Ok(overrides
                    .iter()
                    .flat_map(|root| [join_dir(root, &canonical), dir_prefix(root)])
                    .collect())
            }
            other => other,
        }
    }

    /// Locate and extract `name` without loading it.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::ResourceNotFound`] when no candidate directory
    /// holds the library, or [`LoaderError::ExtractionIo`] when it cannot be
    /// written. Platform errors become [`LoadOutcome::Unsupported`].
    pub fn extract_only<S: AsRef<str>>(
        &mut self,
        name: &str,
        search_roots: &[S],
    ) -> Result<LoadOutcome> {
        let (platform, candidates) = match self.plan(search_roots) {
            Ok(plan) => plan,
            Err(err) if err.is_platform_error() => {
                log::warn!("{err}; continuing without native library {name}");
                return Ok(LoadOutcome::Unsupported {
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        };
        let located = locate(&self.classpath, &candidates, name, platform.family())?;
        let extractor = self
            .extractor
            .get_or_insert_with(|| Extractor::new(&self.config));
        let path = extractor.extract(&self.classpath, &located)?;
        Ok(LoadOutcome::Extracted { path, platform })
    }

    /// Locate, extract, and load `name`.
    ///
    /// # Errors
    ///
    /// As [`Self::extract_only`], plus [`LoaderError::NativeLoad`] when the
    /// extracted file is rejected by the image loader.
    pub fn stage_and_load<S: AsRef<str>>(
        &mut self,
        name: &str,
        search_roots: &[S],
    ) -> Result<LoadOutcome> {
        match self.extract_only(name, search_roots)? {
            LoadOutcome::Extracted { path, platform } => {
                self.image_loader.load(&path)?;
                Ok(LoadOutcome::Loaded { path, platform })
            }
            other => Ok(other),
        }
    }

    /// As [`Self::stage_and_load`] for `{name}-{version}`.
    ///
    /// An empty or missing version loads the plain name.
    ///
    /// # Errors
    ///
    /// As [`Self::stage_and_load`].
    pub fn stage_and_load_versioned<S: AsRef<str>>(
        &mut self,
        name: &str,
        version: Option<&str>,
        search_roots: &[S],
    ) -> Result<LoadOutcome> {
        self.stage_and_load(&versioned_library_name(name, version), search_roots)
    }

    /// Extract every library listed in the class path's manifests.
    ///
    /// Works on unmapped and unrecognised platforms too; only the
    /// platform-specific manifest directories are skipped.
    ///
    /// # Errors
    ///
    /// As [`Extractor::extract_registered`].
    pub fn extract_registered(&mut self) -> Result<Vec<Utf8PathBuf>> {
        let platform = match self.platform() {
            Ok(platform) => Some(platform),
            Err(err) if err.is_platform_error() => {
                log::debug!("{err}; using platform-independent manifest directories");
                None
            }
            Err(err) => return Err(err),
        };
        let sysinfo = resolve_sysinfo(self.config.sysinfo.as_deref(), self.signals.as_ref());
        let dirs = manifest_directories(platform.as_ref(), &sysinfo);
        let family = platform.as_ref().map_or(OsFamily::Unknown, PlatformTuple::family);
        let extractor = self
            .extractor
            .get_or_insert_with(|| Extractor::new(&self.config));
        extractor.extract_registered(&self.classpath, &dirs, family)
    }

    fn plan<S: AsRef<str>>(&self, search_roots: &[S]) -> Result<(PlatformTuple, Vec<String>)> {
        let platform = self.platform()?;
        let candidates = self.candidates(&platform, search_roots)?;
        log::debug!("probing {} directories for {platform}", candidates.len());
        Ok((platform, candidates))
    }
}

impl std::fmt::Debug for NativeLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLoader")
            .field("classpath", &self.classpath)
            .field("config", &self.config)
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}

static DEFAULT_LOADER: Mutex<Option<NativeLoader>> = Mutex::new(None);

fn with_default_loader<T>(action: impl FnOnce(&mut NativeLoader) -> Result<T>) -> Result<T> {
    let mut slot = DEFAULT_LOADER.lock().unwrap_or_else(PoisonError::into_inner);
    let loader = match slot.take() {
        Some(loader) => loader,
        None => NativeLoader::from_env()?,
    };
    action(slot.insert(loader))
}

/// Stage and load `name` with the process-wide loader.
///
/// The process-wide loader is built from the environment on first use and
/// keeps its staging directory for the life of the process.
///
/// # Errors
///
/// As [`NativeLoader::stage_and_load`], plus any error building the loader
/// from the environment.
pub fn stage_and_load<S: AsRef<str>>(name: &str, search_roots: &[S]) -> Result<LoadOutcome> {
    with_default_loader(|loader| loader.stage_and_load(name, search_roots))
}

/// Stage and load `{name}-{version}` with the process-wide loader.
///
/// Pass `Some(env!("CARGO_PKG_VERSION"))` to load the build matching the
/// calling crate.
///
/// # Errors
///
/// As [`stage_and_load`].
pub fn stage_and_load_versioned<S: AsRef<str>>(
    name: &str,
    version: Option<&str>,
    search_roots: &[S],
) -> Result<LoadOutcome> {
    with_default_loader(|loader| loader.stage_and_load_versioned(name, version, search_roots))
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
