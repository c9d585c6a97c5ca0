//! Extraction of bundle entries onto the filesystem.
//!
//! An [`Extractor`] owns one staging directory. Construction sweeps leftover
//! staging directories from earlier processes; the extractor's own directory
//! is only created when the first file is extracted.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, Write};

use crate::bundle::{Classpath, ResourceBundle};
use crate::cleanup::{CleanupReport, remove_leftovers};
use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::locate::{LocatedResource, locate, locate_physical};
use crate::manifest::{MANIFEST_FILE_NAME, read_manifest};
use crate::paths::dir_prefix;
use crate::platform::OsFamily;
use crate::staging::{StagingDirectory, system_temp_dir};

pub use crate::config::IsolationPolicy;

/// Copies libraries out of bundles into a private staging directory.
#[derive(Debug)]
pub struct Extractor {
    temp_root: Utf8PathBuf,
    fallback_root: Utf8PathBuf,
    keep_staging: bool,
    isolation: IsolationPolicy,
    staging: Option<StagingDirectory>,
    context_dir: Option<Utf8PathBuf>,
    cleanup: CleanupReport,
    /// Files this extractor has written, mapped to the resource behind them.
    written: HashMap<Utf8PathBuf, String>,
}

impl Extractor {
    /// Create an extractor and remove leftover staging directories that are
    /// older than the configured minimum age.
    ///
    /// Both the temp root and the fallback root are swept, since staging
    /// directories land in the fallback whenever the temp root is unusable.
    #[must_use]
    pub fn new(config: &LoaderConfig) -> Self {
        let temp_root = resolve_temp_root(config);
        let min_age = config.leftover_min_age();
        let mut cleanup = remove_leftovers(&temp_root, min_age);
        if config.fallback_temp_dir != temp_root {
            cleanup.absorb(remove_leftovers(&config.fallback_temp_dir, min_age));
        }
        if !cleanup.removed.is_empty() {
            log::debug!(
                "removed {} leftover staging directories from {temp_root}",
                cleanup.removed.len()
            );
        }
        Self {
            temp_root,
            fallback_root: config.fallback_temp_dir.clone(),
            keep_staging: config.keep_staging,
            isolation: config.isolation.clone(),
            staging: None,
            context_dir: None,
            cleanup,
            written: HashMap::new(),
        }
    }

    /// Root under which the staging directory is created.
    #[must_use]
    pub fn temp_root(&self) -> &Utf8Path {
        &self.temp_root
    }

    /// What the construction-time cleanup pass did.
    #[must_use]
    pub const fn cleanup_report(&self) -> &CleanupReport {
        &self.cleanup
    }

    /// The staging directory, if one has been created yet.
    #[must_use]
    pub fn staging_dir(&self) -> Option<&Utf8Path> {
        self.staging.as_ref().map(StagingDirectory::path)
    }

    /// Directory for manifest-driven extraction, created on first call.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::ExtractionIo`] when the staging directory
    /// cannot be created.
    pub fn native_dir(&mut self) -> Result<Utf8PathBuf> {
        if let Some(staging) = &self.staging {
            return Ok(staging.path().to_owned());
        }
        let mut staging = StagingDirectory::create_with_fallback(&self.temp_root, &self.fallback_root)?;
        staging.set_keep(self.keep_staging);
        let path = staging.path().to_owned();
        self.staging = Some(staging);
        Ok(path)
    }

    /// Directory for single-library extraction, created on first call.
    ///
    /// Under [`IsolationPolicy::PerContext`] this is a subdirectory of the
    /// staging directory; otherwise it is the staging directory itself.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::ExtractionIo`] when a directory cannot be
    /// created.
    pub fn jni_dir(&mut self) -> Result<Utf8PathBuf> {
        let native = self.native_dir()?;
        let IsolationPolicy::PerContext { context } = &self.isolation else {
            return Ok(native);
        };
        if let Some(dir) = &self.context_dir {
            return Ok(dir.clone());
        }
        let Some(staging) = &self.staging else {
            return Ok(native);
        };
        let dir = staging.create_context_dir(context)?;
        self.context_dir = Some(dir.clone());
        Ok(dir)
    }

    /// Extract a located library into the JNI directory.
    ///
    /// A file this extractor already wrote is returned as is. It may back an
    /// image that is mapped into the process, so it is never rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::ExtractionIo`] when the file cannot be written;
    /// any partially written file is removed first.
    pub fn extract(
        &mut self,
        bundle: &dyn ResourceBundle,
        located: &LocatedResource,
    ) -> Result<Utf8PathBuf> {
        let target = self.jni_dir()?.join(located.file_name());
        self.write_once(bundle, located.resource_path(), target)
    }

    /// Locate `logical` in a single bundle directory and extract it.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::ResourceNotFound`] when the directory does not
    /// hold the library, or [`LoaderError::ExtractionIo`] when it cannot be
    /// written.
    pub fn extract_library(
        &mut self,
        bundle: &dyn ResourceBundle,
        directory: &str,
        logical: &str,
        family: OsFamily,
    ) -> Result<Utf8PathBuf> {
        let located = locate(bundle, &[directory], logical, family)?;
        self.extract(bundle, &located)
    }

    /// Extract every library listed in manifests found in `manifest_dirs`.
    ///
    /// Each member of `bundle` is checked for a manifest in every directory.
    /// Entries are resolved against the whole bundle, literal name first and
    /// then the platform-mapped name, and extracted into [`Self::native_dir`].
    /// An entry listed by several manifests is extracted once.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::ResourceNotFound`] for a listed entry that no
    /// directory holds, [`LoaderError::Io`] for an unreadable manifest, or
    /// [`LoaderError::ExtractionIo`] when a file cannot be written.
    pub fn extract_registered(
        &mut self,
        bundle: &Classpath,
        manifest_dirs: &[String],
        family: OsFamily,
    ) -> Result<Vec<Utf8PathBuf>> {
        let mut extracted = Vec::new();
        let mut seen = HashSet::new();
        for member in bundle.members() {
            for dir in manifest_dirs {
                let manifest = format!("{}{MANIFEST_FILE_NAME}", dir_prefix(dir));
                if !member.contains(&manifest) {
                    continue;
                }
                log::debug!("reading {manifest} from {}", member.describe());
                for entry in read_manifest(member, &manifest)? {
                    if !seen.insert(entry.clone()) {
                        continue;
                    }
                    let located = resolve_entry(bundle, manifest_dirs, &entry, family)?;
                    let target = self.native_dir()?.join(located.file_name());
                    extracted.push(self.write_once(bundle, located.resource_path(), target)?);
                }
            }
        }
        Ok(extracted)
    }

    fn write_once(
        &mut self,
        bundle: &dyn ResourceBundle,
        resource_path: &str,
        target: Utf8PathBuf,
    ) -> Result<Utf8PathBuf> {
        if let Some(source) = self.written.get(&target) {
            if source == resource_path {
                log::debug!("{target} already extracted; reusing it");
            } else {
                log::warn!("{target} already holds {source}; not replacing it with {resource_path}");
            }
            return Ok(target);
        }
        copy_entry(bundle, resource_path, &target)?;
        self.written.insert(target.clone(), resource_path.to_owned());
        Ok(target)
    }
}

/// The configured temp root, else the system temp dir, else the fallback.
fn resolve_temp_root(config: &LoaderConfig) -> Utf8PathBuf {
    config
        .temp_dir
        .clone()
        .or_else(system_temp_dir)
        .unwrap_or_else(|| config.fallback_temp_dir.clone())
}

fn resolve_entry(
    bundle: &dyn ResourceBundle,
    dirs: &[String],
    entry: &str,
    family: OsFamily,
) -> Result<LocatedResource> {
    let literal_miss = match locate_physical(bundle, dirs, entry) {
        Ok(found) => return Ok(found),
        Err(LoaderError::ResourceNotFound { searched, .. }) => searched,
        Err(other) => return Err(other),
    };
    match locate(bundle, dirs, entry, family) {
        Err(LoaderError::ResourceNotFound { searched, .. }) => Err(LoaderError::ResourceNotFound {
            name: entry.to_owned(),
            searched: literal_miss.into_iter().chain(searched).collect(),
        }),
        other => other,
    }
}

fn copy_entry(bundle: &dyn ResourceBundle, resource_path: &str, target: &Utf8Path) -> Result<()> {
    log::debug!("extracting {resource_path} from {} to {target}", bundle.describe());
    let written = File::create(target).and_then(|mut file| {
        let bytes = bundle.copy_to(resource_path, &mut file)?;
        file.flush()?;
        Ok(bytes)
    });
    match written {
        Ok(bytes) => {
            log::debug!("wrote {bytes} bytes to {target}");
            Ok(())
        }
        Err(err) => {
            discard_partial(target);
            Err(LoaderError::extraction(target, err))
        }
    }
}

fn discard_partial(target: &Utf8Path) {
    match fs::remove_file(target) {
        Ok(()) => log::debug!("removed partial file {target}"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => log::warn!("failed to remove partial file {target}: {err}"),
    }
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
