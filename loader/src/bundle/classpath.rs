//! Ordered bundle search, the equivalent of a class path.

use camino::{Utf8Path, Utf8PathBuf};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, Write};

use super::{DirectoryBundle, EmbeddedBundle, ResourceBundle, ZipBundle, not_found};
use crate::error::{LoaderError, Result};

/// Environment variable holding an OS path list of bundles.
pub const BUNDLE_PATH_ENV: &str = "NATIVELIB_BUNDLE_PATH";

/// Bundles searched in order; the first one holding a path wins.
#[derive(Default)]
pub struct Classpath {
    members: Vec<Box<dyn ResourceBundle>>,
}

impl Classpath {
    /// Create an empty class path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bundle.
    pub fn push(&mut self, bundle: impl ResourceBundle + 'static) {
        self.members.push(Box::new(bundle));
    }

    /// Builder-style variant of [`Self::push`].
    #[must_use]
    pub fn with(mut self, bundle: impl ResourceBundle + 'static) -> Self {
        self.push(bundle);
        self
    }

    /// The member bundles, in search order.
    pub fn members(&self) -> impl Iterator<Item = &dyn ResourceBundle> {
        self.members.iter().map(|member| &**member as &dyn ResourceBundle)
    }

    /// Build a class path from an OS path list such as `a.jar:dir:b.tar.zst`.
    ///
    /// # Errors
    ///
    /// Returns an error if an element is not valid UTF-8 or cannot be opened.
    pub fn from_search_path(value: &OsStr) -> Result<Self> {
        let mut classpath = Self::new();
        for path in std::env::split_paths(value) {
            if path.as_os_str().is_empty() {
                continue;
            }
            let utf8 = Utf8PathBuf::from_path_buf(path).map_err(|path| {
                LoaderError::InvalidConfig {
                    reason: format!("bundle path is not valid UTF-8: {}", path.display()),
                }
            })?;
            classpath.members.push(open_bundle(&utf8)?);
        }
        Ok(classpath)
    }

    /// Build the default class path for this process.
    ///
    /// Uses [`BUNDLE_PATH_ENV`] when set, otherwise the directory holding the
    /// running executable.
    ///
    /// # Errors
    ///
    /// Returns an error if a listed bundle cannot be opened or the executable
    /// location cannot be determined.
    pub fn from_env() -> Result<Self> {
        if let Some(value) = std::env::var_os(BUNDLE_PATH_ENV).filter(|v| !v.is_empty()) {
            return Self::from_search_path(&value);
        }
        let exe = std::env::current_exe()?;
        let dir = exe
            .parent()
            .map(std::path::Path::to_path_buf)
            .ok_or_else(|| LoaderError::InvalidConfig {
                reason: format!("executable {} has no parent directory", exe.display()),
            })?;
        let utf8 = Utf8PathBuf::from_path_buf(dir).map_err(|dir| LoaderError::InvalidConfig {
            reason: format!("executable directory is not valid UTF-8: {}", dir.display()),
        })?;
        Ok(Self::new().with(DirectoryBundle::new(utf8)))
    }

    fn find(&self, path: &str) -> Option<&dyn ResourceBundle> {
        self.members().find(|member| member.contains(path))
    }
}

impl ResourceBundle for Classpath {
    fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    fn copy_to(&self, path: &str, out: &mut dyn Write) -> io::Result<u64> {
        match self.find(path) {
            Some(member) => member.copy_to(path, out),
            None => Err(not_found(path, &self.describe())),
        }
    }

    fn describe(&self) -> String {
        let members: Vec<String> = self.members().map(|member| member.describe()).collect();
        format!("classpath [{}]", members.join(", "))
    }
}

impl std::fmt::Debug for Classpath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Open a single bundle, choosing the kind from the path.
///
/// Directories become [`DirectoryBundle`]s, `.tar.zst` files are indexed
/// into an [`EmbeddedBundle`], and any other file is read as a zip archive.
///
/// # Errors
///
/// Returns an error if the path does not exist or cannot be read as the
/// chosen kind.
pub fn open_bundle(path: &Utf8Path) -> Result<Box<dyn ResourceBundle>> {
    if path.is_dir() {
        return Ok(Box::new(DirectoryBundle::new(path)));
    }
    if path.as_str().ends_with(".tar.zst") {
        let file = File::open(path)?;
        return Ok(Box::new(EmbeddedBundle::from_tar_zst(
            file,
            format!("archive {path}"),
        )?));
    }
    Ok(Box::new(ZipBundle::open(path)?))
}
