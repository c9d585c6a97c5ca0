//! Loader configuration.
//!
//! Settings are read from an optional TOML file and then patched from
//! environment variables, so packaging tools can pin a temp directory or
//! disable leftover cleanup without touching code. Unknown keys are rejected
//! to catch typos early.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{LoaderError, Result};

/// Environment variable naming a TOML configuration file.
pub const CONFIG_ENV: &str = "NATIVELIB_CONFIG";
/// Environment variable overriding the temp root for staging directories.
pub const TMPDIR_ENV: &str = "NATIVELIB_TMPDIR";
/// Environment variable overriding the leftover cleanup age, in milliseconds.
pub const LEFTOVER_MIN_AGE_ENV: &str = "NATIVELIB_LEFTOVER_MIN_AGE_MS";
/// Environment variable overriding the system-info directory name.
pub const SYSINFO_ENV: &str = "NATIVELIB_SYSINFO";

/// How extracted files are isolated from other loaders in the same process.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum IsolationPolicy {
    /// Every extraction goes into the extractor's staging directory.
    ///
    /// A library image can only be attached once per process, so this fails
    /// when two independent hosts in one process load the same library.
    #[default]
    Shared,
    /// Each context gets its own subdirectory and therefore its own copy.
    PerContext {
        /// Friendly name embedded in the subdirectory name.
        context: String,
    },
}

/// Settings for staging and loading native libraries.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Temp root for staging directories; the system temp dir when unset.
    pub temp_dir: Option<Utf8PathBuf>,
    /// Root used when the temp root cannot be created.
    pub fallback_temp_dir: Utf8PathBuf,
    /// Minimum age before a leftover staging directory is removed.
    pub leftover_min_age_ms: u64,
    /// Extra search roots probed after `natives/` and before legacy roots.
    pub search_roots: Vec<String>,
    /// Override for the system-info directory used by bulk extraction.
    pub sysinfo: Option<String>,
    /// Keep the staging directory when the extractor is dropped.
    pub keep_staging: bool,
    /// Isolation policy for extracted files.
    pub isolation: IsolationPolicy,
}

impl LoaderConfig {
    /// Default leftover age: five minutes.
    pub const DEFAULT_LEFTOVER_MIN_AGE_MS: u64 = 5 * 60 * 1000;

    /// Default fallback temp root, relative to the working directory.
    pub const DEFAULT_FALLBACK_TEMP_DIR: &'static str = "./tmplib";

    /// Minimum age as a [`Duration`].
    #[must_use]
    pub const fn leftover_min_age(&self) -> Duration {
        Duration::from_millis(self.leftover_min_age_ms)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidConfig`] when the text does not parse or
    /// contains unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use nativelib::config::LoaderConfig;
    ///
    /// let config = LoaderConfig::from_toml_str("leftover_min_age_ms = 0\n")
    ///     .expect("valid configuration");
    /// assert_eq!(config.leftover_min_age_ms, 0);
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|err| LoaderError::InvalidConfig {
            reason: err.to_string(),
        })
    }

    /// Read configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidConfig`] when the file cannot be read or
    /// parsed.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|err| LoaderError::InvalidConfig {
            reason: format!("failed to read {path}: {err}"),
        })?;
        Self::from_toml_str(&source).map_err(|err| match err {
            LoaderError::InvalidConfig { reason } => LoaderError::InvalidConfig {
                reason: format!("{path}: {reason}"),
            },
            other => other,
        })
    }

    /// Build configuration for this process.
    ///
    /// Reads the file named by [`CONFIG_ENV`] when set, then applies the
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidConfig`] when the configuration file is
    /// named but unusable.
    pub fn from_env() -> Result<Self> {
        let base = match env_value(CONFIG_ENV) {
            Some(path) => Self::load(Utf8Path::new(&path))?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides(env_value))
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Blank values count as unset. A malformed leftover age is logged and
    /// ignored, keeping the previous value.
    #[must_use]
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(dir) = lookup(TMPDIR_ENV) {
            self.temp_dir = Some(Utf8PathBuf::from(dir));
        }
        if let Some(raw) = lookup(LEFTOVER_MIN_AGE_ENV) {
            match raw.trim().parse() {
                Ok(ms) => self.leftover_min_age_ms = ms,
                Err(err) => log::error!(
                    "ignoring {LEFTOVER_MIN_AGE_ENV}={raw:?}: {err}; keeping {}ms",
                    self.leftover_min_age_ms
                ),
            }
        }
        if let Some(sysinfo) = lookup(SYSINFO_ENV) {
            self.sysinfo = Some(sysinfo);
        }
        self
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            fallback_temp_dir: Utf8PathBuf::from(Self::DEFAULT_FALLBACK_TEMP_DIR),
            leftover_min_age_ms: Self::DEFAULT_LEFTOVER_MIN_AGE_MS,
            search_roots: Vec::new(),
            sysinfo: None,
            keep_staging: false,
            isolation: IsolationPolicy::default(),
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
