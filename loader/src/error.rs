//! Error types for native library staging and loading.
//!
//! The variants separate "we could not tell which build to use" from "we
//! could not find or copy the build" and from "the operating system refused
//! the file we extracted", so callers can report each case differently.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving, extracting, or loading a library.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The operating system family could not be derived from its name.
    #[error("unsupported platform: OS family cannot be determined from \"{os_name}\"")]
    UnsupportedPlatform {
        /// The raw OS name that failed to match.
        os_name: String,
    },

    /// The platform was recognised but has no entry in the path table.
    #[error("no library path mapping for platform {platform}")]
    UnmappedPlatform {
        /// Canonical path of the unmapped platform.
        platform: String,
    },

    /// None of the candidate directories held a matching library file.
    #[error("native library {name} not found; searched: {}", searched.join(", "))]
    ResourceNotFound {
        /// The logical or physical library name that was requested.
        name: String,
        /// Every bundle path that was probed, in probe order.
        searched: Vec<String>,
    },

    /// A staging directory or extracted file could not be written.
    #[error("failed to extract native library to {path}")]
    ExtractionIo {
        /// Path that was being created or written.
        path: Utf8PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The extracted file was rejected by the dynamic loader.
    #[error("failed to load native library {path}: {reason}")]
    NativeLoad {
        /// Path of the extracted file handed to the loader.
        path: Utf8PathBuf,
        /// Loader diagnostic.
        reason: String,
    },

    /// Loader configuration could not be read or parsed.
    #[error("invalid loader configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// A bundle could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoaderError {
    /// Whether this error means the current platform has no usable build.
    ///
    /// The orchestrator reports these as an unsupported outcome rather than
    /// a failure, so callers can continue without native acceleration.
    #[must_use]
    pub const fn is_platform_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform { .. } | Self::UnmappedPlatform { .. }
        )
    }

    pub(crate) fn extraction(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::ExtractionIo {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using [`LoaderError`].
pub type Result<T> = std::result::Result<T, LoaderError>;
