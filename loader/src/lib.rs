//! Platform-aware native library staging and loading.
//!
//! This crate finds the build of a native library that matches the running
//! platform inside a packaged bundle, copies it to a private staging
//! directory, and loads it into the process. It is used by the `nativelib`
//! CLI binary and is meant to be embedded by hosts that ship native code
//! inside archives.
//!
//! ```no_run
//! use nativelib::LoadOutcome;
//!
//! match nativelib::stage_and_load::<&str>("dummy", &[]) {
//!     Ok(LoadOutcome::Loaded { path, .. }) => log::info!("loaded {path}"),
//!     Ok(other) => log::warn!("native acceleration unavailable: {other:?}"),
//!     Err(err) => log::error!("{err}"),
//! }
//! ```
//!
//! # Modules
//!
//! - [`bundle`] - Resource bundles: directories, zip archives, embedded data
//! - [`cleanup`] - Removal of leftover staging directories
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Loader configuration from TOML and the environment
//! - [`error`] - Error types
//! - [`extract`] - Extraction into the staging directory
//! - [`image`] - Loading extracted files into the process
//! - [`loader`] - End-to-end staging and loading
//! - [`locate`] - Library name mapping and bundle lookup
//! - [`manifest`] - Bulk-extraction manifests
//! - [`paths`] - Platform search paths
//! - [`platform`] - Platform identification
//! - [`staging`] - Uniquely named staging directories
//! - [`sysinfo`] - System-info directory names

pub mod bundle;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod image;
pub mod loader;
pub mod locate;
pub mod manifest;
pub mod paths;
pub mod platform;
pub mod staging;
pub mod sysinfo;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use error::{LoaderError, Result};
pub use loader::{LoadOutcome, NativeLoader, stage_and_load, stage_and_load_versioned};
pub use platform::{PlatformTuple, resolve_platform};
