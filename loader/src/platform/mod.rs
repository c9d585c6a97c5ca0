//! Platform identification.
//!
//! Turns raw, runtime-specific OS and architecture strings into a
//! [`PlatformTuple`] whose canonical path names a bundle directory.
//!
//! # Sub-modules
//!
//! - [`arch`]: architecture alias table and normalization.
//! - [`bitness`]: pointer-width detection.
//! - [`family`]: OS family detection.
//! - [`signals`]: raw process signals and their environment overrides.
//! - [`tuple`]: the immutable platform identifier.

pub mod arch;
pub mod bitness;
pub mod family;
pub mod signals;
pub mod tuple;

pub use arch::normalize_architecture;
pub use bitness::{Bitness, determine_bitness};
pub use family::{OsFamily, determine_os_family};
pub use signals::{PlatformSignals, SystemSignals};
pub use tuple::PlatformTuple;

use crate::error::Result;

/// Resolve the platform of the current process.
///
/// Reads the live process signals and has no other side effects; repeated
/// calls without environment changes return equal tuples. The result is
/// meant to be computed once and passed down explicitly.
///
/// # Errors
///
/// Returns [`crate::LoaderError::UnsupportedPlatform`] when the OS family
/// cannot be determined.
pub fn resolve_platform() -> Result<PlatformTuple> {
    let tuple = PlatformTuple::from_signals(&SystemSignals)?;
    log::debug!("resolved platform {tuple}");
    Ok(tuple)
}
