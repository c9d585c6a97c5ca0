//! The canonical platform identifier.

use serde::Serialize;
use std::fmt;

use super::arch::normalize_architecture;
use super::bitness::{Bitness, determine_bitness};
use super::family::{OsFamily, determine_os_family};
use super::signals::PlatformSignals;
use crate::error::Result;

/// An immutable `(family, architecture, bitness, special)` identifier.
///
/// The architecture is normalized and the special qualifier lowercased at
/// construction, so equality is plain field equality.
///
/// # Examples
///
/// ```
/// use nativelib::platform::{Bitness, OsFamily, PlatformTuple};
///
/// let tuple = PlatformTuple::new(OsFamily::Aix, "ppc64", Bitness::Bits64);
/// assert_eq!(tuple.canonical_path(), "aix-ppc_64-64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PlatformTuple {
    family: OsFamily,
    architecture: String,
    bitness: Bitness,
    special: String,
}

impl PlatformTuple {
    /// Build a tuple from an already-known family.
    #[must_use]
    pub fn new(family: OsFamily, architecture: &str, bitness: Bitness) -> Self {
        Self {
            family,
            architecture: normalize_architecture(architecture),
            bitness,
            special: String::new(),
        }
    }

    /// Build a tuple from a raw OS name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LoaderError::UnsupportedPlatform`] when the OS family
    /// cannot be determined.
    pub fn from_os_name(os_name: &str, architecture: &str, bitness: Bitness) -> Result<Self> {
        let family = determine_os_family(os_name)?;
        Ok(Self::new(family, architecture, bitness))
    }

    /// Build a tuple from the signals of a (real or simulated) process.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LoaderError::UnsupportedPlatform`] when the OS family
    /// cannot be determined.
    pub fn from_signals(signals: &dyn PlatformSignals) -> Result<Self> {
        let family = determine_os_family(&signals.os_name())?;
        let bitness = determine_bitness(signals);
        Ok(Self::new(family, &signals.arch(), bitness))
    }

    /// Return a copy carrying the given special qualifier.
    #[must_use]
    pub fn with_special(mut self, special: &str) -> Self {
        self.special = special.trim().to_lowercase();
        self
    }

    /// The OS family.
    #[must_use]
    pub const fn family(&self) -> OsFamily {
        self.family
    }

    /// The canonical architecture fragment.
    #[must_use]
    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    /// The pointer width.
    #[must_use]
    pub const fn bitness(&self) -> Bitness {
        self.bitness
    }

    /// The special qualifier; empty when none was given.
    #[must_use]
    pub fn special(&self) -> &str {
        &self.special
    }

    /// Format the tuple as `{family}-{architecture}-{bitness}[-{special}]`.
    #[must_use]
    pub fn canonical_path(&self) -> String {
        let base = format!("{}-{}-{}", self.family, self.architecture, self.bitness);
        if self.special.is_empty() {
            base
        } else {
            format!("{base}-{}", self.special)
        }
    }
}

impl fmt::Display for PlatformTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_path())
    }
}
