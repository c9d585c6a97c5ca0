//! Operating system family detection.
//!
//! Raw OS names differ between runtimes and releases ("Linux", "Mac OS X",
//! "Windows 11", "SunOS"). Detection matches fixed tokens in a fixed order so
//! that names containing more than one token resolve the same way everywhere.

use crate::error::{LoaderError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Top-level operating system category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Linux and other Unix-like systems matched by `nix`/`nux`.
    Linux,
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    Osx,
    /// IBM AIX.
    Aix,
    /// Oracle Solaris and SunOS.
    Solaris,
    /// IBM z/OS.
    Zos,
    /// A family that is named explicitly but not otherwise known.
    Unknown,
}

/// Ordered detection table. Solaris comes first so that names which also
/// carry a later token still resolve to it.
const FAMILY_TOKENS: &[(&[&str], OsFamily)] = &[
    (&["solaris", "sunos"], OsFamily::Solaris),
    (&["nix", "nux"], OsFamily::Linux),
    (&["win"], OsFamily::Windows),
    (&["mac"], OsFamily::Osx),
    (&["aix"], OsFamily::Aix),
];

impl OsFamily {
    /// Every family, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Linux,
        Self::Windows,
        Self::Osx,
        Self::Aix,
        Self::Solaris,
        Self::Zos,
        Self::Unknown,
    ];

    /// Return the canonical lowercase name used in directory paths.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Osx => "osx",
            Self::Aix => "aix",
            Self::Solaris => "solaris",
            Self::Zos => "zos",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsFamily {
    type Err = LoaderError;

    /// Parse a canonical family name such as `linux` or `zos`.
    ///
    /// Unlike [`determine_os_family`], this does no substring matching.
    fn from_str(value: &str) -> Result<Self> {
        let lowered = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|family| family.as_str() == lowered)
            .ok_or_else(|| LoaderError::UnsupportedPlatform {
                os_name: value.to_owned(),
            })
    }
}

/// Derive the OS family from a raw OS name.
///
/// # Errors
///
/// Returns [`LoaderError::UnsupportedPlatform`] when no token matches.
///
/// # Examples
///
/// ```
/// use nativelib::platform::{OsFamily, determine_os_family};
///
/// assert_eq!(determine_os_family("Mac OS X").expect("known"), OsFamily::Osx);
/// assert_eq!(determine_os_family("SunOS").expect("known"), OsFamily::Solaris);
/// ```
pub fn determine_os_family(os_name: &str) -> Result<OsFamily> {
    let lowered = os_name.to_lowercase();
    FAMILY_TOKENS
        .iter()
        .find(|(tokens, _)| tokens.iter().any(|token| lowered.contains(token)))
        .map(|(_, family)| *family)
        .ok_or_else(|| LoaderError::UnsupportedPlatform {
            os_name: os_name.to_owned(),
        })
}
