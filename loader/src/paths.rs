//! Bundle search paths for a platform.
//!
//! Every known platform maps to an ordered list of directory names: the
//! canonical `{family}-{architecture}-{bitness}` name first, then legacy
//! names that older bundles were published under. Legacy names are never
//! removed because packages in the wild may only ship under them.
//!
//! A bundle is probed under several roots: `natives/` first, then any roots
//! the caller supplies, then the bundle root and `META-INF/lib/`. The last
//! two keep bundles laid out under earlier conventions loadable.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{LoaderError, Result};
use crate::platform::arch::{
    ARCH_AARCH_64, ARCH_ARM_32, ARCH_ITANIUM_64, ARCH_PPC_64, ARCH_PPCLE_32, ARCH_PPCLE_64,
    ARCH_SPARC_32, ARCH_SPARC_64, ARCH_X86_32, ARCH_X86_64,
};
use crate::platform::{Bitness, OsFamily, PlatformTuple};

/// Root under which current bundles place their platform directories.
pub const DEFAULT_SEARCH_ROOT: &str = "natives/";

/// Roots probed after caller overrides: the bundle root, then the historical
/// `META-INF/lib/` directory.
pub const LEGACY_SEARCH_ROOTS: [&str; 2] = ["", "META-INF/lib/"];

/// The platforms shipped by default, with their legacy directory names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultPlatform {
    /// AIX on 32-bit PowerPC.
    AixPpc32,
    /// Linux on 32-bit ARM.
    LinuxArm32,
    /// Linux on 32-bit x86.
    LinuxX86_32,
    /// macOS on 32-bit PowerPC.
    MacosPpc32,
    /// Solaris on 32-bit SPARC.
    SolarisSparc32,
    /// Windows on 32-bit x86.
    WindowsX86_32,
    /// AIX on 64-bit PowerPC.
    AixPpc64,
    /// Linux on 64-bit x86.
    LinuxX86_64,
    /// Linux on 64-bit ARM.
    LinuxAarch64,
    /// Linux on 64-bit little-endian PowerPC.
    LinuxPpc64le,
    /// macOS on 64-bit x86.
    MacosX86_64,
    /// macOS on Apple silicon.
    MacosAarch64,
    /// Solaris on 64-bit SPARC.
    SolarisSparcv9,
    /// Windows on 64-bit x86.
    WindowsX86_64,
    /// Windows on EM64T; the same tuple as [`Self::WindowsX86_64`].
    WindowsEm64t,
    /// Windows on Itanium.
    WindowsIa64,
}

impl DefaultPlatform {
    /// Every default platform, in table order.
    pub const ALL: [Self; 16] = [
        Self::AixPpc32,
        Self::LinuxArm32,
        Self::LinuxX86_32,
        Self::MacosPpc32,
        Self::SolarisSparc32,
        Self::WindowsX86_32,
        Self::AixPpc64,
        Self::LinuxX86_64,
        Self::LinuxAarch64,
        Self::LinuxPpc64le,
        Self::MacosX86_64,
        Self::MacosAarch64,
        Self::SolarisSparcv9,
        Self::WindowsX86_64,
        Self::WindowsEm64t,
        Self::WindowsIa64,
    ];

    const fn spec(self) -> (OsFamily, &'static str, Bitness, &'static [&'static str]) {
        use Bitness::{Bits32, Bits64};
        use OsFamily::{Aix, Linux, Osx, Solaris, Windows};
        match self {
            Self::AixPpc32 => (Aix, ARCH_PPCLE_32, Bits32, &["aix_32"]),
            Self::LinuxArm32 => (Linux, ARCH_ARM_32, Bits32, &["linux_arm"]),
            Self::LinuxX86_32 => (Linux, ARCH_X86_32, Bits32, &["linux_32"]),
            Self::MacosPpc32 => (Osx, ARCH_PPCLE_32, Bits32, &["osx_32"]),
            Self::SolarisSparc32 => (Solaris, ARCH_SPARC_32, Bits32, &["solaris_32"]),
            Self::WindowsX86_32 => (Windows, ARCH_X86_32, Bits32, &["windows_32"]),
            Self::AixPpc64 => (Aix, ARCH_PPC_64, Bits64, &["aix_64"]),
            Self::LinuxX86_64 => (Linux, ARCH_X86_64, Bits64, &["linux_64"]),
            Self::LinuxAarch64 => (Linux, ARCH_AARCH_64, Bits64, &["linux_arm64"]),
            Self::LinuxPpc64le => (Linux, ARCH_PPCLE_64, Bits64, &["linux_64"]),
            Self::MacosX86_64 => (Osx, ARCH_X86_64, Bits64, &["osx_64"]),
            Self::MacosAarch64 => (Osx, ARCH_AARCH_64, Bits64, &["osx_arm64"]),
            Self::SolarisSparcv9 => (Solaris, ARCH_SPARC_64, Bits64, &["solaris_64"]),
            Self::WindowsX86_64 | Self::WindowsEm64t => {
                (Windows, ARCH_X86_64, Bits64, &["windows_64"])
            }
            Self::WindowsIa64 => (Windows, ARCH_ITANIUM_64, Bits64, &["windows_64"]),
        }
    }

    /// The platform tuple for this entry.
    #[must_use]
    pub fn tuple(self) -> PlatformTuple {
        let (family, arch, bitness, _) = self.spec();
        PlatformTuple::new(family, arch, bitness)
    }

    /// Legacy directory names kept searchable for this entry.
    #[must_use]
    pub const fn legacy_paths(self) -> &'static [&'static str] {
        self.spec().3
    }
}

/// Read-only map from platform tuple to its ordered directory names.
#[derive(Debug, Default)]
pub struct PathMapping {
    entries: HashMap<PlatformTuple, Vec<String>>,
}

impl PathMapping {
    /// Build the mapping from the default platform table.
    ///
    /// When two entries share a tuple the first one wins.
    #[must_use]
    pub fn from_defaults() -> Self {
        let mut entries = HashMap::new();
        for platform in DefaultPlatform::ALL {
            let tuple = platform.tuple();
            entries.entry(tuple).or_insert_with_key(|tuple| {
                std::iter::once(tuple.canonical_path())
                    .chain(platform.legacy_paths().iter().map(|p| (*p).to_owned()))
                    .collect()
            });
        }
        Self { entries }
    }

    /// Directory names for a tuple, canonical first.
    #[must_use]
    pub fn get(&self, tuple: &PlatformTuple) -> Option<&[String]> {
        self.entries.get(tuple).map(Vec::as_slice)
    }

    /// Number of distinct platforms in the mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static DEFAULT_MAPPING: LazyLock<PathMapping> = LazyLock::new(PathMapping::from_defaults);

/// The process-wide default mapping, built on first use.
#[must_use]
pub fn default_mapping() -> &'static PathMapping {
    &DEFAULT_MAPPING
}

/// Directory names for a platform, canonical first, then legacy aliases.
///
/// # Errors
///
/// Returns [`LoaderError::UnmappedPlatform`] when the tuple is not in the
/// default table.
pub fn platform_paths(tuple: &PlatformTuple) -> Result<&'static [String]> {
    default_mapping()
        .get(tuple)
        .ok_or_else(|| LoaderError::UnmappedPlatform {
            platform: tuple.canonical_path(),
        })
}

/// Directory names for a platform, optionally prefixed by a search root.
///
/// With no root the bare names are returned. With a root every entry is
/// `{root}/{name}/`, always `/`-terminated; an empty root yields `{name}/`.
///
/// # Errors
///
/// Returns [`LoaderError::UnmappedPlatform`] when the tuple is not in the
/// default table.
///
/// # Examples
///
/// ```
/// use nativelib::paths::platform_library_paths;
/// use nativelib::platform::{Bitness, OsFamily, PlatformTuple};
///
/// let linux = PlatformTuple::new(OsFamily::Linux, "amd64", Bitness::Bits64);
/// let paths = platform_library_paths(Some("natives"), &linux).expect("mapped");
/// assert_eq!(paths, ["natives/linux-x86_64-64/", "natives/linux_64/"]);
/// ```
pub fn platform_library_paths(root: Option<&str>, tuple: &PlatformTuple) -> Result<Vec<String>> {
    let names = platform_paths(tuple)?;
    Ok(match root {
        None => names.to_vec(),
        Some(root) => names.iter().map(|name| join_dir(root, name)).collect(),
    })
}

/// The ordered search roots: default, caller overrides, then legacy roots.
#[must_use]
pub fn search_roots<S: AsRef<str>>(overrides: &[S]) -> Vec<String> {
    let mut roots = vec![DEFAULT_SEARCH_ROOT.to_owned()];
    roots.extend(overrides.iter().map(|root| dir_prefix(root.as_ref())));
    roots.extend(LEGACY_SEARCH_ROOTS.iter().map(|root| (*root).to_owned()));
    dedup_in_order(roots)
}

/// Every bundle directory to probe for a platform, in priority order.
///
/// Roots are the outer loop, so a library under `natives/` always beats one
/// under a legacy root, and within a root the canonical name beats legacy
/// names.
///
/// # Errors
///
/// Returns [`LoaderError::UnmappedPlatform`] when the tuple is not in the
/// default table.
pub fn candidate_directories<S: AsRef<str>>(
    tuple: &PlatformTuple,
    overrides: &[S],
) -> Result<Vec<String>> {
    let names = platform_paths(tuple)?;
    let candidates = search_roots(overrides)
        .iter()
        .flat_map(|root| names.iter().map(move |name| join_dir(root, name)))
        .collect();
    Ok(dedup_in_order(candidates))
}

/// Join a root and a directory name into a `/`-terminated bundle path.
pub(crate) fn join_dir(root: &str, name: &str) -> String {
    format!("{}{}/", dir_prefix(root), name.trim_matches('/'))
}

/// Normalize a root to either empty or `/`-terminated.
pub(crate) fn dir_prefix(root: &str) -> String {
    let trimmed = root.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

fn dedup_in_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
