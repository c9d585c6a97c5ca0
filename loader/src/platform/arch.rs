//! Architecture name normalization.
//!
//! Runtimes disagree on what to call the same processor: `amd64`, `x86_64`
//! and `em64t` all name one instruction set. Normalization maps every known
//! alias onto a single canonical fragment used in bundle directory names.
//! Unknown names pass through lowercased so future architectures still
//! produce a usable, if non-canonical, path.

/// Canonical name for 32-bit x86.
pub const ARCH_X86_32: &str = "x86_32";
/// Canonical name for 64-bit x86.
pub const ARCH_X86_64: &str = "x86_64";
/// Canonical name for Itanium in 32-bit mode.
pub const ARCH_ITANIUM_32: &str = "itanium_32";
/// Canonical name for 64-bit Itanium.
pub const ARCH_ITANIUM_64: &str = "itanium_64";
/// Canonical name for 32-bit SPARC.
pub const ARCH_SPARC_32: &str = "sparc_32";
/// Canonical name for 64-bit SPARC.
pub const ARCH_SPARC_64: &str = "sparc_64";
/// Canonical name for 32-bit ARM.
pub const ARCH_ARM_32: &str = "arm_32";
/// Canonical name for 64-bit ARM.
pub const ARCH_AARCH_64: &str = "aarch_64";
/// Canonical name for 32-bit big-endian PowerPC.
pub const ARCH_PPC_32: &str = "ppc_32";
/// Canonical name for 64-bit big-endian PowerPC.
pub const ARCH_PPC_64: &str = "ppc_64";
/// Canonical name for 32-bit little-endian PowerPC.
pub const ARCH_PPCLE_32: &str = "ppcle";
/// Canonical name for 64-bit little-endian PowerPC.
pub const ARCH_PPCLE_64: &str = "ppcle_64";

/// Alias sets, checked in order. The `powerpc*` spellings are the ones the
/// Rust toolchain reports.
pub const ARCHITECTURE_ALIASES: &[(&str, &[&str])] = &[
    (
        ARCH_X86_32,
        &["x8632", "x86", "i386", "i486", "i586", "i686", "ia32", "x32"],
    ),
    (ARCH_X86_64, &["x8664", "amd64", "ia32e", "em64t", "x64"]),
    (ARCH_ITANIUM_32, &["ia64n"]),
    (ARCH_ITANIUM_64, &["ia64", "ia64w", "itanium64"]),
    (ARCH_SPARC_32, &["sparc", "sparc32"]),
    (ARCH_SPARC_64, &["sparcv9", "sparc64"]),
    (ARCH_AARCH_64, &["aarch64"]),
    (ARCH_ARM_32, &["arm", "arm32"]),
    (ARCH_PPC_32, &["ppc", "powerpc"]),
    (ARCH_PPC_64, &["ppc64", "powerpc64"]),
    (ARCH_PPCLE_32, &["ppcle", "ppc32le"]),
    (ARCH_PPCLE_64, &["ppc64le", "powerpc64le"]),
];

/// Normalize a raw architecture name to its canonical fragment.
///
/// # Examples
///
/// ```
/// use nativelib::platform::normalize_architecture;
///
/// assert_eq!(normalize_architecture("amd64"), "x86_64");
/// assert_eq!(normalize_architecture("riscv64"), "riscv64");
/// ```
#[must_use]
pub fn normalize_architecture(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    ARCHITECTURE_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&lowered.as_str()))
        .map_or(lowered, |(canonical, _)| (*canonical).to_owned())
}
