//! Raw platform signals read from the running process.
//!
//! Each signal can be overridden through an environment variable, which is
//! how tests and packaging tools simulate a platform other than the host.

/// Environment variable overriding the raw OS name.
pub const OS_NAME_ENV: &str = "NATIVELIB_OS_NAME";
/// Environment variable overriding the raw architecture name.
pub const OS_ARCH_ENV: &str = "NATIVELIB_OS_ARCH";
/// Environment variable overriding the generic pointer-width signal.
pub const DATA_MODEL_ENV: &str = "NATIVELIB_DATA_MODEL";
/// Environment variable supplying the vendor pointer-width signal.
pub const BITMODE_ENV: &str = "NATIVELIB_BITMODE";

/// Source of the raw strings platform identification works from.
#[cfg_attr(test, mockall::automock)]
pub trait PlatformSignals {
    /// Raw operating system name, for example `linux` or `Mac OS X`.
    fn os_name(&self) -> String;

    /// Raw architecture name, for example `amd64` or `aarch64`.
    fn arch(&self) -> String;

    /// Generic pointer-width signal, if the process exposes one.
    fn pointer_width(&self) -> Option<String>;

    /// Vendor-specific pointer-width signal, consulted when the generic one
    /// is absent or not numeric.
    fn vendor_pointer_width(&self) -> Option<String>;
}

/// Signals for the current process.
///
/// Values come from the environment overrides above when set, otherwise
/// from the target this binary was compiled for.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSignals;

impl PlatformSignals for SystemSignals {
    fn os_name(&self) -> String {
        env_value(OS_NAME_ENV).unwrap_or_else(|| std::env::consts::OS.to_owned())
    }

    fn arch(&self) -> String {
        env_value(OS_ARCH_ENV).unwrap_or_else(|| host_arch().to_owned())
    }

    fn pointer_width(&self) -> Option<String> {
        env_value(DATA_MODEL_ENV).or_else(|| Some(usize::BITS.to_string()))
    }

    fn vendor_pointer_width(&self) -> Option<String> {
        env_value(BITMODE_ENV)
    }
}

/// Architecture of the compiled target.
///
/// Rust reports both PowerPC64 byte orders as `powerpc64`; the little-endian
/// build is told apart here so it normalizes to `ppcle_64`.
fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "powerpc64" if cfg!(target_endian = "little") => "powerpc64le",
        other => other,
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
