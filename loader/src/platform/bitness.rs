//! Pointer-width detection.

use serde::Serialize;
use std::fmt;

use super::arch::normalize_architecture;
use super::signals::PlatformSignals;

/// Pointer width of the target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "u32")]
pub enum Bitness {
    /// 32-bit pointers.
    Bits32,
    /// 64-bit pointers.
    Bits64,
}

impl Bitness {
    /// Return the width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }

    /// Map a bit count to a bitness, if it is one we build for.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            32 => Some(Self::Bits32),
            64 => Some(Self::Bits64),
            _ => None,
        }
    }

    /// Guess the bitness from a normalised architecture name.
    ///
    /// Anything mentioning `64` is taken as 64-bit. Pass the output of
    /// [`normalize_architecture`] so aliases like `sparcv9` and `ia64n`
    /// land on the right side.
    #[must_use]
    pub fn guess_from_architecture(architecture: &str) -> Self {
        if architecture.contains("64") {
            Self::Bits64
        } else {
            Self::Bits32
        }
    }
}

impl From<Bitness> for u32 {
    fn from(value: Bitness) -> Self {
        value.bits()
    }
}

impl fmt::Display for Bitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Parse a pointer-width signal. Only all-digit values naming 32 or 64 count.
fn parse_signal(value: Option<String>) -> Option<Bitness> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok().and_then(Bitness::from_bits)
}

/// Determine the bitness from process signals.
///
/// The generic pointer-width signal is preferred over the vendor one because
/// it is more widely supported; the architecture heuristic is the last
/// resort.
#[must_use]
pub fn determine_bitness(signals: &dyn PlatformSignals) -> Bitness {
    if let Some(bitness) = parse_signal(signals.pointer_width()) {
        return bitness;
    }
    if let Some(bitness) = parse_signal(signals.vendor_pointer_width()) {
        log::debug!("generic pointer width unusable; using vendor signal ({bitness})");
        return bitness;
    }
    let arch = signals.arch();
    log::debug!("no pointer-width signal; guessing bitness from architecture {arch}");
    Bitness::guess_from_architecture(&normalize_architecture(&arch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::signals::MockPlatformSignals;
    use rstest::rstest;

    fn signals(
        pointer: Option<&'static str>,
        vendor: Option<&'static str>,
        arch: &'static str,
    ) -> MockPlatformSignals {
        let mut mock = MockPlatformSignals::new();
        mock.expect_pointer_width()
            .returning(move || pointer.map(str::to_owned));
        mock.expect_vendor_pointer_width()
            .returning(move || vendor.map(str::to_owned));
        mock.expect_arch().returning(move || arch.to_owned());
        mock
    }

    #[rstest]
    #[case::generic_wins(Some("32"), Some("64"), "amd64", Bitness::Bits32)]
    #[case::vendor_when_generic_missing(None, Some("64"), "x86", Bitness::Bits64)]
    #[case::vendor_when_generic_non_numeric(Some("unknown"), Some("32"), "amd64", Bitness::Bits32)]
    #[case::heuristic_64(None, None, "aarch64", Bitness::Bits64)]
    #[case::heuristic_32(Some(""), Some("n/a"), "i686", Bitness::Bits32)]
    #[case::unusual_width_ignored(Some("128"), None, "sparcv9", Bitness::Bits64)]
    #[case::alias_without_64_in_name(None, None, "sparcv9", Bitness::Bits64)]
    #[case::itanium_32_alias(None, None, "ia64n", Bitness::Bits32)]
    #[case::x32_abi(None, None, "x32", Bitness::Bits32)]
    fn follows_signal_priority(
        #[case] pointer: Option<&'static str>,
        #[case] vendor: Option<&'static str>,
        #[case] arch: &'static str,
        #[case] expected: Bitness,
    ) {
        let mock = signals(pointer, vendor, arch);
        assert_eq!(determine_bitness(&mock), expected);
    }

    #[test]
    fn displays_bit_count() {
        assert_eq!(Bitness::Bits64.to_string(), "64");
        assert_eq!(u32::from(Bitness::Bits32), 32);
    }
}
