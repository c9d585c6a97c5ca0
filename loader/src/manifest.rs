//! Bulk-extraction manifests.
//!
//! A bundle may ship an [`MANIFEST_FILE_NAME`] file listing libraries that
//! must be staged together, typically a JNI library and the native
//! dependencies it links against. Entries are one name per line; blank lines
//! and `#` comments are skipped.

use crate::bundle::ResourceBundle;
use crate::error::Result;
use crate::paths::{DEFAULT_SEARCH_ROOT, join_dir, platform_paths};
use crate::platform::PlatformTuple;

/// Manifest file name probed in every manifest directory.
pub const MANIFEST_FILE_NAME: &str = "AUTOEXTRACT.LIST";

/// Root of the system-info keyed layout.
const SYSINFO_ROOT: &str = "META-INF/lib/";

/// Parse manifest text into entry names.
///
/// # Examples
///
/// ```
/// use nativelib::manifest::parse_manifest;
///
/// let entries = parse_manifest("# deps\nlibfoo.so.1\n\n  bar  \n");
/// assert_eq!(entries, ["libfoo.so.1", "bar"]);
/// ```
#[must_use]
pub fn parse_manifest(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

/// Read and parse the manifest at `path` in `bundle`.
///
/// # Errors
///
/// Returns [`crate::LoaderError::Io`] when the entry cannot be read or is not
/// UTF-8.
pub fn read_manifest(bundle: &dyn ResourceBundle, path: &str) -> Result<Vec<String>> {
    let mut raw = Vec::new();
    bundle.copy_to(path, &mut raw)?;
    let text = String::from_utf8(raw)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    Ok(parse_manifest(&text))
}

/// Directories probed for manifests and their entries, in priority order.
///
/// Platform directories under `natives/` come first when the platform is
/// mapped, then `natives/` itself, then the system-info directory and its
/// parent.
#[must_use]
pub fn manifest_directories(platform: Option<&PlatformTuple>, sysinfo: &str) -> Vec<String> {
    let mut dirs: Vec<String> = platform
        .and_then(|tuple| platform_paths(tuple).ok())
        .into_iter()
        .flatten()
        .map(|name| join_dir(DEFAULT_SEARCH_ROOT, name))
        .collect();
    dirs.push(DEFAULT_SEARCH_ROOT.to_owned());
    dirs.push(join_dir(SYSINFO_ROOT, sysinfo));
    dirs.push(SYSINFO_ROOT.to_owned());
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::EmbeddedBundle;
    use crate::platform::{Bitness, OsFamily};
    use rstest::rstest;

    #[rstest]
    #[case::empty("", &[])]
    #[case::comments_only("# a\n   # b\n", &[])]
    #[case::crlf("libfoo.so\r\nbar\r\n", &["libfoo.so", "bar"])]
    #[case::inline_hash("lib#odd.so\n", &["lib#odd.so"])]
    fn parses_entries(#[case] text: &str, #[case] expected: &[&str]) {
        assert_eq!(parse_manifest(text), expected);
    }

    #[test]
    fn mapped_platform_leads_with_platform_directories() {
        let linux = PlatformTuple::new(OsFamily::Linux, "x86_64", Bitness::Bits64);
        assert_eq!(
            manifest_directories(Some(&linux), "amd64-Linux-c217cxx6"),
            [
                "natives/linux-x86_64-64/",
                "natives/linux_64/",
                "natives/",
                "META-INF/lib/amd64-Linux-c217cxx6/",
                "META-INF/lib/",
            ]
        );
    }

    #[test]
    fn unmapped_platform_skips_platform_directories() {
        let riscv = PlatformTuple::new(OsFamily::Linux, "riscv64", Bitness::Bits64);
        assert_eq!(
            manifest_directories(Some(&riscv), "unknown"),
            ["natives/", "META-INF/lib/unknown/", "META-INF/lib/"]
        );
    }

    #[test]
    fn reads_manifest_from_bundle() {
        let bundle = EmbeddedBundle::new("test")
            .with_entry("natives/AUTOEXTRACT.LIST", b"dummy\n# skip\nlibdep.so.2\n".to_vec())
            .expect("valid path");
        let entries = read_manifest(&bundle, "natives/AUTOEXTRACT.LIST").expect("manifest");
        assert_eq!(entries, ["dummy", "libdep.so.2"]);
    }

    #[test]
    fn rejects_non_utf8_manifest() {
        let bundle = EmbeddedBundle::new("test")
            .with_entry("natives/AUTOEXTRACT.LIST", vec![0xff, 0xfe])
            .expect("valid path");
        assert!(read_manifest(&bundle, "natives/AUTOEXTRACT.LIST").is_err());
    }
}
