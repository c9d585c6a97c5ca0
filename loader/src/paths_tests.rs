//! Unit tests for platform search paths.

use super::*;
use rstest::rstest;

fn linux_x86_64() -> PlatformTuple {
    PlatformTuple::new(OsFamily::Linux, "x86_64", Bitness::Bits64)
}

#[test]
fn every_default_platform_leads_with_its_canonical_path() {
    for platform in DefaultPlatform::ALL {
        let tuple = platform.tuple();
        let paths = platform_paths(&tuple).expect("default platforms are mapped");
        assert!(!paths.is_empty());
        assert_eq!(paths.first(), Some(&tuple.canonical_path()), "{platform:?}");
    }
}

#[test]
fn canonical_paths_have_three_or_four_segments() {
    for platform in DefaultPlatform::ALL {
        let path = platform.tuple().canonical_path();
        let segments = path.split('-').count();
        assert!(segments == 3 || segments == 4, "{path}");
    }
}

#[rstest]
#[case::linux_32(DefaultPlatform::LinuxX86_32, "linux_32")]
#[case::linux_64(DefaultPlatform::LinuxX86_64, "linux_64")]
#[case::linux_arm(DefaultPlatform::LinuxArm32, "linux_arm")]
#[case::linux_arm64(DefaultPlatform::LinuxAarch64, "linux_arm64")]
#[case::osx_32(DefaultPlatform::MacosPpc32, "osx_32")]
#[case::osx_64(DefaultPlatform::MacosX86_64, "osx_64")]
#[case::windows_32(DefaultPlatform::WindowsX86_32, "windows_32")]
#[case::windows_64(DefaultPlatform::WindowsX86_64, "windows_64")]
#[case::windows_ia64(DefaultPlatform::WindowsIa64, "windows_64")]
#[case::aix_32(DefaultPlatform::AixPpc32, "aix_32")]
fn keeps_legacy_paths_for_compatibility(#[case] platform: DefaultPlatform, #[case] legacy: &str) {
    let paths = platform_library_paths(None, &platform.tuple()).expect("mapped");
    assert!(
        paths.iter().any(|path| path == legacy),
        "paths for {platform:?} must contain {legacy}: {paths:?}"
    );
}

#[test]
fn duplicate_windows_tuple_collapses() {
    assert_eq!(
        DefaultPlatform::WindowsX86_64.tuple(),
        DefaultPlatform::WindowsEm64t.tuple()
    );
    assert_eq!(default_mapping().len(), DefaultPlatform::ALL.len() - 1);
}

#[test]
fn unmapped_tuple_is_rejected() {
    let riscv = PlatformTuple::new(OsFamily::Linux, "riscv64", Bitness::Bits64);
    let err = platform_paths(&riscv).expect_err("riscv is not in the table");
    assert!(
        matches!(err, LoaderError::UnmappedPlatform { ref platform } if platform == "linux-riscv64-64"),
        "unexpected error: {err}"
    );
}

#[test]
fn special_qualifier_is_not_in_default_table() {
    let musl = linux_x86_64().with_special("musl");
    assert!(platform_paths(&musl).is_err());
}

#[rstest]
#[case::no_root(None, &["linux-x86_64-64", "linux_64"])]
#[case::bare_root(Some("natives"), &["natives/linux-x86_64-64/", "natives/linux_64/"])]
#[case::slash_root(Some("natives/"), &["natives/linux-x86_64-64/", "natives/linux_64/"])]
#[case::empty_root(Some(""), &["linux-x86_64-64/", "linux_64/"])]
fn prefixes_root_when_given(#[case] root: Option<&str>, #[case] expected: &[&str]) {
    let paths = platform_library_paths(root, &linux_x86_64()).expect("mapped");
    assert_eq!(paths, expected);
}

#[test]
fn search_roots_follow_fixed_order() {
    let roots = search_roots(&["vendor/libs", "extra/"]);
    assert_eq!(
        roots,
        ["natives/", "vendor/libs/", "extra/", "", "META-INF/lib/"]
    );
}

#[test]
fn search_roots_without_overrides() {
    let roots = search_roots::<&str>(&[]);
    assert_eq!(roots, ["natives/", "", "META-INF/lib/"]);
}

#[test]
fn search_roots_drop_duplicate_overrides() {
    let roots = search_roots(&["natives", "META-INF/lib"]);
    assert_eq!(roots, ["natives/", "META-INF/lib/", ""]);
}

#[test]
fn candidates_cross_roots_with_platform_paths() {
    let candidates = candidate_directories(&linux_x86_64(), &["custom"]).expect("mapped");
    assert_eq!(
        candidates,
        [
            "natives/linux-x86_64-64/",
            "natives/linux_64/",
            "custom/linux-x86_64-64/",
            "custom/linux_64/",
            "linux-x86_64-64/",
            "linux_64/",
            "META-INF/lib/linux-x86_64-64/",
            "META-INF/lib/linux_64/",
        ]
    );
}
