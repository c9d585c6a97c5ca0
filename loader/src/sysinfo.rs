//! System-info directory names for manifest-driven extraction.
//!
//! Older bundles key their `META-INF/lib/` subdirectories by a string of the
//! form `{arch}-{os}-{extra}`, where `extra` encodes the C and C++ runtime
//! versions on Linux and is `unknown` everywhere else.

use camino::{Utf8Path, Utf8PathBuf};

use crate::platform::PlatformSignals;

/// Runtime tag used when the C/C++ runtime versions cannot be read.
pub const UNKNOWN_RUNTIME: &str = "unknown";

const LIBC_LINK: &str = "/lib/libc.so.6";
const LIBSTDCXX_LINKS: [&str; 2] = ["/usr/lib/libstdc++.so.6", "/usr/lib/libstdc++.so.5"];

/// The system-info name: the override when given, otherwise a guess.
#[must_use]
pub fn resolve_sysinfo(override_value: Option<&str>, signals: &dyn PlatformSignals) -> String {
    match override_value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.to_owned(),
        None => guess_sysinfo(signals, &canonical_target),
    }
}

/// Guess the system-info name from raw signals.
///
/// `resolve` returns the canonical target of a library symlink, or `None`
/// when the link does not exist.
pub fn guess_sysinfo<F>(signals: &dyn PlatformSignals, resolve: &F) -> String
where
    F: Fn(&Utf8Path) -> Option<Utf8PathBuf>,
{
    let arch = signals.arch();
    let os = signals.os_name();
    let extra = if os.trim().eq_ignore_ascii_case("linux") {
        linux_runtime_tag(resolve).unwrap_or_else(|| UNKNOWN_RUNTIME.to_owned())
    } else {
        UNKNOWN_RUNTIME.to_owned()
    };
    format!("{arch}-{os}-{extra}")
}

/// `c{libc major}{libc minor}cxx{libstdc++ version}`, when both runtimes are
/// found at their usual locations.
fn linux_runtime_tag<F>(resolve: &F) -> Option<String>
where
    F: Fn(&Utf8Path) -> Option<Utf8PathBuf>,
{
    let libc = resolve(Utf8Path::new(LIBC_LINK))?;
    let (libc_major, libc_minor) = parse_libc(libc.file_name()?)?;

    let libstdcxx = LIBSTDCXX_LINKS
        .iter()
        .find_map(|link| resolve(Utf8Path::new(link)))?;
    let cxx = parse_libstdcxx(libstdcxx.file_name()?)?;

    Some(format!("c{libc_major}{libc_minor}cxx{cxx}"))
}

/// `libc-2.17.so` → `("2", "17")`.
fn parse_libc(file_name: &str) -> Option<(&str, &str)> {
    let mut parts = file_name.strip_prefix("libc-")?.splitn(3, '.');
    let major = parts.next().filter(|p| is_number(p))?;
    let minor = parts.next().filter(|p| is_number(p))?;
    parts.next()?;
    Some((major, minor))
}

/// `libstdc++.so.6.0.19` → `619`; `libstdc++.so.6.0.8` → `6`;
/// `libstdc++.so.5.0.7` → `5`.
fn parse_libstdcxx(file_name: &str) -> Option<String> {
    let rest = file_name.strip_prefix("libstdc++.so.")?;
    let parts: Vec<&str> = rest.split('.').collect();
    let &[major, "0", minor] = parts.as_slice() else {
        return None;
    };
    if !is_number(major) || !is_number(minor) {
        return None;
    }
    Some(match major {
        "5" => "5".to_owned(),
        "6" => match minor.parse::<u32>() {
            Ok(m) if m < 9 => "6".to_owned(),
            _ => format!("6{minor}"),
        },
        _ => format!("{major}{minor}"),
    })
}

fn is_number(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

fn canonical_target(link: &Utf8Path) -> Option<Utf8PathBuf> {
    link.canonicalize_utf8().ok()
}
