//! Finding a library inside a bundle.
//!
//! Logical library names (`dummy`) are mapped to the platform's physical file
//! name (`libdummy.so`, `dummy.dll`, `libdummy.dylib`) and probed in each
//! candidate directory in turn.

use crate::bundle::ResourceBundle;
use crate::error::{LoaderError, Result};
use crate::paths::dir_prefix;
use crate::platform::OsFamily;

/// Suffix pairs that older and newer bundles used interchangeably on macOS.
const INTERCHANGEABLE_SUFFIXES: [(&str, &str); 2] = [(".jnilib", ".dylib"), (".dylib", ".jnilib")];

/// A library found in a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedResource {
    resource_path: String,
    file_name: String,
}

impl LocatedResource {
    /// Bundle-relative path of the matching entry.
    #[must_use]
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    /// Physical file name the library must be extracted under.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Map a logical library name to the platform's physical file name.
///
/// # Examples
///
/// ```
/// use nativelib::locate::map_library_name;
/// use nativelib::platform::OsFamily;
///
/// assert_eq!(map_library_name(OsFamily::Linux, "dummy"), "libdummy.so");
/// assert_eq!(map_library_name(OsFamily::Windows, "dummy"), "dummy.dll");
/// assert_eq!(map_library_name(OsFamily::Osx, "dummy"), "libdummy.dylib");
/// ```
#[must_use]
pub fn map_library_name(family: OsFamily, logical: &str) -> String {
    match family {
        OsFamily::Windows => format!("{logical}.dll"),
        OsFamily::Osx => format!("lib{logical}.dylib"),
        OsFamily::Linux
        | OsFamily::Aix
        | OsFamily::Solaris
        | OsFamily::Zos
        | OsFamily::Unknown => format!("lib{logical}.so"),
    }
}

/// The other spelling of a macOS library name, if it has one.
#[must_use]
pub fn alternate_library_name(physical: &str) -> Option<String> {
    INTERCHANGEABLE_SUFFIXES
        .iter()
        .find_map(|(from, to)| physical.strip_suffix(from).map(|stem| format!("{stem}{to}")))
}

/// Append `-{version}` to a logical name when a version is given.
///
/// # Examples
///
/// ```
/// use nativelib::locate::versioned_library_name;
///
/// assert_eq!(versioned_library_name("dummy", Some("1.2.0")), "dummy-1.2.0");
/// assert_eq!(versioned_library_name("dummy", Some("")), "dummy");
/// assert_eq!(versioned_library_name("dummy", None), "dummy");
/// ```
#[must_use]
pub fn versioned_library_name(logical: &str, version: Option<&str>) -> String {
    match version.map(str::trim).filter(|v| !v.is_empty()) {
        Some(version) => format!("{logical}-{version}"),
        None => logical.to_owned(),
    }
}

/// Find the first candidate directory holding the library.
///
/// In each directory the mapped name is probed first, then its alternate
/// suffix, before moving on to the next directory.
///
/// # Errors
///
/// Returns [`LoaderError::ResourceNotFound`] listing every probed path when
/// no directory holds a match.
pub fn locate<S: AsRef<str>>(
    bundle: &dyn ResourceBundle,
    candidates: &[S],
    logical: &str,
    family: OsFamily,
) -> Result<LocatedResource> {
    let mapped = map_library_name(family, logical);
    let names: Vec<String> = std::iter::once(mapped.clone())
        .chain(alternate_library_name(&mapped))
        .collect();
    find_in(bundle, candidates, &names, &mapped)
}

/// Find a file by its exact physical name in the candidate directories.
///
/// # Errors
///
/// Returns [`LoaderError::ResourceNotFound`] when no directory holds it.
pub fn locate_physical<S: AsRef<str>>(
    bundle: &dyn ResourceBundle,
    candidates: &[S],
    physical: &str,
) -> Result<LocatedResource> {
    find_in(bundle, candidates, &[physical.to_owned()], physical)
}

fn find_in<S: AsRef<str>>(
    bundle: &dyn ResourceBundle,
    candidates: &[S],
    names: &[String],
    requested: &str,
) -> Result<LocatedResource> {
    let mut searched = Vec::new();
    for directory in candidates {
        let prefix = dir_prefix(directory.as_ref());
        for name in names {
            let resource_path = format!("{prefix}{name}");
            if bundle.contains(&resource_path) {
                log::debug!("found {resource_path} in {}", bundle.describe());
                return Ok(LocatedResource {
                    resource_path,
                    file_name: name.clone(),
                });
            }
            searched.push(resource_path);
        }
    }
    log::debug!("{requested} not found in {}", bundle.describe());
    Err(LoaderError::ResourceNotFound {
        name: requested.to_owned(),
        searched,
    })
}
