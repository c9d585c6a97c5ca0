//! CLI argument definitions for the `nativelib` binary.
//!
//! Kept apart from the entrypoint so the argument surface can be unit tested
//! without running any command.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Inspect platform detection and stage native libraries from bundles.
#[derive(Parser, Debug)]
#[command(name = "nativelib")]
#[command(version, about)]
#[command(long_about = concat!(
    "Inspect platform detection and stage native libraries from bundles.\n\n",
    "A bundle is a directory, a zip or jar archive, or a .tar.zst archive holding ",
    "libraries under natives/{platform}/. Bundles default to NATIVELIB_BUNDLE_PATH, ",
    "or to the directory holding this executable.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Show the detected platform:\n",
    "    $ nativelib platform --json\n\n",
    "  List the bundle directories probed on this host:\n",
    "    $ nativelib paths --root vendor/natives\n\n",
    "  Extract libdummy from a jar and print where it landed:\n",
    "    $ nativelib extract dummy --bundle app.jar\n\n",
    "  Simulate another host:\n",
    "    $ NATIVELIB_OS_NAME=AIX NATIVELIB_OS_ARCH=ppc64 nativelib paths",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Read configuration from this TOML file instead of NATIVELIB_CONFIG.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(short, long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,
}

impl Cli {
    /// Log level selected by the verbosity count; warnings by default.
    #[must_use]
    pub const fn log_level(&self) -> log::LevelFilter {
        match self.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the detected platform.
    Platform(PlatformArgs),

    /// Print the bundle directories probed for the detected platform.
    Paths(PathsArgs),

    /// Extract a library and print its path; the staging directory is kept.
    Extract(StageArgs),

    /// Extract a library and load it into this process.
    Load(StageArgs),

    /// Extract every library listed in AUTOEXTRACT.LIST manifests.
    ExtractAll(BundleArgs),
}

/// Arguments for the platform command.
#[derive(Args, Debug, Clone, Default)]
pub struct PlatformArgs {
    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the paths command.
#[derive(Args, Debug, Clone, Default)]
pub struct PathsArgs {
    /// Extra search root, probed after natives/ (can be repeated).
    #[arg(short, long, value_name = "ROOT")]
    pub root: Vec<String>,
}

/// Bundle and staging options shared by the extraction commands.
#[derive(Args, Debug, Clone, Default)]
pub struct BundleArgs {
    /// Bundle to search, in order (can be repeated).
    #[arg(short, long, value_name = "PATH")]
    pub bundle: Vec<Utf8PathBuf>,

    /// Isolate extracted files in a per-context subdirectory.
    #[arg(long, value_name = "NAME")]
    pub context: Option<String>,

    /// Keep the staging directory when the command exits.
    #[arg(long)]
    pub keep: bool,
}

/// Arguments for the extract and load commands.
#[derive(Args, Debug, Clone, Default)]
pub struct StageArgs {
    /// Logical library name, for example `dummy` for `libdummy.so`.
    pub name: String,

    /// Extra search root, probed after natives/ (can be repeated).
    #[arg(short, long, value_name = "ROOT")]
    pub root: Vec<String>,

    /// Library version appended to the name as `-{version}`.
    #[arg(long, value_name = "VERSION")]
    pub lib_version: Option<String>,

    /// Bundle and staging options.
    #[command(flatten)]
    pub bundles: BundleArgs,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
