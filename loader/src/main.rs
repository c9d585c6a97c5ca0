//! `nativelib` CLI entrypoint.
//!
//! Prints platform detection results and stages libraries from bundles so
//! packaging problems can be diagnosed without writing a host program.

use clap::Parser;
use std::io::Write;

use nativelib::bundle::{Classpath, open_bundle};
use nativelib::cli::{BundleArgs, Cli, Command, PathsArgs, PlatformArgs, StageArgs};
use nativelib::config::{IsolationPolicy, LoaderConfig};
use nativelib::error::LoaderError;
use nativelib::loader::{LoadOutcome, NativeLoader};
use nativelib::platform::resolve_platform;

/// Exit code for a platform with no available build.
const EXIT_UNSUPPORTED: i32 = 2;

/// Errors reported by the binary.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// A library operation failed.
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// The platform has no build of the requested library.
    #[error("unsupported platform: {reason}")]
    Unsupported {
        /// Why the platform could not be served.
        reason: String,
    },

    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// JSON output could not be produced.
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, CliError>;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Command::Platform(args) => show_platform(args, out),
        Command::Paths(args) => show_paths(cli, args, out),
        Command::Extract(args) => {
            let mut loader = build_loader(cli, &args.bundles, true)?;
            let outcome = loader.extract_only(&requested_name(args), args.root.as_slice())?;
            report_outcome(&outcome, out)
        }
        Command::Load(args) => {
            let mut loader = build_loader(cli, &args.bundles, args.bundles.keep)?;
            let outcome = loader.stage_and_load(&requested_name(args), args.root.as_slice())?;
            report_outcome(&outcome, out)
        }
        Command::ExtractAll(args) => {
            let mut loader = build_loader(cli, args, true)?;
            for path in loader.extract_registered()? {
                writeln!(out, "{path}")?;
            }
            Ok(())
        }
    }
}

fn show_platform(args: &PlatformArgs, out: &mut dyn Write) -> Result<()> {
    let platform = resolve_platform()?;
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&platform)?)?;
    } else {
        writeln!(out, "{platform}")?;
    }
    Ok(())
}

/// Lists the directories `load` would probe, configured roots included.
fn show_paths(cli: &Cli, args: &PathsArgs, out: &mut dyn Write) -> Result<()> {
    let loader = NativeLoader::new(Classpath::new()).with_config(load_config(cli)?);
    let platform = loader.platform()?;
    for dir in loader.candidates(&platform, args.root.as_slice())? {
        writeln!(out, "{dir}")?;
    }
    Ok(())
}

fn requested_name(args: &StageArgs) -> String {
    nativelib::locate::versioned_library_name(&args.name, args.lib_version.as_deref())
}

/// Reads `--config` with environment overrides, or the environment alone.
fn load_config(cli: &Cli) -> Result<LoaderConfig> {
    let config = match &cli.config {
        Some(path) => LoaderConfig::load(path)?.with_env_overrides(|name| std::env::var(name).ok()),
        None => LoaderConfig::from_env()?,
    };
    Ok(config)
}

/// Builds a loader from the CLI options, falling back to the environment for
/// anything not given.
fn build_loader(cli: &Cli, args: &BundleArgs, keep: bool) -> Result<NativeLoader> {
    let mut config = load_config(cli)?;
    if let Some(context) = &args.context {
        config.isolation = IsolationPolicy::PerContext {
            context: context.clone(),
        };
    }
    config.keep_staging |= keep;

    let classpath = if args.bundle.is_empty() {
        Classpath::from_env()?
    } else {
        args.bundle
            .iter()
            .try_fold(Classpath::new(), |classpath, path| {
                open_bundle(path).map(|bundle| classpath.with(bundle))
            })?
    };
    Ok(NativeLoader::new(classpath).with_config(config))
}

fn report_outcome(outcome: &LoadOutcome, out: &mut dyn Write) -> Result<()> {
    match outcome {
        LoadOutcome::Loaded { path, platform } => writeln!(out, "loaded {path} ({platform})")?,
        LoadOutcome::Extracted { path, .. } => writeln!(out, "{path}")?,
        LoadOutcome::Unsupported { reason } => {
            return Err(CliError::Unsupported {
                reason: reason.clone(),
            });
        }
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, &err);
            match err {
                CliError::Unsupported { .. } => EXIT_UNSUPPORTED,
                _ => 1,
            }
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort; nothing else can report it.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use nativelib::config::{CONFIG_ENV, TMPDIR_ENV};
    use nativelib::platform::PlatformTuple;
    use nativelib::platform::signals::{BITMODE_ENV, DATA_MODEL_ENV, OS_ARCH_ENV, OS_NAME_ENV};
    use nativelib::test_utils::write_library_tree;
    use rstest::rstest;

    fn simulated_linux<T>(action: impl FnOnce() -> T) -> T {
        temp_env::with_vars(
            [
                (OS_NAME_ENV, Some("Linux")),
                (OS_ARCH_ENV, Some("amd64")),
                (DATA_MODEL_ENV, Some("64")),
                (BITMODE_ENV, None),
            ],
            action,
        )
    }

    fn output_of(cli: &Cli) -> (Result<()>, String) {
        let mut out = Vec::new();
        let result = run(cli, &mut out);
        (result, String::from_utf8(out).expect("utf-8 output"))
    }

    #[test]
    fn exit_code_is_zero_on_success() {
        let mut stderr = Vec::new();
        assert_eq!(exit_code_for_run_result(Ok(()), &mut stderr), 0);
        assert!(stderr.is_empty());
    }

    #[rstest]
    #[case::unsupported(CliError::Unsupported { reason: "no build".to_owned() }, EXIT_UNSUPPORTED)]
    #[case::loader(CliError::Loader(LoaderError::InvalidConfig { reason: "bad".to_owned() }), 1)]
    fn exit_code_reflects_error_kind(#[case] err: CliError, #[case] expected: i32) {
        let mut stderr = Vec::new();
        let message = err.to_string();
        assert_eq!(exit_code_for_run_result(Err(err), &mut stderr), expected);
        let text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(text.contains(&message));
    }

    #[test]
    fn platform_prints_canonical_path() {
        simulated_linux(|| {
            let (result, out) = output_of(&Cli::parse_from(["nativelib", "platform"]));
            result.expect("platform");
            assert_eq!(out.trim(), "linux-x86_64-64");
        });
    }

    #[test]
    fn platform_json_has_tuple_fields() {
        simulated_linux(|| {
            let (result, out) = output_of(&Cli::parse_from(["nativelib", "platform", "--json"]));
            result.expect("platform");
            let value: serde_json::Value = serde_json::from_str(&out).expect("json");
            assert_eq!(value["family"], "linux");
            assert_eq!(value["architecture"], "x86_64");
            assert_eq!(value["bitness"], 64);
        });
    }

    #[test]
    fn paths_lists_candidates_in_order() {
        simulated_linux(|| {
            let (result, out) =
                output_of(&Cli::parse_from(["nativelib", "paths", "--root", "vendor"]));
            result.expect("paths");
            let lines: Vec<_> = out.lines().collect();
            assert_eq!(
                lines.first().copied(),
                Some("natives/linux-x86_64-64/")
            );
            assert!(lines.contains(&"vendor/linux_64/"));
        });
    }

    #[test]
    fn paths_include_configured_roots() {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp dir");
        let config = root.join("nativelib.toml");
        std::fs::write(&config, "search_roots = [\"configured\"]\n").expect("write config");

        simulated_linux(|| {
            let cli = Cli::parse_from([
                "nativelib",
                "paths",
                "--config",
                config.as_str(),
                "--root",
                "vendor",
            ]);
            let (result, out) = output_of(&cli);
            result.expect("paths");
            let lines: Vec<_> = out.lines().collect();
            let position = |dir: &str| lines.iter().position(|line| *line == dir);
            let configured = position("configured/linux-x86_64-64/").expect("configured root");
            let vendor = position("vendor/linux-x86_64-64/").expect("call root");
            assert!(configured < vendor);
        });
    }

    #[test]
    fn paths_on_unmapped_platform_list_override_roots() {
        temp_env::with_vars(
            [
                (OS_NAME_ENV, Some("Linux")),
                (OS_ARCH_ENV, Some("riscv64")),
                (DATA_MODEL_ENV, Some("64")),
                (BITMODE_ENV, None),
                (CONFIG_ENV, None),
            ],
            || {
                let cli = Cli::parse_from(["nativelib", "paths", "--root", "vendor"]);
                let (result, out) = output_of(&cli);
                result.expect("paths");
                assert_eq!(
                    out.lines().collect::<Vec<_>>(),
                    ["vendor/linux-riscv64-64/", "vendor/"]
                );
            },
        );
    }

    #[test]
    fn blank_tmpdir_does_not_override_the_config_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp dir");
        let bundle = root.join("bundle");
        write_library_tree(&bundle, &[("natives/linux_64/libdummy.so", &b"native-lib-loader"[..])])
            .expect("bundle");
        let staging = root.join("from-config");
        let config = root.join("nativelib.toml");
        std::fs::write(&config, format!("temp_dir = \"{staging}\"\n")).expect("write config");

        temp_env::with_var(TMPDIR_ENV, Some(""), || {
            simulated_linux(|| {
                let cli = Cli::parse_from([
                    "nativelib",
                    "extract",
                    "dummy",
                    "--config",
                    config.as_str(),
                    "-b",
                    bundle.as_str(),
                ]);
                let (result, out) = output_of(&cli);
                result.expect("extract");
                assert!(Utf8PathBuf::from(out.trim()).starts_with(&staging));
            });
        });
    }

    #[test]
    fn extract_keeps_the_extracted_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp dir");
        let bundle = root.join("bundle");
        write_library_tree(&bundle, &[("natives/linux_64/libdummy.so", &b"native-lib-loader"[..])])
            .expect("bundle");
        let staging = root.join("tmp");

        temp_env::with_var("NATIVELIB_TMPDIR", Some(staging.as_str()), || {
            simulated_linux(|| {
                let cli = Cli::parse_from(["nativelib", "extract", "dummy", "-b", bundle.as_str()]);
                let (result, out) = output_of(&cli);
                result.expect("extract");
                let path = Utf8PathBuf::from(out.trim());
                assert!(path.starts_with(&staging));
                assert_eq!(
                    std::fs::read(&path).expect("extracted file survives"),
                    b"native-lib-loader"
                );
            });
        });
    }

    #[test]
    fn load_on_unsupported_platform_is_reported() {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp dir");
        temp_env::with_vars(
            [
                (OS_NAME_ENV, Some("Plan 9")),
                ("NATIVELIB_TMPDIR", Some(root.as_str())),
            ],
            || {
                let cli = Cli::parse_from(["nativelib", "load", "dummy", "-b", root.as_str()]);
                let (result, _) = output_of(&cli);
                assert!(matches!(result, Err(CliError::Unsupported { .. })));
            },
        );
    }

    #[test]
    fn resolved_platform_serialises_like_the_cli() {
        simulated_linux(|| {
            let platform: PlatformTuple = resolve_platform().expect("platform");
            let json = serde_json::to_value(&platform).expect("json");
            assert_eq!(json["special"], "");
        });
    }
}
