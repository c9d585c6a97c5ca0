//! BDD tests for staging directory creation, cleanup, and isolation.

use camino::{Utf8Path, Utf8PathBuf};
use nativelib::bundle::{Classpath, DirectoryBundle};
use nativelib::config::{IsolationPolicy, LoaderConfig};
use nativelib::loader::NativeLoader;
use nativelib::test_utils::{FixedSignals, RecordingImageLoader, write_library_tree};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Default)]
struct StagingWorld {
    _temp_dir: Option<tempfile::TempDir>,
    root: Utf8PathBuf,
    config: LoaderConfig,
    loader: Option<NativeLoader>,
    second_loader: Option<NativeLoader>,
    staging_dir: Option<Utf8PathBuf>,
    second_staging_dir: Option<Utf8PathBuf>,
    library: Option<Utf8PathBuf>,
}

impl StagingWorld {
    fn temp_root(&self) -> Utf8PathBuf {
        self.root.join("tmp")
    }

    fn stage(&self, name: &str) -> (NativeLoader, Utf8PathBuf, Utf8PathBuf) {
        let mut loader =
            NativeLoader::new(Classpath::new().with(DirectoryBundle::new(self.root.join("bundle"))))
                .with_config(self.config.clone())
                .with_signals(FixedSignals::new("Linux", "amd64", "64"))
                .with_image_loader(RecordingImageLoader::new());
        let outcome = loader
            .stage_and_load::<&str>(name, &[])
            .expect("stage and load");
        let library = outcome.path().expect("loaded path").to_owned();
        let staging = loader.staging_dir().expect("staging dir").to_owned();
        (loader, staging, library)
    }

    fn staging_dir(&self) -> &Utf8Path {
        self.staging_dir.as_deref().expect("staging dir recorded")
    }
}

#[fixture]
fn world() -> StagingWorld {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("UTF-8 path");
    let config = LoaderConfig {
        temp_dir: Some(root.join("tmp")),
        ..LoaderConfig::default()
    };
    StagingWorld {
        _temp_dir: Some(temp_dir),
        root,
        config,
        ..Default::default()
    }
}

#[given("a bundle holding \"{name}\" for 64-bit Linux")]
fn given_bundle(world: &mut StagingWorld, name: String) {
    let entry = format!("natives/linux-x86_64-64/lib{name}.so");
    write_library_tree(&world.root.join("bundle"), &[(entry.as_str(), &b"staged"[..])])
        .expect("write bundle");
}

#[given("a leftover staging directory \"{dir_name}\"")]
fn given_leftover(world: &mut StagingWorld, dir_name: String) {
    let leftover = world.temp_root().join(dir_name);
    std::fs::create_dir_all(&leftover).expect("create leftover");
    std::fs::write(leftover.join("libold.so"), b"old").expect("write leftover file");
}

#[given("a leftover minimum age of {millis} milliseconds")]
fn given_min_age(world: &mut StagingWorld, millis: u64) {
    world.config.leftover_min_age_ms = millis;
}

#[given("staging directories are kept")]
fn given_keep(world: &mut StagingWorld) {
    world.config.keep_staging = true;
}

#[given("isolation for the context \"{context}\"")]
fn given_isolation(world: &mut StagingWorld, context: String) {
    world.config.isolation = IsolationPolicy::PerContext { context };
}

#[when("a loader stages \"{name}\"")]
fn when_loader_stages(world: &mut StagingWorld, name: String) {
    let (loader, staging, library) = world.stage(&name);
    world.loader = Some(loader);
    world.staging_dir = Some(staging);
    world.library = Some(library);
}

#[when("a second loader stages \"{name}\"")]
fn when_second_loader_stages(world: &mut StagingWorld, name: String) {
    let (loader, staging, _) = world.stage(&name);
    world.second_loader = Some(loader);
    world.second_staging_dir = Some(staging);
}

#[when("the loader is dropped")]
fn when_loader_dropped(world: &mut StagingWorld) {
    drop(world.loader.take().expect("loader staged"));
}

#[then("the leftover \"{dir_name}\" is gone")]
fn then_leftover_gone(world: &mut StagingWorld, dir_name: String) {
    assert!(!world.temp_root().join(dir_name).exists());
}

#[then("the leftover \"{dir_name}\" still exists")]
fn then_leftover_exists(world: &mut StagingWorld, dir_name: String) {
    assert!(world.temp_root().join(dir_name).is_dir());
}

#[then("the two staging directories differ")]
fn then_staging_dirs_differ(world: &mut StagingWorld) {
    let second = world.second_staging_dir.as_deref().expect("second staging dir");
    assert_ne!(world.staging_dir(), second);
    assert!(world.staging_dir().is_dir());
    assert!(second.is_dir());
    assert!(world.second_loader.is_some());
}

#[then("the staging directory no longer exists")]
fn then_staging_removed(world: &mut StagingWorld) {
    assert!(!world.staging_dir().exists());
}

#[then("the staging directory still exists")]
fn then_staging_kept(world: &mut StagingWorld) {
    assert!(world.staging_dir().is_dir());
    let library = world.library.as_deref().expect("library path");
    assert!(library.is_file());
}

#[then("the library sits in a subdirectory starting with \"{prefix}\"")]
fn then_library_in_context_dir(world: &mut StagingWorld, prefix: String) {
    let library = world.library.as_deref().expect("library path");
    let parent = library.parent().expect("library parent");
    assert_eq!(parent.parent(), Some(world.staging_dir()));
    let dir_name = parent.file_name().expect("context dir name");
    assert!(
        dir_name.starts_with(&prefix),
        "unexpected context directory {dir_name}"
    );
}

// Scenario bindings

#[scenario(path = "tests/features/staging.feature", index = 0)]
fn scenario_stale_leftover_removed(world: StagingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/staging.feature", index = 1)]
fn scenario_recent_leftover_kept(world: StagingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/staging.feature", index = 2)]
fn scenario_unrelated_directory_untouched(world: StagingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/staging.feature", index = 3)]
fn scenario_separate_loaders(world: StagingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/staging.feature", index = 4)]
fn scenario_drop_removes_staging(world: StagingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/staging.feature", index = 5)]
fn scenario_keep_staging(world: StagingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/staging.feature", index = 6)]
fn scenario_per_context_isolation(world: StagingWorld) {
    let _ = world;
}
