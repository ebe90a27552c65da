//! Integration tests for rc file discovery and end-to-end resolution on disk.
//!
//! Each test builds a small directory tree in a temp dir and points
//! `fs_root`/`fs_home` into it so the real environment is never read.

use cascade_config::ConfigError;
use cascade_config::config::{CascadeConfig, ConfigOptions, FragmentOrigin};
use cascade_config::glob::FsGlobMatcher;
use cascade_config::loader::{CachingLoader, FragmentLoader, FsLoader, LoadOptions};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Layout shared by most tests:
///
/// ```text
/// <tmp>/etc/cascaderc          system
/// <tmp>/home/.cascaderc        home
/// <tmp>/work/.cascaderc        ancestor above the project
/// <tmp>/work/proj/.cascaderc   project root (root: true)
/// <tmp>/work/proj/sub/.cascaderc.yaml
/// ```
struct Fixture {
    temp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().expect("temp dir");
        let fixture = Self { temp };

        fixture.write("etc/cascaderc", r#"{"system": true, "level": "system"}"#);
        fixture.write("home/.cascaderc", r#"{"home": true, "level": "home"}"#);
        fixture.write(
            "work/.cascaderc",
            r#"{"above": true, "level": "above", "libs": {"shared": {"from": "above"}}}"#,
        );
        fixture.write(
            "work/proj/.cascaderc",
            r#"{
                "root": true,
                "level": "project",
                "levels": {"common.blocks": {"techs": ["css"]}, "*.blocks": {"scheme": "nested"}},
                "libs": {"shared": {"from": "project", "levels": {"blocks": {}}}},
                "modules": {"bundler": {"minify": false}}
            }"#,
        );
        fixture.write(
            "work/proj/sub/.cascaderc.yaml",
            "level: sub\nlevels:\n  ../common.blocks:\n    techs: [js]\nmodules:\n  bundler:\n    minify: true\n",
        );
        for dir in [
            "work/proj/common.blocks",
            "work/proj/desktop.blocks",
            "work/proj/sub",
        ] {
            fs::create_dir_all(fixture.path(dir)).unwrap();
        }

        fixture
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.temp.path().join(relative)
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn load_options(&self, cwd: &str) -> LoadOptions {
        LoadOptions::new("cascade")
            .with_fs_root(self.temp.path())
            .with_fs_home(self.path("home"))
            .with_cwd(self.path(cwd))
    }

    fn config_options(&self, cwd: &str) -> ConfigOptions {
        ConfigOptions::new("cascade")
            .with_fs_root(self.temp.path())
            .with_fs_home(self.path("home"))
            .with_cwd(self.path(cwd))
    }
}

#[test]
fn discovers_every_scope_in_order() {
    let fixture = Fixture::new();
    let options = fixture.load_options("work/proj/sub");
    let chain = FsLoader.load(&options).unwrap();

    let sources: Vec<(FragmentOrigin, PathBuf)> =
        chain.iter().map(|f| (f.origin, f.source.clone())).collect();
    assert_eq!(
        sources,
        vec![
            (FragmentOrigin::System, fixture.path("etc/cascaderc")),
            (FragmentOrigin::Home, fixture.path("home/.cascaderc")),
            (FragmentOrigin::Project, fixture.path("work/.cascaderc")),
            (
                FragmentOrigin::Project,
                fixture.path("work/proj/.cascaderc")
            ),
            (
                FragmentOrigin::Project,
                fixture.path("work/proj/sub/.cascaderc.yaml")
            ),
        ]
    );
}

#[tokio::test]
async fn async_load_matches_blocking_load() {
    let fixture = Fixture::new();
    let options = fixture
        .load_options("work/proj/sub")
        .with_argv(json!({"level": "argv"}));

    let blocking = FsLoader.load(&options).unwrap();
    let async_ = FsLoader.load_async(&options).await.unwrap();
    assert_eq!(blocking, async_);
    assert_eq!(blocking.last().unwrap().origin, FragmentOrigin::CommandLine);
}

#[test]
fn resolves_project_end_to_end() {
    let fixture = Fixture::new();
    let config = CascadeConfig::new(fixture.config_options("work/proj/sub"));

    assert_eq!(config.root().unwrap(), Some(fixture.path("work/proj")));

    let merged = config.get().unwrap();
    assert_eq!(merged["level"], json!("sub"));
    assert!(merged.get("system").is_none());
    assert!(merged.get("home").is_none());
    assert!(merged.get("above").is_none());

    let map = config.level_map().unwrap();
    assert_eq!(
        map.keys().cloned().collect::<Vec<_>>(),
        vec![
            fixture.path("work/proj/common.blocks"),
            fixture.path("work/proj/desktop.blocks"),
        ]
    );
    // common.blocks: pattern and literal from the root, then the sub override
    assert_eq!(
        map[fixture.path("work/proj/common.blocks").as_path()],
        json!({"level": "sub", "scheme": "nested", "techs": ["js"]})
    );
    assert_eq!(
        config.level("../desktop.blocks").unwrap(),
        Some(json!({"level": "project", "scheme": "nested"}))
    );

    assert_eq!(
        config.module("bundler").unwrap(),
        Some(json!({"minify": true}))
    );
}

#[test]
fn library_view_from_disk() {
    let fixture = Fixture::new();
    let config = CascadeConfig::new(fixture.config_options("work/proj"));

    let lib = config.library("shared").unwrap();
    let lib = lib.expect("shared is declared");
    assert_eq!(
        lib.get().unwrap(),
        json!({"from": "project", "levels": {"blocks": {}}})
    );
    assert_eq!(
        lib.level("blocks").unwrap(),
        Some(json!({"from": "project"}))
    );
    assert!(lib.library("shared").unwrap().is_none());
}

#[tokio::test]
async fn blocking_and_async_facades_agree_on_disk() {
    let fixture = Fixture::new();
    let blocking = CascadeConfig::new(fixture.config_options("work/proj/sub"));
    let async_ = CascadeConfig::new(fixture.config_options("work/proj/sub"));

    assert_eq!(blocking.get().unwrap(), async_.get_async().await.unwrap());
    assert_eq!(
        blocking.level_map().unwrap(),
        async_.level_map_async().await.unwrap()
    );
    assert_eq!(blocking.root().unwrap(), async_.root_async().await.unwrap());
}

#[test]
fn explicit_config_is_most_specific_file() {
    let fixture = Fixture::new();
    fixture.write("elsewhere/override.json", r#"{"level": "explicit"}"#);

    let options = fixture
        .config_options("work/proj/sub")
        .with_path_to_config(fixture.path("elsewhere/override.json"))
        .with_argv(json!({"cli": true}));
    let config = CascadeConfig::new(options);

    let chain = config.configs().unwrap();
    let origins: Vec<_> = chain.iter().rev().take(2).map(|f| f.origin).collect();
    assert_eq!(
        origins,
        vec![FragmentOrigin::CommandLine, FragmentOrigin::Explicit]
    );
    assert_eq!(config.get().unwrap()["level"], json!("explicit"));
    assert_eq!(config.get().unwrap()["cli"], json!(true));
}

#[test]
fn missing_explicit_config_is_load_failure() {
    let fixture = Fixture::new();
    let options = fixture
        .load_options("work/proj")
        .with_path_to_config(fixture.path("nope.json"));

    let err = FsLoader.load(&options).unwrap_err();
    assert!(
        matches!(err, ConfigError::Load { ref path, .. } if path == &fixture.path("nope.json"))
    );
}

#[test]
fn malformed_rc_file_is_load_failure() {
    let fixture = Fixture::new();
    fixture.write("work/proj/sub/.cascaderc.json", "{ not json");

    // .cascaderc.json wins over .cascaderc.yaml in the same directory
    let options = fixture.load_options("work/proj/sub");
    let err = FsLoader.load(&options).unwrap_err();
    assert!(matches!(err, ConfigError::Load { .. }));
}

#[test]
fn defaults_and_extend_by_layering() {
    let fixture = Fixture::new();
    fixture.write("plain/.cascaderc", r#"{"level": "plain"}"#);

    let options = ConfigOptions::new("cascade")
        .with_fs_root(fixture.path("plain"))
        .with_fs_home(fixture.path("no-home"))
        .with_cwd(fixture.path("plain"))
        .with_defaults(json!({"level": "defaults", "d": 1}))
        .with_extend_by(json!({"e": 1}));
    let config = CascadeConfig::new(options);

    // fs_root excludes <tmp>/etc, so only the plain rc file is discovered
    assert_eq!(
        config.get().unwrap(),
        json!({"level": "plain", "d": 1, "e": 1})
    );
    assert_eq!(config.root().unwrap(), None);
}

#[test]
fn rc_files_outside_fs_root_ignored() {
    let fixture = Fixture::new();
    let options = LoadOptions::new("cascade")
        .with_fs_root(fixture.path("work/proj"))
        .with_fs_home(fixture.path("no-home"))
        .with_cwd(fixture.path("work/proj"));

    let chain = FsLoader.load(&options).unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].source, fixture.path("work/proj/.cascaderc"));
    assert!(Path::new(&chain[0].source).is_absolute());
}

#[test]
fn shared_cache_serves_every_instance() {
    let fixture = Fixture::new();
    let cache = Arc::new(CachingLoader::new(FsLoader::new()));
    let matcher = Arc::new(FsGlobMatcher::new());

    let first = CascadeConfig::with_parts(
        fixture.config_options("work/proj/sub"),
        cache.clone(),
        matcher.clone(),
    );
    assert_eq!(first.get().unwrap()["level"], json!("sub"));

    // A later edit is not seen through the shared cache until it is cleared
    fixture.write("work/proj/sub/.cascaderc.yaml", "level: edited\n");
    let second = CascadeConfig::with_parts(
        fixture.config_options("work/proj/sub"),
        cache.clone(),
        matcher.clone(),
    );
    assert_eq!(second.get().unwrap()["level"], json!("sub"));
    assert_eq!(cache.len(), 1);

    cache.clear();
    let third = CascadeConfig::with_parts(fixture.config_options("work/proj/sub"), cache, matcher);
    assert_eq!(third.get().unwrap()["level"], json!("edited"));
}

#[test]
fn separate_instances_read_disk_independently() {
    let fixture = Fixture::new();
    let first = CascadeConfig::new(fixture.config_options("work/proj/sub"));
    assert_eq!(first.get().unwrap()["level"], json!("sub"));

    fixture.write("work/proj/sub/.cascaderc.yaml", "level: edited\n");
    let second = CascadeConfig::new(fixture.config_options("work/proj/sub"));
    assert_eq!(second.get().unwrap()["level"], json!("edited"));
}
