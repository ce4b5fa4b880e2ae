// tests/config_validation.rs

mod common;
use crate::common::TempProject;

use std::path::{Path, PathBuf};

use clap::Parser;

use bunny::cli::{CliArgs, DEFAULT_DEV_PORT};
use bunny::config::{
    resolve_run_mode, validate_port, BuildConfig, DevServerConfig, RawBuildConfig, RunMode,
    DEFAULT_DEBOUNCE,
};
use bunny::errors::BunnyError;

#[test]
fn port_range_is_enforced() {
    assert!(matches!(validate_port(80), Err(BunnyError::InvalidPort(80))));
    assert!(matches!(validate_port(1023), Err(BunnyError::InvalidPort(1023))));
    assert!(matches!(validate_port(65536), Err(BunnyError::InvalidPort(65536))));
    assert_eq!(validate_port(1024).ok(), Some(1024));
    assert_eq!(validate_port(65535).ok(), Some(65535));
}

#[test]
fn invalid_port_message_names_the_range() {
    let err = validate_port(80).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Wrong port 80, port should be number between 1024 and 65535"
    );
}

#[test]
fn dev_server_config_checks_port_before_target() {
    let err = DevServerConfig::new(80, None, true).unwrap_err();
    assert!(matches!(err, BunnyError::InvalidPort(80)));

    let err = DevServerConfig::new(8080, None, true).unwrap_err();
    assert!(matches!(err, BunnyError::TargetRequired(_)));

    let dev = DevServerConfig::new(8080, Some(Path::new("/out.html")), false).unwrap();
    assert_eq!(dev.port, 8080);
    assert_eq!(dev.url(), "http://localhost:8080");
    assert!(!dev.open_browser);
}

#[test]
fn relative_paths_resolve_against_cwd() {
    let project = TempProject::new();
    project.write("site/index.html", "<html></html>");

    let config = BuildConfig::try_from(RawBuildConfig {
        source: PathBuf::from("./site/index.html"),
        target: Some(PathBuf::from("site/../dist/index.html")),
        cwd: project.root(),
    })
    .unwrap();

    assert_eq!(config.source(), project.path("site/index.html"));
    assert_eq!(config.source_dir(), project.path("site"));
    assert_eq!(config.target(), Some(project.path("dist/index.html").as_path()));
    assert_eq!(config.debounce(), DEFAULT_DEBOUNCE);
}

#[test]
fn missing_source_is_rejected() {
    let project = TempProject::new();

    let err = BuildConfig::try_from(RawBuildConfig {
        source: PathBuf::from("missing.html"),
        target: None,
        cwd: project.root(),
    })
    .unwrap_err();

    assert!(matches!(err, BunnyError::SourceNotFound(ref p) if p == &project.path("missing.html")));
}

#[test]
fn cli_parses_positional_paths_and_flags() {
    let args = CliArgs::try_parse_from(["bunny", "in.html", "out.html", "--watch"]).unwrap();
    assert_eq!(args.source, PathBuf::from("in.html"));
    assert_eq!(args.target, Some(PathBuf::from("out.html")));
    assert!(args.watch);
    assert_eq!(args.dev, None);
}

#[test]
fn dev_flag_defaults_to_8080() {
    let args = CliArgs::try_parse_from(["bunny", "in.html", "out.html", "--dev"]).unwrap();
    assert_eq!(args.dev, Some(DEFAULT_DEV_PORT));

    let args = CliArgs::try_parse_from(["bunny", "in.html", "out.html", "-d", "3000"]).unwrap();
    assert_eq!(args.dev, Some(3000));
}

#[test]
fn source_argument_is_required() {
    assert!(CliArgs::try_parse_from(["bunny"]).is_err());
}

#[test]
fn run_mode_prefers_dev_over_watch() {
    let config = BuildConfig::new_unchecked(
        PathBuf::from("/p/in.html"),
        Some(PathBuf::from("/p/out.html")),
    );

    let mut args = CliArgs::once("/p/in.html", Some(PathBuf::from("/p/out.html")));
    assert!(matches!(resolve_run_mode(&args, &config), Ok(RunMode::Once)));

    args.watch = true;
    assert!(matches!(resolve_run_mode(&args, &config), Ok(RunMode::Watch)));

    args.dev = Some(9000);
    match resolve_run_mode(&args, &config) {
        Ok(RunMode::Dev(dev)) => {
            assert_eq!(dev.port, 9000);
            assert_eq!(dev.target, PathBuf::from("/p/out.html"));
        }
        other => panic!("expected dev mode, got {other:?}"),
    }
}

#[test]
fn one_shot_without_target_is_not_fatal() {
    let config = BuildConfig::new_unchecked(PathBuf::from("/p/in.html"), None);
    let args = CliArgs::once("/p/in.html", None);

    assert!(matches!(resolve_run_mode(&args, &config), Ok(RunMode::Once)));
}
