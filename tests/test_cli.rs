mod common;

use std::path::PathBuf;

use clap::Parser;
use darknet_inferencer::{
    LauncherConfig,
    cli::{Cli, Commands, show_command},
    config::{CONFIG_ENV, config_path, load_config, save_config},
};
use proptest::prelude::*;
use serial_test::serial;

use common::*;

fn run_args(images: &str) -> Vec<String> {
    [
        "darknet-inferencer",
        "run",
        "--images",
        images,
        "--cfg",
        "cfg.cfg",
        "--names",
        "coco.names",
        "--data",
        "data.data",
        "--weights",
        "model.weights",
        "--darknet",
        "/opt/darknet/darknet",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

proptest! {
    #[test]
    fn parse_threshold(value in 0.0f32..1.0) {
        let mut args = run_args("imgs");
        args.push("--thresh".into());
        args.push(value.to_string());
        let cli = Cli::parse_from(&args);
        match cli.command {
            Some(Commands::Run(run)) => prop_assert_eq!(run.thresh, Some(value)),
            _ => prop_assert!(false, "unexpected subcommand"),
        }
    }
}

#[test]
fn no_subcommand_means_gui() {
    let cli = Cli::parse_from(["darknet-inferencer"]);
    assert!(cli.command.is_none());
    assert!(!cli.verbose);
}

#[test]
fn global_flags_after_subcommand() {
    let mut args = run_args("imgs");
    args.push("--verbose".into());
    args.push("--config".into());
    args.push("/etc/inferencer.json".into());
    let cli = Cli::parse_from(&args);
    assert!(cli.verbose);
    assert_eq!(cli.config, Some(PathBuf::from("/etc/inferencer.json")));
}

#[test]
fn run_args_build_a_full_selection() {
    let cli = Cli::parse_from(run_args("imgs"));
    let Some(Commands::Run(run)) = cli.command else {
        panic!("expected run subcommand");
    };
    let selection = run.selection();
    assert!(selection.missing().is_empty());

    let mut config = LauncherConfig::default();
    run.apply(&mut config);
    assert_eq!(config.executable, Some(PathBuf::from("/opt/darknet/darknet")));
    assert_eq!(config.threshold, 0.40);
}

#[test]
fn show_command_renders_documented_template() {
    let ws = make_workspace(&[]);
    let images = ws.images.to_string_lossy().into_owned();
    let cli = Cli::parse_from(run_args(&images));
    let Some(Commands::Run(run)) = cli.command else {
        panic!("expected run subcommand");
    };
    let mut config = LauncherConfig::default();
    run.apply(&mut config);

    let line = show_command(&config, &run).unwrap();
    assert_eq!(
        line,
        format!(
            "/opt/darknet/darknet detector test data.data cfg.cfg model.weights \
             -thresh 0.40 -dont_show -save_labels < {}",
            ws.manifest_path().display()
        )
    );
    // Nothing is written.
    assert!(!ws.manifest_path().exists());
    assert!(!link_exists(&ws.link_path()));
}

#[test]
fn show_command_needs_an_executable() {
    let cli = Cli::parse_from(run_args("imgs"));
    let Some(Commands::Run(run)) = cli.command else {
        panic!("expected run subcommand");
    };
    let err = show_command(&LauncherConfig::default(), &run).unwrap_err();
    assert!(err.to_string().contains("executable"));
}

#[test]
fn explicit_config_path_wins() {
    let path = PathBuf::from("/tmp/custom.json");
    assert_eq!(config_path(Some(path.as_path())), path);
}

#[test]
#[serial]
fn config_env_var_is_used_without_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let from_env = dir.path().join("from-env.json");
    // SAFETY: every test that writes this variable runs under `#[serial]`.
    unsafe { std::env::set_var(CONFIG_ENV, &from_env) };
    let resolved = config_path(None);
    let explicit = config_path(Some(dir.path().join("explicit.json").as_path()));
    unsafe { std::env::remove_var(CONFIG_ENV) };

    assert_eq!(resolved, from_env);
    assert_eq!(explicit, dir.path().join("explicit.json"));
}

#[test]
#[serial]
fn without_env_var_the_platform_path_is_used() {
    // SAFETY: see above.
    unsafe { std::env::remove_var(CONFIG_ENV) };
    let resolved = config_path(None);
    assert!(resolved.ends_with("config.json") || resolved.ends_with("inferencer.json"));
}

#[test]
fn missing_config_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config(&dir.path().join("absent.json")).unwrap();
    assert_eq!(cfg, LauncherConfig::default());
}

#[test]
fn partial_config_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "executable": "/usr/local/bin/darknet", "threshold": 0.25 }"#)
        .unwrap();
    let cfg = load_config(&path).unwrap();
    assert_eq!(cfg.executable, Some(PathBuf::from("/usr/local/bin/darknet")));
    assert_eq!(cfg.threshold, 0.25);
    assert_eq!(cfg.manifest_name, "test.txt");
    assert_eq!(cfg.link_name, "darknet");
}

#[test]
fn malformed_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config"));
}

#[test]
fn saved_executable_is_loaded_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");
    let cfg = LauncherConfig {
        executable: Some("/opt/darknet/darknet".into()),
        ..LauncherConfig::default()
    };
    save_config(&path, &cfg).unwrap();
    assert_eq!(load_config(&path).unwrap(), cfg);
}
