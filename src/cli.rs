use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{LauncherConfig, config_path, load_config},
    launcher::{Launcher, RunEvent},
    selection::Selection,
};

#[derive(Parser, Debug)]
#[command(name = "darknet-inferencer", version)]
#[command(about = "Run Darknet YOLO inference over a folder of images")]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the launcher window (default)
    Gui,
    /// Run inference without a window
    Run(RunArgs),
    /// Print the detector command line without touching the disk
    ShowCommand(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Folder containing the images
    #[arg(long, value_name = "DIR")]
    pub images: PathBuf,

    /// Model configuration (.cfg)
    #[arg(long, value_name = "FILE")]
    pub cfg: PathBuf,

    /// Class names (.names)
    #[arg(long, value_name = "FILE")]
    pub names: PathBuf,

    /// Dataset descriptor (.data)
    #[arg(long, value_name = "FILE")]
    pub data: PathBuf,

    /// Trained weights (.weights)
    #[arg(long, value_name = "FILE")]
    pub weights: PathBuf,

    /// Darknet executable, overrides the config file
    #[arg(long, env = "DARKNET_EXECUTABLE", value_name = "EXE")]
    pub darknet: Option<PathBuf>,

    /// Detection threshold, overrides the config file
    #[arg(long, value_name = "THRESH")]
    pub thresh: Option<f32>,
}

impl RunArgs {
    pub fn selection(&self) -> Selection {
        Selection {
            image_folder: Some(self.images.clone()),
            config: Some(self.cfg.clone()),
            names: Some(self.names.clone()),
            data: Some(self.data.clone()),
            weights: Some(self.weights.clone()),
        }
    }

    pub fn apply(&self, config: &mut LauncherConfig) {
        if let Some(darknet) = &self.darknet {
            config.executable = Some(darknet.clone());
        }
        if let Some(thresh) = self.thresh {
            config.threshold = thresh;
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let path = config_path(cli.config.as_deref());
    let mut config = load_config(&path)?;

    match cli.command.unwrap_or(Commands::Gui) {
        Commands::Gui => run_gui(config, path),
        Commands::Run(args) => {
            args.apply(&mut config);
            run_headless(config, &args)
        }
        Commands::ShowCommand(args) => {
            args.apply(&mut config);
            println!("{}", show_command(&config, &args)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Shell-style line the `run` subcommand would execute.
pub fn show_command(config: &LauncherConfig, args: &RunArgs) -> anyhow::Result<String> {
    let selection = args.selection().validate()?;
    let executable = config
        .executable()
        .context("No Darknet executable configured (use --darknet or DARKNET_EXECUTABLE)")?;
    let parent = selection.parent_dir();
    let command = crate::detector::DetectorCommand {
        executable: executable.to_path_buf(),
        data: selection.data,
        config: selection.config,
        weights: selection.weights,
        threshold: config.threshold,
        manifest: parent.join(&config.manifest_name),
        working_dir: parent,
    };
    Ok(command.shell_line())
}

fn run_headless(config: LauncherConfig, args: &RunArgs) -> anyhow::Result<ExitCode> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let selection = args.selection();

    runtime.block_on(async move {
        let launcher = Launcher::new(config);
        let prepared = launcher.prepare(&selection)?;
        info!("Found {} images.", prepared.image_count());
        let handle = prepared.spawn()?;

        let stopper = handle.stopper();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, stopping Darknet");
                stopper.stop();
            }
        });

        let outcome = handle
            .wait(|event| match event {
                RunEvent::Stdout(line) => println!("{line}"),
                RunEvent::Stderr(line) => eprintln!("{line}"),
                RunEvent::Exited(_) => {}
            })
            .await;

        if outcome.success {
            anyhow::Ok(ExitCode::SUCCESS)
        } else {
            error!(code = ?outcome.code, "Darknet did not finish successfully");
            anyhow::Ok(ExitCode::FAILURE)
        }
    })
}

#[cfg(feature = "gui")]
fn run_gui(config: LauncherConfig, path: PathBuf) -> anyhow::Result<ExitCode> {
    crate::gui::run(config, path).context("GUI failed")?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "gui"))]
fn run_gui(_config: LauncherConfig, _path: PathBuf) -> anyhow::Result<ExitCode> {
    anyhow::bail!("built without the `gui` feature; use the `run` subcommand")
}
