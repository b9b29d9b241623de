pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod launcher;
pub mod link;
pub mod manifest;
pub mod selection;

pub use config::LauncherConfig;
pub use detector::DetectorCommand;
pub use error::LaunchError;
pub use launcher::{Launcher, PreparedRun, RunEvent, RunHandle, RunOutcome, RunStopper};
pub use manifest::Manifest;
pub use selection::{Selection, SelectionField, ValidSelection};

#[cfg(feature = "gui")]
pub mod gui;
