mod app;
mod message;
mod state;
mod widgets;

use std::path::PathBuf;

use crate::config::LauncherConfig;

pub use app::InferencerApp;
pub use message::Message;
pub use state::{AppState, LogLine, LogSource, RunLog, local_offset};

/// Open the launcher window and block until it is closed.
pub fn run(config: LauncherConfig, config_path: PathBuf) -> iced::Result {
    // Before iced starts its threads.
    let offset = local_offset();
    iced::application(
        move || InferencerApp::new(config.clone(), config_path.clone(), offset),
        InferencerApp::update,
        InferencerApp::view,
    )
    .title(InferencerApp::title)
    .theme(InferencerApp::theme)
    .window_size(iced::Size::new(760.0, 720.0))
    .run()
}
