use std::path::PathBuf;

use iced::{
    Element,
    Length::Fill,
    Task, Theme,
    futures::{SinkExt, channel::mpsc},
    widget::{button, column, container, row, text},
};
use rfd::{AsyncFileDialog, AsyncMessageDialog, MessageButtons, MessageLevel};
use time::UtcOffset;
use tracing::{debug, error, info, warn};

use super::{
    Message,
    state::{AppState, LogSource},
    widgets::{log_view, picker_row},
};
use crate::{
    config::{LauncherConfig, save_config},
    error::LaunchError,
    launcher::{Launcher, RunEvent, RunOutcome},
    selection::SelectionField,
};

pub struct InferencerApp {
    launcher: Launcher,
    config_path: PathBuf,
    state: AppState,
}

impl InferencerApp {
    pub fn new(config: LauncherConfig, config_path: PathBuf, offset: UtcOffset) -> Self {
        Self {
            launcher: Launcher::new(config),
            config_path,
            state: AppState::new(offset),
        }
    }

    pub fn title(&self) -> String {
        "Darknet Inferencer".to_string()
    }

    pub fn theme(&self) -> Theme {
        Theme::Light
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Pick(field) => {
                Task::perform(pick_path(field), move |path| Message::Picked(field, path))
            }
            Message::Picked(field, Some(path)) => {
                debug!(%field, path = %path.display(), "selected");
                self.state.selection.set(field, path);
                Task::none()
            }
            Message::Picked(_, None) => Task::none(),
            Message::PickExecutable => Task::perform(
                AsyncFileDialog::new()
                    .set_title("Select Darknet Executable")
                    .pick_file(),
                |handle| Message::PickedExecutable(handle.map(|h| h.path().to_path_buf())),
            ),
            Message::PickedExecutable(Some(path)) => {
                self.launcher.config_mut().executable = Some(path);
                match save_config(&self.config_path, self.launcher.config()) {
                    Ok(()) => Task::none(),
                    Err(e) => {
                        warn!("failed to save config: {e:#}");
                        notice(
                            MessageLevel::Warning,
                            "Error",
                            format!("Could not save configuration: {e:#}"),
                        )
                    }
                }
            }
            Message::PickedExecutable(None) => Task::none(),
            Message::RunRequested => self.start_run(),
            Message::StopRequested => {
                if let Some(stopper) = &self.state.stopper {
                    stopper.stop();
                    self.state.log.push(LogSource::App, "Stop requested.");
                }
                Task::none()
            }
            Message::Started { pid, stopper } => {
                self.state.stopper = Some(stopper);
                let pid = pid.map_or_else(|| "?".to_string(), |p| p.to_string());
                self.state
                    .log
                    .push(LogSource::App, format!("Darknet started (pid {pid})."));
                Task::none()
            }
            Message::Output(event) => self.on_run_event(event),
            Message::SpawnFailed(reason) => {
                self.state.log.push(LogSource::App, reason.clone());
                notice(MessageLevel::Error, "Error", reason)
            }
            Message::NoticeClosed => Task::none(),
        }
    }

    fn start_run(&mut self) -> Task<Message> {
        let prepared = match self.launcher.prepare(&self.state.selection) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!("run refused: {e}");
                self.state.log.push(LogSource::App, e.to_string());
                return notice(level_for(&e), e.title(), e.to_string());
            }
        };

        let count = prepared.image_count();
        self.state.log.clear();
        self.state.log.push(
            LogSource::App,
            format!("Running: {}", prepared.command().shell_line()),
        );

        let run = Task::stream(iced::stream::channel(
            64,
            move |mut output: mpsc::Sender<Message>| async move {
                match prepared.spawn() {
                    Ok(mut handle) => {
                        let _ = output
                            .send(Message::Started {
                                pid: handle.pid(),
                                stopper: handle.stopper(),
                            })
                            .await;
                        while let Some(event) = handle.next_event().await {
                            let _ = output.send(Message::Output(event)).await;
                        }
                    }
                    Err(e) => {
                        error!("{e}");
                        let _ = output.send(Message::SpawnFailed(e.to_string())).await;
                    }
                }
            },
        ));

        Task::batch([
            notice(
                MessageLevel::Info,
                "Images Count",
                format!("Found {count} images."),
            ),
            run,
        ])
    }

    fn on_run_event(&mut self, event: RunEvent) -> Task<Message> {
        match event {
            RunEvent::Stdout(line) => {
                debug!(target: "darknet", "{line}");
                self.state.log.push(LogSource::Stdout, line);
                Task::none()
            }
            RunEvent::Stderr(line) => {
                warn!(target: "darknet", "{line}");
                self.state.log.push(LogSource::Stderr, line);
                Task::none()
            }
            RunEvent::Exited(outcome) => {
                self.state.stopper = None;
                let summary = describe(outcome);
                info!("{summary}");
                self.state.log.push(LogSource::App, summary.clone());
                if outcome.success {
                    notice(MessageLevel::Info, "Inference Finished", summary)
                } else if outcome.stopped {
                    Task::none()
                } else {
                    notice(MessageLevel::Warning, "Inference Failed", summary)
                }
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let mut content = column![text("Darknet Inferencer").size(24)]
            .spacing(12)
            .padding(20);

        for field in SelectionField::ALL {
            let shown = self
                .state
                .selection
                .get(field)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| field.placeholder().to_string());
            content = content.push(picker_row(shown, field.dialog_title(), Message::Pick(field)));
        }

        let executable = self
            .launcher
            .config()
            .executable()
            .map(|p| format!("Darknet: {}", p.display()))
            .unwrap_or_else(|| "No Darknet executable configured".to_string());
        content = content.push(picker_row(
            executable,
            "Select Darknet Executable",
            Message::PickExecutable,
        ));

        let running = self.launcher.is_running();
        let controls = row![
            button(text("Run Darknet Inference").size(14))
                .on_press_maybe((!running).then_some(Message::RunRequested))
                .style(button::success),
            button(text("Stop").size(14))
                .on_press_maybe(self.state.stopper.as_ref().map(|_| Message::StopRequested))
                .style(button::danger),
        ]
        .spacing(12);

        content = content.push(controls).push(log_view(&self.state.log));

        container(content).width(Fill).height(Fill).into()
    }
}

async fn pick_path(field: SelectionField) -> Option<PathBuf> {
    let dialog = AsyncFileDialog::new().set_title(field.dialog_title());
    let handle = match field.filter() {
        None => dialog.pick_folder().await,
        Some((name, extensions)) => {
            let mut dialog = dialog.add_filter(name, extensions);
            if field == SelectionField::Weights {
                dialog = dialog.add_filter("All Files", &["*"]);
            }
            dialog.pick_file().await
        }
    };
    handle.map(|h| h.path().to_path_buf())
}

fn notice(level: MessageLevel, title: &str, description: impl Into<String>) -> Task<Message> {
    let dialog = AsyncMessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description.into())
        .set_buttons(MessageButtons::Ok);
    Task::perform(dialog.show(), |_| Message::NoticeClosed)
}

fn level_for(error: &LaunchError) -> MessageLevel {
    if error.is_validation() {
        MessageLevel::Warning
    } else {
        MessageLevel::Error
    }
}

fn describe(outcome: RunOutcome) -> String {
    match (outcome.stopped, outcome.code) {
        (true, _) => "Darknet was stopped.".to_string(),
        (false, Some(0)) => "Darknet finished successfully.".to_string(),
        (false, Some(code)) => format!("Darknet exited with code {code}."),
        (false, None) => "Darknet terminated without an exit code.".to_string(),
    }
}
