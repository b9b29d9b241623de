use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Child,
    sync::{
        Notify,
        mpsc::{self, error::TrySendError},
    },
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    config::LauncherConfig,
    detector::DetectorCommand,
    error::LaunchError,
    link,
    manifest::{self, Manifest},
    selection::Selection,
};

/// What a running detector reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Stdout(String),
    Stderr(String),
    /// Always the last event of a run.
    Exited(RunOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOutcome {
    pub success: bool,
    /// `None` when killed by a signal or when the status could not be read.
    pub code: Option<i32>,
    pub stopped: bool,
}

/// Runs Darknet over an image folder. Holds at most one run in flight.
#[derive(Debug)]
pub struct Launcher {
    config: LauncherConfig,
    running: Arc<AtomicBool>,
}

impl Launcher {
    pub fn new(config: LauncherConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut LauncherConfig {
        &mut self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Validate the selection, find the images, link the executable and write
    /// the manifest. Nothing touches the disk until validation passed and at
    /// least one image was found.
    pub fn prepare(&self, selection: &Selection) -> Result<PreparedRun, LaunchError> {
        let selection = selection.validate()?;
        let executable = self
            .config
            .executable()
            .ok_or(LaunchError::ExecutableNotConfigured)?
            .to_path_buf();
        let guard = RunGuard::acquire(&self.running).ok_or(LaunchError::AlreadyRunning)?;

        let parent = selection.parent_dir();
        let images = manifest::collect_images(&selection.image_folder, &self.config)?;
        if images.is_empty() {
            return Err(LaunchError::NoImages {
                folder: selection.image_folder,
            });
        }

        let link_path = parent.join(&self.config.link_name);
        link::replace_link(&executable, &link_path).map_err(|source| LaunchError::Link {
            link: link_path.clone(),
            source,
        })?;

        let manifest = manifest::build_manifest(&parent.join(&self.config.manifest_name), &images)?;

        let command = DetectorCommand {
            executable,
            data: selection.data,
            config: selection.config,
            weights: selection.weights,
            threshold: self.config.threshold,
            manifest: manifest.path.clone(),
            working_dir: parent,
        };
        debug!(command = %command.shell_line(), "prepared run");

        Ok(PreparedRun {
            command,
            manifest,
            event_buffer: self.config.event_buffer.max(1),
            guard,
        })
    }

    /// `prepare` followed by `spawn`. Must be called inside a tokio runtime.
    pub fn launch(&self, selection: &Selection) -> Result<RunHandle, LaunchError> {
        self.prepare(selection)?.spawn()
    }
}

/// Everything is on disk and the in-flight slot is taken. Dropping this
/// without spawning frees the slot again.
#[derive(Debug)]
pub struct PreparedRun {
    command: DetectorCommand,
    manifest: Manifest,
    event_buffer: usize,
    guard: RunGuard,
}

impl PreparedRun {
    pub fn command(&self) -> &DetectorCommand {
        &self.command
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn image_count(&self) -> usize {
        self.manifest.count
    }

    /// Start the detector. Must be called inside a tokio runtime.
    pub fn spawn(self) -> Result<RunHandle, LaunchError> {
        let spawn_err = |source| LaunchError::Spawn {
            executable: self.command.executable.clone(),
            source,
        };
        let mut child = self
            .command
            .to_command()
            .and_then(|mut command| command.spawn())
            .map_err(spawn_err)?;
        let pid = child.id();
        info!(
            pid,
            images = self.manifest.count,
            command = %self.command.shell_line(),
            "Darknet started"
        );

        let (tx, rx) = mpsc::channel(self.event_buffer);
        let mut drains = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            drains.push(tokio::spawn(relay(stdout, tx.clone(), RunEvent::Stdout)));
        }
        if let Some(stderr) = child.stderr.take() {
            drains.push(tokio::spawn(relay(stderr, tx.clone(), RunEvent::Stderr)));
        }

        let stop = Arc::new(Notify::new());
        tokio::spawn(supervise(child, drains, tx, stop.clone(), self.guard));

        Ok(RunHandle {
            events: rx,
            stopper: RunStopper(stop),
            pid,
        })
    }
}

/// Subscription to one run's events.
#[derive(Debug)]
pub struct RunHandle {
    events: mpsc::Receiver<RunEvent>,
    stopper: RunStopper,
    pid: Option<u32>,
}

impl RunHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn stopper(&self) -> RunStopper {
        self.stopper.clone()
    }

    /// Events queued and not yet taken.
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    /// Next event, or `None` once the run is over and every event was taken.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Feed every event to `on_event` and return the outcome.
    pub async fn wait(mut self, mut on_event: impl FnMut(&RunEvent)) -> RunOutcome {
        while let Some(event) = self.next_event().await {
            on_event(&event);
            if let RunEvent::Exited(outcome) = event {
                return outcome;
            }
        }
        RunOutcome::default()
    }
}

/// Asks a running detector to stop. Cheap to clone; stopping twice is harmless.
#[derive(Debug, Clone)]
pub struct RunStopper(Arc<Notify>);

impl RunStopper {
    pub fn stop(&self) {
        self.0.notify_one();
    }
}

#[derive(Debug)]
struct RunGuard(Arc<AtomicBool>);

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Forward `reader` line by line. Keeps reading when the queue is full or the
/// receiver is gone so the child never blocks on a full pipe. Lines that do
/// not fit are counted and reported as one marker line once there is room.
async fn relay<R>(reader: R, events: mpsc::Sender<RunEvent>, wrap: fn(String) -> RunEvent)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut skipped = 0usize;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if skipped > 0 {
                    match events.try_send(wrap(format!("[{skipped} lines skipped]"))) {
                        Ok(()) => skipped = 0,
                        Err(TrySendError::Full(_)) => {
                            skipped += 1;
                            continue;
                        }
                        Err(TrySendError::Closed(_)) => continue,
                    }
                }
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\n', '\r'])
                    .to_string();
                if let Err(TrySendError::Full(_)) = events.try_send(wrap(line)) {
                    skipped += 1;
                }
            }
            Err(e) => {
                warn!("failed to read Darknet output: {e}");
                break;
            }
        }
    }
    if skipped > 0 {
        warn!(skipped, "Darknet output skipped, reader too slow");
    }
}

async fn supervise(
    mut child: Child,
    drains: Vec<JoinHandle<()>>,
    events: mpsc::Sender<RunEvent>,
    stop: Arc<Notify>,
    guard: RunGuard,
) {
    let mut stopped = false;
    let status = tokio::select! {
        status = child.wait() => status,
        _ = stop.notified() => {
            stopped = true;
            info!("stopping Darknet");
            if let Err(e) = child.start_kill() {
                warn!("failed to kill Darknet: {e}");
            }
            child.wait().await
        }
    };
    for drain in drains {
        let _ = drain.await;
    }

    let outcome = match status {
        Ok(status) => RunOutcome {
            success: status.success(),
            code: status.code(),
            stopped,
        },
        Err(e) => {
            error!("failed to wait for Darknet: {e}");
            RunOutcome {
                stopped,
                ..RunOutcome::default()
            }
        }
    };
    if outcome.success {
        info!(code = ?outcome.code, "Darknet finished");
    } else {
        warn!(code = ?outcome.code, stopped, "Darknet exited unsuccessfully");
    }
    // Free the slot before announcing the exit.
    drop(guard);
    let _ = events.send(RunEvent::Exited(outcome)).await;
}
