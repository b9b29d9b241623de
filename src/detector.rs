use std::{
    ffi::OsString,
    fs::File,
    io,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;

/// A `darknet detector test` invocation over a manifest of images.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorCommand {
    pub executable: PathBuf,
    pub data: PathBuf,
    pub config: PathBuf,
    pub weights: PathBuf,
    pub threshold: f32,
    /// Fed to the detector on stdin.
    pub manifest: PathBuf,
    pub working_dir: PathBuf,
}

impl DetectorCommand {
    pub fn threshold_arg(&self) -> String {
        format!("{:.2}", self.threshold)
    }

    /// Arguments after the executable.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "detector".into(),
            "test".into(),
            self.data.clone().into_os_string(),
            self.config.clone().into_os_string(),
            self.weights.clone().into_os_string(),
            "-thresh".into(),
            self.threshold_arg().into(),
            "-dont_show".into(),
            "-save_labels".into(),
        ]
    }

    /// Shell-style rendering for logs and `show-command`. Never executed.
    pub fn shell_line(&self) -> String {
        let mut line = display(&self.executable);
        for arg in self.args() {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line.push_str(" < ");
        line.push_str(&display(&self.manifest));
        line
    }

    /// Build the process with stdin opened from the manifest and both output
    /// pipes captured. The child is killed if its handle is dropped.
    pub fn to_command(&self) -> io::Result<Command> {
        let stdin = File::open(&self.manifest)?;
        let mut command = Command::new(&self.executable);
        command
            .args(self.args())
            .current_dir(&self.working_dir)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(command)
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
