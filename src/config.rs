use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "INFERENCER_CONFIG";

pub const DEFAULT_THRESHOLD: f32 = 0.40;

pub const DEFAULT_EVENT_BUFFER: usize = 1024;

/// Launcher settings. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// The Darknet binary. Linked next to the image folder and invoked directly.
    pub executable: Option<PathBuf>,
    pub threshold: f32,
    /// Compared against file extensions ignoring ASCII case.
    pub image_extensions: Vec<String>,
    pub manifest_name: String,
    pub link_name: String,
    /// Sort manifest entries by path instead of keeping directory order.
    pub sort_manifest: bool,
    /// Output lines queued for a slow reader before new ones are skipped.
    pub event_buffer: usize,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            executable: None,
            threshold: DEFAULT_THRESHOLD,
            image_extensions: vec!["jpg".to_string()],
            manifest_name: "test.txt".to_string(),
            link_name: "darknet".to_string(),
            sort_manifest: true,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl LauncherConfig {
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.image_extensions
                    .iter()
                    .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }

    /// Configured executable, treating an empty path as unset.
    pub fn executable(&self) -> Option<&Path> {
        self.executable
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// Resolve where the config file lives: explicit path, then `INFERENCER_CONFIG`,
/// then the platform config directory, then `inferencer.json` in the working
/// directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("", "", "darknet-inferencer")
        .map(|dirs| dirs.config_dir().join("config.json"))
        .unwrap_or_else(|| PathBuf::from("inferencer.json"))
}

/// Load the config, falling back to defaults when the file does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<LauncherConfig> {
    match fs::read(path) {
        Ok(data) => serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse config {:?}", path)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(LauncherConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read config {:?}", path)),
    }
}

pub fn save_config(path: &Path, config: &LauncherConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }
    let data = serde_json::to_vec_pretty(config)?;
    fs::write(path, data).with_context(|| format!("Failed to write config {:?}", path))?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}
