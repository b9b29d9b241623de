use std::{
    fs,
    path::{Path, PathBuf},
};

use darknet_inferencer::{LauncherConfig, Selection};
use tempfile::TempDir;

/// `<tmp>/run/images` holding the given files, plus model files in
/// `<tmp>/run/model`. The temp dir must be kept alive.
pub struct Workspace {
    pub dir: TempDir,
    pub run: PathBuf,
    pub images: PathBuf,
    pub model: PathBuf,
}

impl Workspace {
    pub fn manifest_path(&self) -> PathBuf {
        self.run.join("test.txt")
    }

    pub fn link_path(&self) -> PathBuf {
        self.run.join("darknet")
    }

    pub fn selection(&self) -> Selection {
        Selection {
            image_folder: Some(self.images.clone()),
            config: Some(self.model.join("yolo.cfg")),
            names: Some(self.model.join("coco.names")),
            data: Some(self.model.join("coco.data")),
            weights: Some(self.model.join("yolo.weights")),
        }
    }
}

pub fn make_workspace(files: &[&str]) -> Workspace {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let run = dir.path().join("run");
    let images = run.join("images");
    let model = run.join("model");
    fs::create_dir_all(&images).expect("Failed to create image folder");
    fs::create_dir_all(&model).expect("Failed to create model folder");
    for name in files {
        fs::write(images.join(name), b"not really an image").expect("Failed to write image");
    }
    for name in ["yolo.cfg", "coco.names", "coco.data", "yolo.weights"] {
        fs::write(model.join(name), b"").expect("Failed to write model file");
    }
    Workspace {
        dir,
        run,
        images,
        model,
    }
}

pub fn config_for(executable: &Path) -> LauncherConfig {
    LauncherConfig {
        executable: Some(executable.to_path_buf()),
        ..LauncherConfig::default()
    }
}

/// First of `candidates` that exists, for tests that need a real program.
pub fn find_program(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().map(PathBuf::from).find(|p| p.is_file())
}

pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("Failed to read manifest")
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn link_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
