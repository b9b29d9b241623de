//! The manifest is the list of images Darknet reads from stdin, one absolute
//! path per line.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{config::LauncherConfig, error::LaunchError};

#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub path: PathBuf,
    /// Lines counted by re-reading the written file.
    pub count: usize,
}

/// Absolute paths of the regular files in `folder` that look like images.
///
/// Directory order is whatever the platform returns; entries are sorted when
/// `config.sort_manifest` is set. Paths containing a line break cannot be
/// written as a single manifest line and are skipped.
pub fn collect_images(folder: &Path, config: &LauncherConfig) -> Result<Vec<PathBuf>, LaunchError> {
    let read_err = |source| LaunchError::ReadFolder {
        folder: folder.to_path_buf(),
        source,
    };
    let folder_abs = std::path::absolute(folder).map_err(read_err)?;

    let mut images = Vec::new();
    for entry in fs::read_dir(&folder_abs).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = folder_abs.join(entry.file_name());
        if !path.is_file() || !config.is_image(&path) {
            continue;
        }
        if has_line_break(&path) {
            warn!(path = ?path, "skipping image with a line break in its path");
            continue;
        }
        images.push(path);
    }
    if config.sort_manifest {
        images.sort();
    }
    debug!(folder = %folder_abs.display(), count = images.len(), "collected images");
    Ok(images)
}

fn has_line_break(path: &Path) -> bool {
    path.as_os_str()
        .as_encoded_bytes()
        .iter()
        .any(|b| matches!(b, b'\n' | b'\r'))
}

/// Truncate `path` and write one image per line.
pub fn write_manifest(path: &Path, images: &[PathBuf]) -> Result<(), LaunchError> {
    let write_err = |source| LaunchError::ManifestWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(write_err)?);
    for image in images {
        out.write_all(image.as_os_str().as_encoded_bytes())
            .and_then(|_| out.write_all(b"\n"))
            .map_err(write_err)?;
    }
    out.flush().map_err(write_err)
}

/// Number of lines in the manifest. A trailing unterminated line counts.
pub fn count_entries(path: &Path) -> Result<usize, LaunchError> {
    let data = fs::read(path).map_err(|source| LaunchError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    let terminated = data.iter().filter(|b| **b == b'\n').count();
    let trailing = usize::from(data.last().is_some_and(|b| *b != b'\n'));
    Ok(terminated + trailing)
}

/// Write the manifest for `images` and verify it by reading it back.
pub fn build_manifest(path: &Path, images: &[PathBuf]) -> Result<Manifest, LaunchError> {
    write_manifest(path, images)?;
    let count = count_entries(path)?;
    if count == 0 {
        return Err(LaunchError::EmptyManifest {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), count, "manifest written");
    Ok(Manifest {
        path: path.to_path_buf(),
        count,
    })
}
