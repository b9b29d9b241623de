use std::{fs, io, path::Path};

use tracing::{debug, trace};

/// Point `link` at `target`, replacing whatever sits at `link` first.
///
/// Dangling links are replaced too; `Path::exists` would miss them.
pub fn replace_link(target: &Path, link: &Path) -> io::Result<()> {
    match fs::symlink_metadata(link) {
        Ok(_) => {
            fs::remove_file(link)?;
            trace!(link = %link.display(), "removed existing link");
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    symlink(target, link)?;
    debug!(link = %link.display(), target = %target.display(), "linked executable");
    Ok(())
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
