use std::{io, path::PathBuf};

use thiserror::Error;

use crate::selection::SelectionField;

/// Every way a run can be refused or fail before the detector is running.
/// Display strings are shown to the user as-is.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Please select all necessary files before running inference (missing: {}).", field_list(.0))]
    MissingSelection(Vec<SelectionField>),

    #[error("No Darknet executable is configured.")]
    ExecutableNotConfigured,

    #[error("A Darknet run is already in progress.")]
    AlreadyRunning,

    #[error("Could not read image folder {folder:?}: {source}")]
    ReadFolder {
        folder: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No image files were found in {folder:?}.")]
    NoImages { folder: PathBuf },

    #[error("Failed to create symbolic link {link:?} for Darknet: {source}")]
    Link {
        link: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not create manifest {path:?}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not read manifest {path:?}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("The manifest {path:?} is empty.")]
    EmptyManifest { path: PathBuf },

    #[error("Failed to start Darknet process {executable:?}: {source}")]
    Spawn {
        executable: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    /// Title for the notice dialog.
    pub fn title(&self) -> &'static str {
        match self {
            LaunchError::MissingSelection(_) | LaunchError::ExecutableNotConfigured => {
                "Missing Files"
            }
            LaunchError::NoImages { .. } => "No Images Found",
            LaunchError::AlreadyRunning => "Busy",
            _ => "Error",
        }
    }

    /// Whether the user can fix this by picking something else.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LaunchError::MissingSelection(_)
                | LaunchError::ExecutableNotConfigured
                | LaunchError::AlreadyRunning
                | LaunchError::NoImages { .. }
        )
    }
}

fn field_list(fields: &[SelectionField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}
