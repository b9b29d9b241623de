use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::LaunchError;

/// One of the five paths a user has to pick before a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionField {
    ImageFolder,
    Config,
    Names,
    Data,
    Weights,
}

impl SelectionField {
    pub const ALL: [SelectionField; 5] = [
        SelectionField::ImageFolder,
        SelectionField::Config,
        SelectionField::Names,
        SelectionField::Data,
        SelectionField::Weights,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SelectionField::ImageFolder => "image folder",
            SelectionField::Config => "config file",
            SelectionField::Names => "names file",
            SelectionField::Data => "data file",
            SelectionField::Weights => "weights file",
        }
    }

    pub fn dialog_title(self) -> &'static str {
        match self {
            SelectionField::ImageFolder => "Select Image Folder",
            SelectionField::Config => "Select Config File",
            SelectionField::Names => "Select Names File",
            SelectionField::Data => "Select Data File",
            SelectionField::Weights => "Select Weights File",
        }
    }

    /// Text shown in place of the path while nothing is picked.
    pub fn placeholder(self) -> &'static str {
        match self {
            SelectionField::ImageFolder => "No folder selected",
            SelectionField::Config => "No config file selected",
            SelectionField::Names => "No names file selected",
            SelectionField::Data => "No data file selected",
            SelectionField::Weights => "No weights file selected",
        }
    }

    /// File dialog filter as `(name, extensions)`. `None` means a folder picker.
    pub fn filter(self) -> Option<(&'static str, &'static [&'static str])> {
        match self {
            SelectionField::ImageFolder => None,
            SelectionField::Config => Some(("Config Files", &["cfg"])),
            SelectionField::Names => Some(("Names Files", &["names"])),
            SelectionField::Data => Some(("Data Files", &["data"])),
            SelectionField::Weights => Some(("Weights Files", &["weights"])),
        }
    }
}

impl fmt::Display for SelectionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Paths picked so far. Lives as long as the window; nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub image_folder: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub names: Option<PathBuf>,
    pub data: Option<PathBuf>,
    pub weights: Option<PathBuf>,
}

impl Selection {
    fn slot(&self, field: SelectionField) -> &Option<PathBuf> {
        match field {
            SelectionField::ImageFolder => &self.image_folder,
            SelectionField::Config => &self.config,
            SelectionField::Names => &self.names,
            SelectionField::Data => &self.data,
            SelectionField::Weights => &self.weights,
        }
    }

    pub fn get(&self, field: SelectionField) -> Option<&Path> {
        self.slot(field)
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn set(&mut self, field: SelectionField, path: PathBuf) {
        let slot = match field {
            SelectionField::ImageFolder => &mut self.image_folder,
            SelectionField::Config => &mut self.config,
            SelectionField::Names => &mut self.names,
            SelectionField::Data => &mut self.data,
            SelectionField::Weights => &mut self.weights,
        };
        *slot = Some(path);
    }

    /// Fields that are unset or hold an empty path, in display order.
    pub fn missing(&self) -> Vec<SelectionField> {
        SelectionField::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_none())
            .collect()
    }

    pub fn validate(&self) -> Result<ValidSelection, LaunchError> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(LaunchError::MissingSelection(missing));
        }
        let take = |field| self.get(field).map(Path::to_path_buf).unwrap_or_default();
        Ok(ValidSelection {
            image_folder: take(SelectionField::ImageFolder),
            config: take(SelectionField::Config),
            names: take(SelectionField::Names),
            data: take(SelectionField::Data),
            weights: take(SelectionField::Weights),
        })
    }
}

/// A selection with every field present.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSelection {
    pub image_folder: PathBuf,
    pub config: PathBuf,
    pub names: PathBuf,
    pub data: PathBuf,
    pub weights: PathBuf,
}

impl ValidSelection {
    /// Absolute parent of the image folder. Manifest, link and working
    /// directory all live here.
    pub fn parent_dir(&self) -> PathBuf {
        let folder =
            std::path::absolute(&self.image_folder).unwrap_or_else(|_| self.image_folder.clone());
        match folder.parent() {
            Some(parent) => parent.to_path_buf(),
            None => folder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> Selection {
        Selection {
            image_folder: Some("/data/run/images".into()),
            config: Some("yolo.cfg".into()),
            names: Some("coco.names".into()),
            data: Some("coco.data".into()),
            weights: Some("yolo.weights".into()),
        }
    }

    #[test]
    fn empty_path_counts_as_missing() {
        let mut selection = full();
        selection.names = Some(PathBuf::new());
        selection.weights = None;
        assert_eq!(
            selection.missing(),
            vec![SelectionField::Names, SelectionField::Weights]
        );
        assert!(matches!(
            selection.validate(),
            Err(LaunchError::MissingSelection(fields)) if fields.len() == 2
        ));
    }

    #[test]
    fn parent_dir_strips_trailing_separator() {
        let mut selection = full();
        selection.image_folder = Some("/data/run/images/".into());
        let valid = selection.validate().unwrap();
        assert_eq!(valid.parent_dir(), PathBuf::from("/data/run"));
    }

    #[test]
    fn set_then_get() {
        let mut selection = Selection::default();
        selection.set(SelectionField::Data, "a.data".into());
        assert_eq!(selection.get(SelectionField::Data), Some(Path::new("a.data")));
        assert_eq!(selection.missing().len(), 4);
    }
}
