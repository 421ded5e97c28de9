//! LookML files on disk and output routing

use dbtea_core::{DbteaError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::emit::dump;
use crate::parse::load;
use crate::translate::Translation;

/// LookML file kind, encoded in the file name's inner suffix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookmlFileKind {
    View,
    Model,
    Explore,
    /// Plain `<name>.lkml`
    Generic,
    /// Any other `<name>.<kind>.lkml`
    Other(String),
}

impl LookmlFileKind {
    pub fn parse(kind: &str) -> Self {
        match kind.to_lowercase().as_str() {
            "view" => Self::View,
            "model" => Self::Model,
            "explore" => Self::Explore,
            "" | "generic" => Self::Generic,
            other => Self::Other(other.to_string()),
        }
    }

    /// Inner suffix, `None` for generic files
    pub fn suffix(&self) -> Option<&str> {
        match self {
            Self::View => Some("view"),
            Self::Model => Some("model"),
            Self::Explore => Some("explore"),
            Self::Generic => None,
            Self::Other(kind) => Some(kind.as_str()),
        }
    }
}

/// A named LookML file and its parsed contents
#[derive(Debug, Clone, PartialEq)]
pub struct LookmlFile {
    pub name: String,
    pub kind: LookmlFileKind,
    pub data: Value,
}

impl LookmlFile {
    pub fn new(name: impl Into<String>, kind: LookmlFileKind, data: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            data,
        }
    }

    /// Parse LookML text into a file of the given kind
    pub fn from_lookml_str(name: impl Into<String>, kind: LookmlFileKind, text: &str) -> Result<Self> {
        Ok(Self::new(name, kind, load(text)?))
    }

    /// Read a file, taking name and kind from `orders.view.lkml`-style paths
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                DbteaError::invalid_input(
                    "invalid-lookml-file-path",
                    "Invalid LookML file path",
                    format!("{} does not name a file", path.display()),
                )
            })?;

        let stem = file_name.strip_suffix(".lkml").unwrap_or(file_name);
        let (name, kind) = match stem.rsplit_once('.') {
            Some((name, kind)) => (name, LookmlFileKind::parse(kind)),
            None => (stem, LookmlFileKind::Generic),
        };

        tracing::info!("Parsing data from local LookML file {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| DbteaError::io(path, e))?;
        let data = load(&text).map_err(|mut e| {
            e.detail = format!("{}: {}", path.display(), e.detail);
            e
        })?;

        Ok(Self::new(name, kind, data))
    }

    /// `<name>.<kind>.lkml`, or `<name>.lkml` for generic files
    pub fn file_name(&self) -> String {
        file_name_for(&self.name, &self.kind)
    }

    pub fn path_in(&self, directory: &Path) -> PathBuf {
        directory.join(self.file_name())
    }

    pub fn to_lookml(&self) -> String {
        dump(&self.data)
    }

    /// Names must stay inside the directory they are written to
    fn check_name(&self) -> Result<()> {
        let escapes = self.name.is_empty()
            || self.name.contains(['/', '\\'])
            || self.name.contains("..");
        if escapes {
            return Err(DbteaError::invalid_input(
                "invalid-lookml-file-name",
                "Invalid LookML file name",
                format!("{:?} must be a plain file name without path separators or '..'", self.name),
            ));
        }
        Ok(())
    }

    /// Re-read this file's contents from `directory`
    pub fn read(&mut self, directory: &Path) -> Result<&Value> {
        self.check_name()?;
        let path = self.path_in(directory);
        let text = std::fs::read_to_string(&path).map_err(|e| DbteaError::io(&path, e))?;
        self.data = load(&text)?;
        Ok(&self.data)
    }

    /// Write the rendered LookML into `directory`, creating it if needed
    pub fn write(&self, directory: &Path) -> Result<PathBuf> {
        self.check_name()?;
        std::fs::create_dir_all(directory).map_err(|e| DbteaError::io(directory, e))?;
        let path = self.path_in(directory);
        std::fs::write(&path, self.to_lookml()).map_err(|e| DbteaError::io(&path, e))?;
        tracing::info!("Wrote LookML file {}", path.display());
        Ok(path)
    }
}

fn file_name_for(name: &str, kind: &LookmlFileKind) -> String {
    match kind.suffix() {
        Some(suffix) => format!("{}.{}.lkml", name, suffix),
        None => format!("{}.lkml", name),
    }
}

/// Where rendered LookML goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    /// Directory receiving the file
    File(PathBuf),
}

/// Render `data` and route it to `target`
///
/// Returns the text for [`OutputTarget::Stdout`], and writes
/// `<dir>/<file>.<kind>.lkml` (or `<file>.lkml` without a kind) otherwise.
pub fn to_lookml(
    data: &Value,
    target: &OutputTarget,
    file: &str,
    kind: Option<LookmlFileKind>,
) -> Result<Option<String>> {
    match target {
        OutputTarget::Stdout => Ok(Some(dump(data))),
        OutputTarget::File(directory) => {
            let file = LookmlFile::new(file, kind.unwrap_or(LookmlFileKind::Generic), data.clone());
            file.write(directory)?;
            Ok(None)
        }
    }
}

/// One `<name>.view.lkml` per distinct view name, in first-seen order
///
/// Views sharing a name land in the same file, one `view:` block each.
/// Unnamed views cannot be given a file name and are skipped.
pub fn view_files(translation: &Translation) -> Vec<LookmlFile> {
    let mut grouped: Vec<(&str, Vec<Value>)> = Vec::new();

    for view in &translation.views {
        let Some(name) = view.name() else {
            tracing::warn!("Skipping view without a name; it has no file to go to");
            continue;
        };
        match grouped.iter_mut().find(|(seen, _)| *seen == name) {
            Some((_, views)) => {
                tracing::warn!("Writing {} views named {} to one file", views.len() + 1, name);
                views.push(view.to_value());
            }
            None => grouped.push((name, vec![view.to_value()])),
        }
    }

    grouped
        .into_iter()
        .map(|(name, views)| {
            let data = serde_json::json!({ "views": views });
            LookmlFile::new(name, LookmlFileKind::View, data)
        })
        .collect()
}

/// Write every translated view into `directory`
pub fn write_view_files(translation: &Translation, directory: &Path) -> Result<Vec<PathBuf>> {
    view_files(translation)
        .iter()
        .map(|file| file.write(directory))
        .collect()
}
