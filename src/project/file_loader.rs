//! Input discovery and reading.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::WorkspaceError;

/// Extensions of declaration files.
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hh", "hxx"];

/// Extensions of IR documents.
pub const MODEL_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// What a file on disk holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Header,
    Model,
}

impl InputKind {
    pub fn of(path: &Path) -> Option<Self> {
        let ext = get_extension(path)?;
        if HEADER_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Header)
        } else if MODEL_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Model)
        } else {
            None
        }
    }
}

/// Lower-cased extension without the dot.
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// Files under `root` whose kind is in `kinds`, sorted by path.
///
/// A file given directly must itself be of one of the kinds.
pub fn collect_file_paths(root: &Path, kinds: &[InputKind]) -> Result<Vec<PathBuf>, WorkspaceError> {
    if !root.exists() {
        return Err(WorkspaceError::NotFound(root.to_path_buf()));
    }
    let accepted = |path: &Path| InputKind::of(path).is_some_and(|kind| kinds.contains(&kind));
    if root.is_file() {
        if !accepted(root) {
            return Err(WorkspaceError::UnsupportedInput(root.to_path_buf()));
        }
        return Ok(vec![root.to_path_buf()]);
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| WorkspaceError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && accepted(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

/// Read a file as UTF-8 text.
pub fn load_file(path: &Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}

/// Where the result for `file` goes.
///
/// With a directory input the layout under `input` is mirrored under
/// `output`. With a file input `output` is the file itself, unless it is an
/// existing directory.
pub fn output_path(input: &Path, output: &Path, file: &Path, extension: &str) -> PathBuf {
    if input.is_file() {
        if output.is_dir() {
            let name = file.file_name().map(PathBuf::from).unwrap_or_default();
            return output.join(name).with_extension(extension);
        }
        return output.to_path_buf();
    }
    let relative = file.strip_prefix(input).unwrap_or(file);
    output.join(relative).with_extension(extension)
}

/// Module name for a file: its stem.
pub fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string())
}
