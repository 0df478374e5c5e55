//! Errors that stop a whole run rather than one file.

use std::path::PathBuf;

use thiserror::Error;

use crate::interchange::InterchangeError;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("input not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A single input file of the wrong kind for the command.
    #[error("unsupported input: {}", .0.display())]
    UnsupportedInput(PathBuf),

    #[error("cannot walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed configuration or lookup document.
    #[error("{}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("unknown IR format `{0}` (expected json or yaml)")]
    UnknownFormat(String),

    #[error("{}: {source}", path.display())]
    Interchange {
        path: PathBuf,
        #[source]
        source: InterchangeError,
    },

    #[error("cannot start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl WorkspaceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Config {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
