//! Project runs: configuration, input discovery and the worker pool that
//! extracts, synthesizes or validates many files at once.

mod config;
mod error;
pub mod file_loader;
mod workspace;

pub use config::{EngineConfig, load_lookup};
pub use error::WorkspaceError;
pub use file_loader::InputKind;
pub use workspace::{FileReport, FileStatus, Report, Workspace};
