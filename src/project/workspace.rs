//! Batch runs over files and directories.
//!
//! ```text
//! collect paths ──▶ read sources ──▶ lookup pre-pass ──▶ worker pool ──▶ Report
//!                                   (headers only)       (one file each)
//! ```
//!
//! Files are independent: each worker owns the module it builds and hands
//! back a [`FileReport`]. The merged [`TypeLookup`] is built once before the
//! pool starts and only read afterwards. Cancellation stops new files from
//! starting; a file already running finishes.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::WorkspaceError;
use super::config::EngineConfig;
use super::file_loader::{InputKind, collect_file_paths, load_file, module_name, output_path};
use crate::hir::{Diagnostic, DiagnosticKind, ExtractOptions, TypeLookup, codes, extract};
use crate::interchange::{Mismatch, ModelFormat, detect_format, round_trip, synthesize};
use crate::model::Module;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Ok,
    Failed,
    /// Not started because the run was cancelled.
    Cancelled,
}

/// Outcome for one input file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    /// File written, if any.
    pub output: Option<PathBuf>,
    pub status: FileStatus,
    pub diagnostics: Vec<Diagnostic>,
    /// Round-trip differences (validation only).
    pub mismatches: Vec<Mismatch>,
    /// Failure that is not a located diagnostic (bad IR, synthesis error).
    pub failure: Option<String>,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            output: None,
            status: FileStatus::Ok,
            diagnostics: Vec::new(),
            mismatches: Vec::new(),
            failure: None,
        }
    }

    fn cancelled(path: &Path) -> Self {
        Self {
            status: FileStatus::Cancelled,
            ..Self::new(path)
        }
    }

    fn fail(mut self, message: impl ToString) -> Self {
        self.failure = Some(message.to_string());
        self.finish()
    }

    fn finish(mut self) -> Self {
        let failed = self.failure.is_some()
            || !self.mismatches.is_empty()
            || self.diagnostics.iter().any(Diagnostic::is_error);
        self.status = if failed { FileStatus::Failed } else { FileStatus::Ok };
        self
    }

    pub fn passed(&self) -> bool {
        self.status == FileStatus::Ok
    }
}

/// Per-file reports of one run, in path order.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub files: Vec<FileReport>,
}

impl Report {
    pub fn has_errors(&self) -> bool {
        self.files.iter().any(|f| f.status == FileStatus::Failed)
    }

    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.files.iter().flat_map(|f| &f.diagnostics)
    }
}

/// One input read up front.
struct Source {
    path: PathBuf,
    kind: InputKind,
    text: std::io::Result<String>,
}

/// Runs extraction, synthesis and validation over paths.
pub struct Workspace {
    config: EngineConfig,
    /// Injected lookup; wins over anything discovered in the inputs.
    lookup: TypeLookup,
    cancel: CancellationToken,
}

impl Workspace {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            lookup: TypeLookup::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_lookup(mut self, lookup: TypeLookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Token that stops the current and later runs from starting new files.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Extract every header under `input` into IR documents under `output`.
    pub fn extract_path(&self, input: &Path, output: &Path) -> Result<Report, WorkspaceError> {
        let format = self.config.output_format()?;
        let paths = collect_file_paths(input, &[InputKind::Header])?;
        let pool = self.pool()?;
        debug!(files = paths.len(), input = %input.display(), "extract run");

        let files = pool.install(|| {
            let sources = read_sources(&paths);
            let lookup = self.project_lookup(&sources);
            sources
                .par_iter()
                .map(|source| {
                    self.guarded(&source.path, || {
                        self.extract_file(source, &lookup, input, output, format.as_ref())
                    })
                })
                .collect()
        });
        Ok(Report { files })
    }

    /// Render every IR document under `input` as a header under `output`.
    pub fn synthesize_path(&self, input: &Path, output: &Path) -> Result<Report, WorkspaceError> {
        let paths = collect_file_paths(input, &[InputKind::Model])?;
        let pool = self.pool()?;
        debug!(files = paths.len(), input = %input.display(), "synthesize run");

        let files = pool.install(|| {
            read_sources(&paths)
                .par_iter()
                .map(|source| self.guarded(&source.path, || self.synthesize_file(source, input, output)))
                .collect()
        });
        Ok(Report { files })
    }

    /// Round-trip every header and IR document under `input`.
    pub fn validate_path(&self, input: &Path) -> Result<Report, WorkspaceError> {
        let paths = collect_file_paths(input, &[InputKind::Header, InputKind::Model])?;
        let pool = self.pool()?;
        debug!(files = paths.len(), input = %input.display(), "validate run");

        let files = pool.install(|| {
            let sources = read_sources(&paths);
            let lookup = self.project_lookup(&sources);
            sources
                .par_iter()
                .map(|source| self.guarded(&source.path, || self.validate_file(source, &lookup)))
                .collect()
        });
        Ok(Report { files })
    }

    fn pool(&self) -> Result<rayon::ThreadPool, WorkspaceError> {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs())
            .build()?)
    }

    /// Run `work` unless the run is cancelled; cancel it after a failure
    /// when failing fast.
    fn guarded(&self, path: &Path, work: impl FnOnce() -> FileReport) -> FileReport {
        if self.cancel.is_cancelled() {
            debug!(path = %path.display(), "run cancelled, skipping");
            return FileReport::cancelled(path);
        }
        let report = work();
        if report.status == FileStatus::Failed && self.config.fail_fast {
            warn!(path = %path.display(), "stopping after first failure");
            self.cancel.cancel();
        }
        report
    }

    /// Injected lookup merged with what the headers themselves declare.
    fn project_lookup(&self, sources: &[Source]) -> TypeLookup {
        let empty = TypeLookup::new();
        let modules: Vec<Module> = sources
            .par_iter()
            .filter(|s| s.kind == InputKind::Header)
            .filter_map(|s| {
                let text = s.text.as_ref().ok()?;
                extract(text, &module_name(&s.path), &empty, &ExtractOptions::default()).module
            })
            .collect();

        let mut discovered = TypeLookup::new();
        for module in &modules {
            discovered.record_module(module);
        }
        let mut lookup = self.lookup.clone();
        lookup.merge(&discovered);
        debug!(
            injected = self.lookup.len(),
            discovered = discovered.len(),
            "built project lookup"
        );
        lookup
    }

    fn extract_file(
        &self,
        source: &Source,
        lookup: &TypeLookup,
        input: &Path,
        output: &Path,
        format: &dyn ModelFormat,
    ) -> FileReport {
        let mut report = FileReport::new(&source.path);
        let text = match &source.text {
            Ok(text) => text,
            Err(e) => {
                report.diagnostics.push(read_error(&source.path, e));
                return report.finish();
            }
        };

        let extraction = extract(text, &module_name(&source.path), lookup, &self.config.extract);
        report.diagnostics = located(&source.path, extraction.diagnostics);
        let Some(module) = extraction.module else {
            return report.finish();
        };

        let bytes = match format.write_module(&module) {
            Ok(bytes) => bytes,
            Err(e) => return report.fail(e),
        };
        let extension = format.extensions().first().copied().unwrap_or("json");
        let target = output_path(input, output, &source.path, extension);
        self.write(report, target, &bytes)
    }

    fn synthesize_file(&self, source: &Source, input: &Path, output: &Path) -> FileReport {
        let report = FileReport::new(&source.path);
        let module = match self.read_model(source) {
            Ok(module) => module,
            Err(report) => return report,
        };
        let text = match synthesize(&module, &self.config.synthesis) {
            Ok(text) => text,
            Err(e) => return report.fail(e),
        };
        let target = output_path(input, output, &source.path, "h");
        self.write(report, target, text.as_bytes())
    }

    fn validate_file(&self, source: &Source, lookup: &TypeLookup) -> FileReport {
        let mut report = FileReport::new(&source.path);
        let module = match source.kind {
            InputKind::Model => match self.read_model(source) {
                Ok(module) => module,
                Err(report) => return report,
            },
            InputKind::Header => {
                let text = match &source.text {
                    Ok(text) => text,
                    Err(e) => {
                        report.diagnostics.push(read_error(&source.path, e));
                        return report.finish();
                    }
                };
                let extraction =
                    extract(text, &module_name(&source.path), lookup, &self.config.extract);
                report.diagnostics = located(&source.path, extraction.diagnostics);
                match extraction.module {
                    Some(module) => module,
                    None => return report.finish(),
                }
            }
        };

        let result = match round_trip(&module, lookup, &self.config.extract, &self.config.synthesis) {
            Ok(result) => result,
            Err(e) => return report.fail(e),
        };
        // Problems in the synthesized text, not in the input.
        report.diagnostics.extend(
            result
                .diagnostics
                .iter()
                .filter(|d| d.is_error())
                .cloned()
                .map(|d| Diagnostic {
                    message: format!("in synthesized text: {}", d.message),
                    ..d.with_file(&source.path)
                }),
        );
        report.mismatches = result.mismatches.clone();
        if result.module.is_some() && !result.stable {
            report.failure = Some("synthesis of the re-extracted model differs".to_string());
        }
        debug!(path = %source.path.display(), passed = result.passed(), "validated");
        report.finish()
    }

    /// Load an IR document; a finished failed report otherwise.
    fn read_model(&self, source: &Source) -> Result<Module, FileReport> {
        let report = FileReport::new(&source.path);
        let text = match &source.text {
            Ok(text) => text,
            Err(e) => {
                let mut report = report;
                report.diagnostics.push(read_error(&source.path, e));
                return Err(report.finish());
            }
        };
        detect_format(&source.path)
            .and_then(|format| format.read_module(text.as_bytes()))
            .map_err(|e| report.fail(e))
    }

    fn write(&self, mut report: FileReport, target: PathBuf, bytes: &[u8]) -> FileReport {
        let written = target
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::write(&target, bytes));
        match written {
            Ok(()) => {
                debug!(path = %target.display(), bytes = bytes.len(), "wrote output");
                report.output = Some(target);
            }
            Err(e) => {
                warn!(path = %target.display(), error = %e, "cannot write output");
                report.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::IoError,
                        codes::IO_ERROR,
                        format!("cannot write {}: {e}", target.display()),
                    )
                    .with_file(&report.path),
                );
            }
        }
        report.finish()
    }
}

fn read_sources(paths: &[PathBuf]) -> Vec<Source> {
    paths
        .par_iter()
        .filter_map(|path| {
            let kind = InputKind::of(path)?;
            Some(Source {
                path: path.clone(),
                kind,
                text: load_file(path),
            })
        })
        .collect()
}

fn read_error(path: &Path, error: &std::io::Error) -> Diagnostic {
    warn!(path = %path.display(), %error, "cannot read input");
    Diagnostic::error(
        DiagnosticKind::IoError,
        codes::IO_ERROR,
        format!("cannot read file: {error}"),
    )
    .with_file(path)
}

fn located(path: &Path, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics.into_iter().map(|d| d.with_file(path)).collect()
}
