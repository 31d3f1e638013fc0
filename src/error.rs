//! Error types for the texplot library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BuildError`] — **Fatal**: the run cannot proceed at all (unreadable
//!   script, wrapper write failure, gnuplot or pdflatex exiting non-zero).
//!   Returned as `Err(BuildError)` from the top-level `run_build` /
//!   `post_process` functions.
//!
//! * [`TargetError`] — **Non-fatal**: a single detached branch failed (one
//!   rasterization, one include-file rewrite). These branches are
//!   fire-and-forget, so the error is logged where it happens and never
//!   propagated; a failure for one target leaves every other target intact.
//!
//! Only the compiler and the gnuplot build itself gate the run. Everything
//! downstream of a successful compile — viewer launch, rasterization,
//! artifact sweep, include rewrites — is contained to its own branch.

use std::path::PathBuf;
use thiserror::Error;

use crate::gnuplot::Diagnostic;

/// All fatal errors returned by the texplot library.
///
/// Per-branch failures use [`TargetError`] and are logged rather than
/// propagated here.
#[derive(Debug, Error)]
pub enum BuildError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The gnuplot script could not be read.
    #[error("Failed to read script '{}': {source}", path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The script path has no usable file name.
    #[error("Cannot derive a base name from '{}'", path.display())]
    BadScriptPath { path: PathBuf },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Two `set output` statements declare the same target stem.
    ///
    /// Duplicate stems would silently clobber `png_<stem>.png` and race the
    /// include-file rewrites, so they are rejected before any file is written.
    #[error("Duplicate output target '{name}': each 'set output' stem must be unique")]
    DuplicateTarget { name: String },

    // ── Assembler errors ──────────────────────────────────────────────────
    /// Could not create or write the wrapper document.
    #[error("Failed to write wrapper document '{}': {source}", path.display())]
    WrapperWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Toolchain errors ──────────────────────────────────────────────────
    /// An external tool could not be launched at all.
    #[error("Failed to launch '{program}': {source}\nCheck that it is installed and on PATH.")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The gnuplot build exited non-zero; the pipeline never ran.
    #[error("gnuplot failed (exit {code:?}):\n{detail}")]
    GnuplotFailed {
        code: Option<i32>,
        /// File/line diagnostics matched in gnuplot's stderr.
        diagnostics: Vec<Diagnostic>,
        detail: String,
    },

    /// The document compiler exited non-zero; viewer launch, rasterization
    /// and cleanup were all skipped.
    #[error("'{program}' failed (exit {code:?}):\n{detail}")]
    CompilerFailed {
        program: String,
        code: Option<i32>,
        detail: String,
    },

    /// Required external tools were not found on PATH.
    #[error("Missing external tools: {}", tools.join(", "))]
    MissingTools { tools: Vec<String> },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single detached branch.
///
/// Constructed inside the fire-and-forget tasks spawned by the toolchain
/// driver and the workspace cleaner, logged via `tracing`, and dropped.
/// One branch failing never aborts its siblings or the run.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum TargetError {
    /// Rasterization of one page failed.
    #[error("Target '{target}' (page {page}): rasterization failed: {detail}")]
    Raster {
        target: String,
        page: usize,
        detail: String,
    },

    /// Rewriting one target's include file failed.
    #[error("Target '{target}': include rewrite failed: {detail}")]
    Rewrite { target: String, detail: String },
}
