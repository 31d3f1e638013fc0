//! Run summary returned by the orchestrator.
//!
//! The pipeline has no notion of overall completion beyond the compile —
//! viewer launch, rasterizations, the artifact sweep and include rewrites
//! are all detached. [`BuildOutput`] therefore splits the result in two:
//! the serializable [`BuildReport`] describing everything that was decided
//! and awaited, plus the handles of the detached branches for hosts that
//! want to keep the process alive until they drain (the CLI does; an
//! editor host with its own event loop would not).

use crate::gnuplot::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::warn;

/// Serializable summary of one build run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    /// Script base name with the extension stripped.
    pub script_stem: String,
    /// Wrapper document path (transient; swept by cleanup).
    pub wrapper_path: PathBuf,
    /// Compiled output path (persists).
    pub pdf_path: PathBuf,
    /// Extracted target names, in source order.
    pub targets: Vec<String>,
    /// File/line diagnostics gnuplot printed during the build step.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of detached rasterization tasks spawned.
    pub rasterizations_spawned: usize,
    /// Number of detached include-rewrite tasks spawned.
    pub rewrites_spawned: usize,
    /// Wall-clock duration of the gnuplot build step.
    pub gnuplot_duration_ms: u64,
    /// Wall-clock duration of the awaited compile.
    pub compile_duration_ms: u64,
    /// Wall-clock duration up to the point the run returned (detached
    /// branches may still be running).
    pub total_duration_ms: u64,
}

/// A finished run: the report plus the still-running detached branches.
#[derive(Debug)]
pub struct BuildOutput {
    pub report: BuildReport,
    /// Handles of the fire-and-forget tasks (viewer, rasterizations,
    /// artifact sweep, include rewrites). The pipeline never awaits these;
    /// hosts may.
    pub background: Vec<JoinHandle<()>>,
}

impl BuildOutput {
    /// Drain the detached branches, then hand back the report.
    ///
    /// For hosts without their own event loop (the CLI), exiting before the
    /// detached rasterizations finish would orphan them mid-write.
    pub async fn wait_for_background(self) -> BuildReport {
        for result in futures::future::join_all(self.background).await {
            if let Err(err) = result {
                warn!("Detached task panicked: {err}");
            }
        }
        self.report
    }
}
