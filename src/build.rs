//! Run orchestration: the build step plus the four post-processing stages.
//!
//! Stage ordering is strict up to the compile and loose after it:
//!
//! ```text
//! gnuplot ──▶ extract ──▶ assemble ──▶ pdflatex ──┬─▶ viewer        (detached)
//! (awaited)   (pure)      (awaited)    (awaited)  ├─▶ convert × N   (detached)
//!                                                 ├─▶ sweep aux/log (detached)
//!                                                 └─▶ rewrites × N  (detached)
//! ```
//!
//! Only gnuplot and pdflatex gate the run. The detached branches are
//! spawned without a join barrier; their handles ride along on the returned
//! [`BuildOutput`] for hosts that need to outlive them.

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::gnuplot;
use crate::pipeline::toolchain::ProcessRunner;
use crate::pipeline::{assemble, cleanup, extract, toolchain};
use crate::report::{BuildOutput, BuildReport};
use crate::script::SourceScript;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Run the full build: gnuplot on the script at `script_path`, then the
/// post-processing pipeline.
///
/// This is the primary entry point for the CLI.
///
/// # Errors
/// Fatal only: unreadable script, gnuplot failure, wrapper write failure,
/// duplicate target stems, compiler failure. Detached-branch failures are
/// logged, never returned.
pub async fn run_build(
    script_path: impl AsRef<Path>,
    config: &BuildConfig,
    runner: &Arc<dyn ProcessRunner>,
) -> Result<BuildOutput, BuildError> {
    let total_start = Instant::now();
    let script = SourceScript::load(script_path).await?;

    let gnuplot_start = Instant::now();
    let diagnostics = gnuplot::run_gnuplot(runner, config, &script).await?;
    let gnuplot_duration_ms = gnuplot_start.elapsed().as_millis() as u64;

    let mut output = post_process(&script, config, runner).await?;
    output.report.diagnostics = diagnostics;
    output.report.gnuplot_duration_ms = gnuplot_duration_ms;
    output.report.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Run only the post-processing pipeline on an already-built script.
///
/// For hosts that invoked gnuplot themselves and deliver a "build
/// succeeded" signal: extraction, assembly, compile, then the detached
/// viewer/rasterizer/cleanup branches.
pub async fn post_process(
    script: &SourceScript,
    config: &BuildConfig,
    runner: &Arc<dyn ProcessRunner>,
) -> Result<BuildOutput, BuildError> {
    let total_start = Instant::now();

    // ── Stage 1: extract output targets ──────────────────────────────────
    let targets = extract::extract_output_targets(&script.text);
    if let Some(name) = extract::find_duplicate(&targets) {
        return Err(BuildError::DuplicateTarget { name: name.into() });
    }
    info!(
        "Extracted {} output target(s) from {}",
        targets.len(),
        script.file_name
    );

    // ── Stage 2: assemble and write the wrapper ──────────────────────────
    let wrapper_path = script.wrapper_path();
    let document = assemble::assemble_document(&targets);
    assemble::write_wrapper(&document, &wrapper_path).await?;

    // ── Stage 3: compile, gating everything downstream ───────────────────
    let compile_start = Instant::now();
    toolchain::compile(runner, config, script).await?;
    let compile_duration_ms = compile_start.elapsed().as_millis() as u64;
    info!(
        "Compiled {} in {}ms",
        script.pdf_name(),
        compile_duration_ms
    );

    // ── Detached branches: viewer ‖ rasterize × N ‖ sweep ‖ rewrite × N ──
    let mut background = Vec::with_capacity(targets.len() * 2 + 2);
    if config.launch_viewer {
        background.push(toolchain::launch_viewer(runner, config, script));
    }
    background.extend(toolchain::rasterize_targets(runner, config, script, &targets));
    let rasterizations_spawned = targets.len();

    background.push(cleanup::sweep_artifacts(script));
    let rewrites = cleanup::rewrite_target_includes(config, script, &targets);
    let rewrites_spawned = rewrites.len();
    background.extend(rewrites);
    debug!(
        "Spawned {} detached task(s) ({} rasterizations, {} rewrites)",
        background.len(),
        rasterizations_spawned,
        rewrites_spawned
    );

    let report = BuildReport {
        script_stem: script.stem.clone(),
        wrapper_path,
        pdf_path: script.pdf_path(),
        targets: targets.into_iter().map(|t| t.name).collect(),
        diagnostics: Vec::new(),
        rasterizations_spawned,
        rewrites_spawned,
        gnuplot_duration_ms: 0,
        compile_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    Ok(BuildOutput { report, background })
}

/// Synchronous wrapper around [`run_build`].
///
/// Creates a temporary tokio runtime internally; the runtime is kept alive
/// until the detached branches have drained.
pub fn run_build_sync(
    script_path: impl AsRef<Path>,
    config: &BuildConfig,
    runner: &Arc<dyn ProcessRunner>,
) -> Result<BuildReport, BuildError> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| BuildError::Internal(format!("Failed to create tokio runtime: {e}")))?;
    runtime.block_on(async {
        let output = run_build(script_path, config, runner).await?;
        Ok(output.wait_for_background().await)
    })
}
