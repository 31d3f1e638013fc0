//! Eligibility and dependency checks for a build run.
//!
//! Mirrors what a build host does before offering a build: the script's
//! extension must be one of the configured scopes and gnuplot must exist on
//! PATH, unless the always-eligible override is set. The dependency check
//! covers the full toolchain so a missing pdflatex fails up front rather
//! than halfway through a run.

use crate::config::BuildConfig;
use std::path::Path;

/// Whether the build applies to `script_path` under `config`.
///
/// True when the always-eligible override is set, or when the extension is
/// one of the configured scopes and gnuplot is present on PATH.
pub fn is_eligible(script_path: &Path, config: &BuildConfig) -> bool {
    if config.always_eligible {
        return true;
    }
    let in_scope = script_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| config.script_scopes.iter().any(|s| s.eq_ignore_ascii_case(ext)))
        .unwrap_or(false);
    in_scope && which::which(&config.gnuplot_program).is_ok()
}

/// Names of configured external tools not found on PATH.
///
/// The viewer is deliberately not checked: its launch is best-effort and a
/// missing viewer must not block the run.
pub fn missing_tools(config: &BuildConfig) -> Vec<String> {
    [
        &config.gnuplot_program,
        &config.compiler_program,
        &config.rasterizer_program,
    ]
    .into_iter()
    .filter(|program| which::which(program).is_err())
    .cloned()
    .collect()
}
