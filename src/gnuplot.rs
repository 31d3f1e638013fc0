//! The build step: run gnuplot on the script and read its diagnostics.
//!
//! This is the gate for everything else — the post-processing pipeline only
//! runs when gnuplot exits cleanly. gnuplot reports script errors on stderr
//! in a stable `"file", line N: message` shape; those are matched into
//! [`Diagnostic`] values so hosts can jump to the offending line instead of
//! grepping raw tool output.

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::pipeline::toolchain::{tail, Invocation, ProcessRunner};
use crate::script::SourceScript;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// One file/line diagnostic matched in gnuplot's stderr.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}

static RE_DIAGNOSTIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([/0-9a-zA-Z._]+)",\s+line\s+(\d+):\s+(.+)"#).unwrap());

/// Match all `"file", line N: message` diagnostics in gnuplot output.
///
/// Lines that do not fit the shape are ignored; this is a best-effort scan
/// over tool output, not a parser for it.
pub fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
    RE_DIAGNOSTIC
        .captures_iter(output)
        .filter_map(|caps| {
            let line = caps[2].parse().ok()?;
            Some(Diagnostic {
                file: caps[1].to_string(),
                line,
                message: caps[3].trim_end().to_string(),
            })
        })
        .collect()
}

/// The gnuplot invocation: `gnuplot <script>` in the script's directory.
pub fn gnuplot_invocation(config: &BuildConfig, script: &SourceScript) -> Invocation {
    Invocation {
        program: config.gnuplot_program.clone(),
        args: vec![script.file_name.clone()],
        cwd: script.dir.clone(),
    }
}

/// Run the gnuplot build, awaited.
///
/// On success, returns any diagnostics gnuplot still printed (warnings);
/// each is also logged. A non-zero exit is fatal and carries the matched
/// diagnostics plus a stderr excerpt.
pub async fn run_gnuplot(
    runner: &Arc<dyn ProcessRunner>,
    config: &BuildConfig,
    script: &SourceScript,
) -> Result<Vec<Diagnostic>, BuildError> {
    let invocation = gnuplot_invocation(config, script);
    let program = invocation.program.clone();
    info!("Running {} on {}", program, script.file_name);

    let output = runner
        .run(invocation)
        .await
        .map_err(|source| BuildError::Spawn {
            program: program.clone(),
            source,
        })?;

    let diagnostics = parse_diagnostics(&output.stderr);
    for d in &diagnostics {
        warn!("{program}: {d}");
    }

    if !output.success() {
        return Err(BuildError::GnuplotFailed {
            code: output.code,
            diagnostics,
            detail: tail(&output.stderr, 20),
        });
    }
    Ok(diagnostics)
}
