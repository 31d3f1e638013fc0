//! Toolchain driving: every external process the pipeline touches.
//!
//! ## Why a runner trait?
//!
//! The pipeline's concurrency story is "await the compiler, detach the
//! rest". Hiding process execution behind [`ProcessRunner`] makes that
//! explicit and testable: the orchestrator decides per invocation whether
//! to await the returned future or hand it to `tokio::spawn`, and tests
//! inject a recording mock instead of a real shell-out. The production
//! implementation is [`SystemRunner`] on `tokio::process`.
//!
//! Failure semantics differ per tool:
//! - compiler: awaited, non-zero exit is fatal to the run
//! - viewer: detached, failures logged at warn and swallowed
//! - rasterizer: one detached task per target, failures isolated per target

use crate::config::BuildConfig;
use crate::error::{BuildError, TargetError};
use crate::pipeline::extract::OutputTarget;
use crate::script::SourceScript;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One external-process request: program, arguments, working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

/// What a finished process left behind.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes [`Invocation`]s. Implemented by [`SystemRunner`] for real
/// processes and by recording mocks in tests.
///
/// `run` returns a future rather than completing in place so the caller
/// chooses the concurrency: the compiler invocation is awaited, viewer and
/// rasterizer invocations are spawned and forgotten.
pub trait ProcessRunner: Send + Sync + 'static {
    fn run(&self, invocation: Invocation) -> BoxFuture<'static, std::io::Result<ProcessOutput>>;
}

/// Runs invocations as real child processes via `tokio::process`.
///
/// stdin is closed so a tool that unexpectedly prompts (pdflatex without
/// `-interaction nonstopmode` would) fails instead of hanging forever.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: Invocation) -> BoxFuture<'static, std::io::Result<ProcessOutput>> {
        async move {
            let output = tokio::process::Command::new(&invocation.program)
                .args(&invocation.args)
                .current_dir(&invocation.cwd)
                .stdin(Stdio::null())
                .output()
                .await?;
            Ok(ProcessOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
        .boxed()
    }
}

/// Last `lines` lines of tool output, for error excerpts.
pub(crate) fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

// ── Invocation builders ──────────────────────────────────────────────────
// Pure, so the exact command lines are unit-testable without spawning.

/// Compiler invocation: non-interactive, strict error halting, file/line
/// error annotations, run in the wrapper's directory.
pub fn compile_invocation(config: &BuildConfig, script: &SourceScript) -> Invocation {
    Invocation {
        program: config.compiler_program.clone(),
        args: vec![
            "-interaction".into(),
            "nonstopmode".into(),
            "-halt-on-error".into(),
            "-file-line-error".into(),
            script.wrapper_name(),
        ],
        cwd: script.dir.clone(),
    }
}

/// Viewer invocation: the configured command line with the PDF appended.
pub fn viewer_invocation(config: &BuildConfig, script: &SourceScript) -> Invocation {
    let mut parts = config.viewer_command.iter();
    let program = parts.next().cloned().unwrap_or_default();
    let mut args: Vec<String> = parts.cloned().collect();
    args.push(script.pdf_name());
    Invocation {
        program,
        args,
        cwd: script.dir.clone(),
    }
}

/// Rasterizer invocation for one target: extract that target's page of the
/// compiled PDF into `png_<stem>.png` at the configured density and quality.
pub fn raster_invocation(
    config: &BuildConfig,
    script: &SourceScript,
    target: &OutputTarget,
) -> Invocation {
    Invocation {
        program: config.rasterizer_program.clone(),
        args: vec![
            "-density".into(),
            config.density.to_string(),
            format!("{}[{}]", script.pdf_name(), target.page),
            "-quality".into(),
            config.quality.to_string(),
            format!("png_{}.png", target.name),
        ],
        cwd: script.dir.clone(),
    }
}

// ── Driver operations ────────────────────────────────────────────────────

/// Compile the wrapper document. Awaited; failure aborts the run.
pub async fn compile(
    runner: &Arc<dyn ProcessRunner>,
    config: &BuildConfig,
    script: &SourceScript,
) -> Result<ProcessOutput, BuildError> {
    let invocation = compile_invocation(config, script);
    let program = invocation.program.clone();
    info!("Compiling {}", script.wrapper_name());

    let output = runner
        .run(invocation)
        .await
        .map_err(|source| BuildError::Spawn {
            program: program.clone(),
            source,
        })?;

    if !output.success() {
        // pdflatex reports errors on stdout, so excerpt that stream.
        return Err(BuildError::CompilerFailed {
            program,
            code: output.code,
            detail: tail(&output.stdout, 20),
        });
    }
    Ok(output)
}

/// Launch the viewer on the compiled PDF, detached.
///
/// Best-effort: a missing viewer binary or a non-zero exit is logged at
/// warn level and swallowed.
pub fn launch_viewer(
    runner: &Arc<dyn ProcessRunner>,
    config: &BuildConfig,
    script: &SourceScript,
) -> JoinHandle<()> {
    let invocation = viewer_invocation(config, script);
    let program = invocation.program.clone();
    let runner = Arc::clone(runner);
    tokio::spawn(async move {
        match runner.run(invocation).await {
            Ok(output) if output.success() => {
                debug!("Viewer '{program}' exited cleanly");
            }
            Ok(output) => {
                warn!("Viewer '{program}' exited with {:?}", output.code);
            }
            Err(err) => {
                warn!("Viewer '{program}' failed to launch: {err}");
            }
        }
    })
}

/// Spawn one detached rasterization per target, by ordinal page index.
///
/// Each invocation is independent: a failure is logged as a
/// [`TargetError::Raster`] and does not abort the other targets or the run.
pub fn rasterize_targets(
    runner: &Arc<dyn ProcessRunner>,
    config: &BuildConfig,
    script: &SourceScript,
    targets: &[OutputTarget],
) -> Vec<JoinHandle<()>> {
    targets
        .iter()
        .map(|target| {
            let invocation = raster_invocation(config, script, target);
            let runner = Arc::clone(runner);
            let target = target.clone();
            tokio::spawn(async move {
                let failure = match runner.run(invocation).await {
                    Ok(output) if output.success() => {
                        debug!("Rasterized page {} → png_{}.png", target.page, target.name);
                        None
                    }
                    Ok(output) => Some(format!(
                        "exit {:?}: {}",
                        output.code,
                        tail(&output.stderr, 3)
                    )),
                    Err(err) => Some(err.to_string()),
                };
                if let Some(detail) = failure {
                    let err = TargetError::Raster {
                        target: target.name,
                        page: target.page,
                        detail,
                    };
                    warn!("{err}");
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> SourceScript {
        SourceScript::from_text("", "/work/decay.gp").unwrap()
    }

    #[test]
    fn compile_invocation_is_strict_and_annotated() {
        let inv = compile_invocation(&BuildConfig::default(), &script());
        assert_eq!(inv.program, "pdflatex");
        assert_eq!(
            inv.args,
            vec![
                "-interaction",
                "nonstopmode",
                "-halt-on-error",
                "-file-line-error",
                "Plot_decay.tex",
            ]
        );
        assert_eq!(inv.cwd, PathBuf::from("/work"));
    }

    #[test]
    fn viewer_invocation_appends_pdf() {
        let config = BuildConfig::builder()
            .viewer_command(["SumatraPDF.exe", "-reuse-instance"])
            .build()
            .unwrap();
        let inv = viewer_invocation(&config, &script());
        assert_eq!(inv.program, "SumatraPDF.exe");
        assert_eq!(inv.args, vec!["-reuse-instance", "Plot_decay.pdf"]);
    }

    #[test]
    fn raster_invocation_addresses_page_by_ordinal() {
        let config = BuildConfig::builder()
            .density(300)
            .quality(100)
            .build()
            .unwrap();
        let target = OutputTarget { name: "b".into(), page: 1 };
        let inv = raster_invocation(&config, &script(), &target);
        assert_eq!(inv.program, "convert");
        assert_eq!(
            inv.args,
            vec![
                "-density",
                "300",
                "Plot_decay.pdf[1]",
                "-quality",
                "100",
                "png_b.png",
            ]
        );
    }

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\nd", 2), "c\nd");
        assert_eq!(tail("a", 5), "a");
        assert_eq!(tail("", 5), "");
    }

    #[tokio::test]
    async fn system_runner_captures_output() {
        let runner = SystemRunner;
        let out = runner
            .run(Invocation {
                program: "echo".into(),
                args: vec!["hello".into()],
                cwd: PathBuf::from("."),
            })
            .await
            .unwrap();
        assert!(out.success());
        assert!(out.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn system_runner_missing_program_is_io_error() {
        let runner = SystemRunner;
        let result = runner
            .run(Invocation {
                program: "texplot-test-no-such-tool".into(),
                args: vec![],
                cwd: PathBuf::from("."),
            })
            .await;
        assert!(result.is_err());
    }
}
