//! # texplot
//!
//! Drive a gnuplot `cairolatex` build end-to-end: run gnuplot on a script,
//! wrap its `.tex` plot fragments in a compilable LaTeX document, compile
//! that to PDF, rasterize each plot page to PNG, and tidy the workspace.
//!
//! ## Why this crate?
//!
//! gnuplot's `cairolatex` terminal produces the best-looking plots for
//! LaTeX documents — native fonts, siunitx-formatted axes — but it leaves
//! you with loose `.tex`/`.pdf` fragment pairs that are awkward to preview
//! and impossible to paste into a wiki or a slide deck. This crate closes
//! the loop: one command turns a plot script into a previewable PDF and a
//! print-resolution PNG per plot, with the intermediate LaTeX debris swept
//! away.
//!
//! ## Pipeline Overview
//!
//! ```text
//! script.gp
//!  │
//!  ├─ 1. Build     gnuplot, awaited; stderr matched into diagnostics
//!  ├─ 2. Extract   scan for `set output '<stem>.tex'` targets, in order
//!  ├─ 3. Assemble  fixed preamble + one \include per target → Plot_<stem>.tex
//!  ├─ 4. Compile   pdflatex, awaited — gates everything below
//!  ├─ 5. View      viewer launch, detached, best-effort
//!  ├─ 6. Rasterize convert per target page → png_<stem>.png, detached
//!  └─ 7. Clean     sweep *.aux/*.log + wrapper, rewrite include paths, detached
//! ```
//!
//! Steps 5–7 are fire-and-forget: the run is "done" when the compile
//! succeeds, and the detached handles ride along on [`BuildOutput`] for
//! hosts that want to drain them before exiting.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use texplot::{run_build, BuildConfig, ProcessRunner, SystemRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BuildConfig::default();
//!     let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner);
//!     let output = run_build("plots/decay.gp", &config, &runner).await?;
//!     let report = output.wait_for_background().await;
//!     println!("{} plot(s) → {}", report.targets.len(), report.pdf_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `texplot` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! texplot = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod build;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod gnuplot;
pub mod pipeline;
pub mod report;
pub mod script;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use build::{post_process, run_build, run_build_sync};
pub use config::{BuildConfig, BuildConfigBuilder};
pub use error::{BuildError, TargetError};
pub use gnuplot::Diagnostic;
pub use pipeline::cleanup::rewrite_include_paths;
pub use pipeline::extract::{extract_output_targets, OutputTarget};
pub use pipeline::toolchain::{Invocation, ProcessOutput, ProcessRunner, SystemRunner};
pub use report::{BuildOutput, BuildReport};
pub use script::SourceScript;
