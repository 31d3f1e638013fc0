//! CLI binary for texplot.
//!
//! A thin shim over the library crate that maps CLI flags to `BuildConfig`,
//! runs the build, and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use texplot::{
    eligibility, run_build, BuildConfig, BuildError, ProcessRunner, SystemRunner,
};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Build a script and post-process the cairolatex output
  texplot plots/decay.gp

  # Draft quality, no viewer window
  texplot --density 150 --no-viewer plots/decay.gp

  # Correct include paths for a document built from the project root
  texplot --project-root . plots/sub/decay.gp

  # Machine-readable run report
  texplot --json --no-viewer plots/decay.gp

EXTERNAL TOOLS (expected on PATH):
  gnuplot     builds the script (cairolatex terminal)
  pdflatex    compiles the generated wrapper document
  convert     ImageMagick; extracts one PNG per plot page
  viewer      optional; SumatraPDF.exe on Windows, xdg-open elsewhere

FILES (per script <stem>, in the script's directory):
  Plot_<stem>.tex   wrapper document   (transient, swept after the compile)
  Plot_<stem>.pdf   compiled output    (persists)
  png_<target>.png  one per plot       (persists)
  <target>.tex      cairolatex include (persists, rewritten in place)
"#;

/// Build a gnuplot script and post-process it into a PDF and PNG renders.
#[derive(Parser, Debug)]
#[command(
    name = "texplot",
    version,
    about = "Build a gnuplot cairolatex script into a wrapper PDF and per-plot PNGs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the gnuplot script.
    script: PathBuf,

    /// Rasterization density in DPI (72–1200).
    #[arg(long, env = "TEXPLOT_DENSITY", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=1200))]
    density: u32,

    /// Rasterization quality (1–100).
    #[arg(long, env = "TEXPLOT_QUALITY", default_value_t = 100,
          value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: u32,

    /// Project root for include-path correction.
    ///
    /// When the script lives below this root, image references inside the
    /// generated include files are prefixed with the relative path so the
    /// document also compiles from the root.
    #[arg(long, env = "TEXPLOT_PROJECT_ROOT")]
    project_root: Option<PathBuf>,

    /// Viewer command line (the PDF path is appended).
    #[arg(long, env = "TEXPLOT_VIEWER")]
    viewer: Option<String>,

    /// Do not launch a viewer on the compiled PDF.
    #[arg(long)]
    no_viewer: bool,

    /// gnuplot program name.
    #[arg(long, env = "TEXPLOT_GNUPLOT", default_value = "gnuplot")]
    gnuplot: String,

    /// Document compiler program name.
    #[arg(long, env = "TEXPLOT_COMPILER", default_value = "pdflatex")]
    compiler: String,

    /// Rasterizer program name.
    #[arg(long, env = "TEXPLOT_RASTERIZER", default_value = "convert")]
    rasterizer: String,

    /// Run even when the script's extension is not a known gnuplot scope.
    #[arg(long, env = "TEXPLOT_ALWAYS_ELIGIBLE")]
    always_eligible: bool,

    /// Skip the up-front PATH check for the external tools.
    #[arg(long)]
    no_deps_check: bool,

    /// Exit as soon as the compile finishes instead of waiting for the
    /// detached rasterizations and cleanup to drain.
    #[arg(long)]
    no_wait: bool,

    /// Print the run report as JSON.
    #[arg(long, env = "TEXPLOT_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TEXPLOT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TEXPLOT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Eligibility and dependency checks ────────────────────────────────
    if !eligibility::is_eligible(&cli.script, &config) {
        anyhow::bail!(
            "'{}' is not a gnuplot script (known extensions: {}); \
             pass --always-eligible to build it anyway",
            cli.script.display(),
            config.script_scopes.join(", ")
        );
    }
    if config.manage_dependencies {
        let missing = eligibility::missing_tools(&config);
        if !missing.is_empty() {
            return Err(BuildError::MissingTools { tools: missing })
                .context("External toolchain incomplete");
        }
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner);
    let output = run_build(&cli.script, &config, &runner)
        .await
        .context("Build failed")?;

    let report = if cli.no_wait {
        output.report
    } else {
        output.wait_for_background().await
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else if !cli.quiet {
        eprintln!(
            "✔ {} plot(s) → {}  ({}ms compile)",
            report.targets.len(),
            report.pdf_path.display(),
            report.compile_duration_ms,
        );
        for target in &report.targets {
            eprintln!("   png_{target}.png");
        }
        for diagnostic in &report.diagnostics {
            eprintln!("   warning: {diagnostic}");
        }
    }

    Ok(())
}

/// Map CLI args to `BuildConfig`.
fn build_config(cli: &Cli) -> Result<BuildConfig> {
    let mut builder = BuildConfig::builder()
        .density(cli.density)
        .quality(cli.quality)
        .gnuplot_program(&cli.gnuplot)
        .compiler_program(&cli.compiler)
        .rasterizer_program(&cli.rasterizer)
        .always_eligible(cli.always_eligible)
        .manage_dependencies(!cli.no_deps_check)
        .launch_viewer(!cli.no_viewer);

    if let Some(ref viewer) = cli.viewer {
        builder = builder.viewer_command(viewer.split_whitespace());
    }
    if let Some(ref root) = cli.project_root {
        builder = builder.project_root(root);
    }

    builder.build().context("Invalid configuration")
}
