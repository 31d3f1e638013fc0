//! Configuration for a build run.
//!
//! All run behaviour is controlled through [`BuildConfig`], built via its
//! [`BuildConfigBuilder`]. Keeping every knob in one value object — instead
//! of ad-hoc lookups against ambient host state — makes a run reproducible
//! from its config alone and lets tests construct exactly the environment
//! they need.

use crate::error::BuildError;
use std::path::PathBuf;

/// Configuration for a gnuplot build run.
///
/// Built via [`BuildConfig::builder()`] or using [`BuildConfig::default()`].
///
/// # Example
/// ```rust
/// use texplot::BuildConfig;
///
/// let config = BuildConfig::builder()
///     .density(150)
///     .launch_viewer(false)
///     .project_root("/home/me/thesis")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// File extensions this build applies to. Default: `gp`, `gnuplot`,
    /// `plt`, `gpi`, `dem`.
    ///
    /// A script whose extension is not listed here is not eligible unless
    /// [`always_eligible`](Self::always_eligible) is set.
    pub script_scopes: Vec<String>,

    /// Skip the eligibility checks entirely. Default: false.
    pub always_eligible: bool,

    /// Verify the external tools exist on PATH before running. Default: true.
    ///
    /// When enabled, a missing gnuplot/pdflatex/rasterizer aborts the run
    /// up front with [`BuildError::MissingTools`] instead of failing later
    /// with a less helpful spawn error.
    pub manage_dependencies: bool,

    /// Rasterization density in DPI passed to the rasterizer. Default: 300.
    ///
    /// 300 DPI matches print resolution for the extracted plot images;
    /// lower it for draft-quality previews, raise it for poster output.
    pub density: u32,

    /// Rasterization quality (1–100) passed to the rasterizer. Default: 100.
    pub quality: u32,

    /// Program name of the gnuplot binary. Default: `gnuplot`.
    pub gnuplot_program: String,

    /// Program name of the document compiler. Default: `pdflatex`.
    pub compiler_program: String,

    /// Program name of the rasterizer. Default: `convert` (ImageMagick).
    pub rasterizer_program: String,

    /// Launch a viewer on the compiled PDF. Default: true.
    ///
    /// The launch is fire-and-forget: a missing or failing viewer is logged
    /// and never affects the run.
    pub launch_viewer: bool,

    /// Viewer command line; the PDF path is appended as the last argument.
    ///
    /// Default: `SumatraPDF.exe -reuse-instance` on Windows (reusing an
    /// already-open viewer window), `xdg-open` elsewhere.
    pub viewer_command: Vec<String>,

    /// Project root for include-path correction. Default: none.
    ///
    /// When set and different from the script's directory, every target's
    /// generated include file has its image references prefixed with the
    /// relative path from this root to the script directory, so the PDF
    /// compiles correctly when viewed from the project root.
    pub project_root: Option<PathBuf>,
}

fn default_viewer() -> Vec<String> {
    if cfg!(windows) {
        vec!["SumatraPDF.exe".into(), "-reuse-instance".into()]
    } else {
        vec!["xdg-open".into()]
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            script_scopes: ["gp", "gnuplot", "plt", "gpi", "dem"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            always_eligible: false,
            manage_dependencies: true,
            density: 300,
            quality: 100,
            gnuplot_program: "gnuplot".into(),
            compiler_program: "pdflatex".into(),
            rasterizer_program: "convert".into(),
            launch_viewer: true,
            viewer_command: default_viewer(),
            project_root: None,
        }
    }
}

impl BuildConfig {
    /// Create a new builder for `BuildConfig`.
    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BuildConfig`].
#[derive(Debug)]
pub struct BuildConfigBuilder {
    config: BuildConfig,
}

impl BuildConfigBuilder {
    pub fn script_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.script_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn always_eligible(mut self, v: bool) -> Self {
        self.config.always_eligible = v;
        self
    }

    pub fn manage_dependencies(mut self, v: bool) -> Self {
        self.config.manage_dependencies = v;
        self
    }

    pub fn density(mut self, dpi: u32) -> Self {
        self.config.density = dpi;
        self
    }

    pub fn quality(mut self, q: u32) -> Self {
        self.config.quality = q;
        self
    }

    pub fn gnuplot_program(mut self, program: impl Into<String>) -> Self {
        self.config.gnuplot_program = program.into();
        self
    }

    pub fn compiler_program(mut self, program: impl Into<String>) -> Self {
        self.config.compiler_program = program.into();
        self
    }

    pub fn rasterizer_program(mut self, program: impl Into<String>) -> Self {
        self.config.rasterizer_program = program.into();
        self
    }

    pub fn launch_viewer(mut self, v: bool) -> Self {
        self.config.launch_viewer = v;
        self
    }

    pub fn viewer_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.viewer_command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn project_root(mut self, root: impl AsRef<std::path::Path>) -> Self {
        self.config.project_root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BuildConfig, BuildError> {
        let c = &self.config;
        if c.density < 72 || c.density > 1200 {
            return Err(BuildError::InvalidConfig(format!(
                "density must be 72–1200 DPI, got {}",
                c.density
            )));
        }
        if c.quality == 0 || c.quality > 100 {
            return Err(BuildError::InvalidConfig(format!(
                "quality must be 1–100, got {}",
                c.quality
            )));
        }
        if c.launch_viewer && c.viewer_command.is_empty() {
            return Err(BuildError::InvalidConfig(
                "viewer_command must not be empty when launch_viewer is set".into(),
            ));
        }
        Ok(self.config)
    }
}
