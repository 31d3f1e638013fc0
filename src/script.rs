//! The build input: a gnuplot script and the names derived from it.
//!
//! Every file the pipeline touches is named relative to the script — the
//! wrapper document and compiled PDF both carry the script's base name, and
//! all external tools run with the script's directory as their working
//! directory. Deriving those names in one place keeps the stages from each
//! re-implementing the `Plot_<stem>` convention.

use crate::error::BuildError;
use std::path::{Path, PathBuf};

/// A gnuplot script as seen by the pipeline: its raw text, its base name
/// with the extension stripped, and the directory it lives in.
#[derive(Debug, Clone)]
pub struct SourceScript {
    /// Full script text.
    pub text: String,
    /// Script file name, relative to [`dir`](Self::dir).
    pub file_name: String,
    /// Base name with the extension stripped.
    pub stem: String,
    /// Containing directory; the working directory for every tool invocation.
    pub dir: PathBuf,
}

impl SourceScript {
    /// Load a script from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| BuildError::ScriptRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_text(text, path)
    }

    /// Build a `SourceScript` from already-loaded text (for hosts that hold
    /// the buffer themselves) and the path it came from.
    pub fn from_text(text: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| BuildError::BadScriptPath {
                path: path.to_path_buf(),
            })?;
        let stem = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| BuildError::BadScriptPath {
                path: path.to_path_buf(),
            })?;
        let dir = match path.parent() {
            Some(p) if p != Path::new("") => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self {
            text: text.into(),
            file_name,
            stem,
            dir,
        })
    }

    /// Wrapper document file name: `Plot_<stem>.tex`.
    pub fn wrapper_name(&self) -> String {
        format!("Plot_{}.tex", self.stem)
    }

    /// Compiled output file name: `Plot_<stem>.pdf`.
    pub fn pdf_name(&self) -> String {
        format!("Plot_{}.pdf", self.stem)
    }

    /// Full path of the wrapper document.
    pub fn wrapper_path(&self) -> PathBuf {
        self.dir.join(self.wrapper_name())
    }

    /// Full path of the compiled output.
    pub fn pdf_path(&self) -> PathBuf {
        self.dir.join(self.pdf_name())
    }
}
