//! Document assembly: render the wrapper that pdflatex compiles.
//!
//! The wrapper is a fixed preamble, one `\include` plus page break per
//! target in extraction order, and a closing directive. For a given target
//! sequence the produced bytes are fully deterministic, which is what makes
//! re-runs on an unchanged script byte-identical.
//!
//! The preamble uses the `preview` package with a tightpage `picture`
//! environment so every included cairolatex plot lands on its own
//! tightly-cropped page — one page per target, which the rasterizer then
//! addresses by page index.

use crate::error::BuildError;
use crate::pipeline::extract::OutputTarget;
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

const PREAMBLE: &str = r"\documentclass[fontsize=11pt]{scrartcl}
\usepackage[german,english]{babel}
\usepackage[active,tightpage]{preview}
\usepackage[]{graphicx} \usepackage[]{xcolor}
\PreviewEnvironment{picture}
\setlength\PreviewBorder{2mm}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage{lmodern}
\usepackage[]{siunitx}
\addto\extrasgerman{\sisetup{locale = DE}}
\usepackage{nicefrac}
\usepackage{eurosym}
\usepackage{tikz}
\usetikzlibrary{arrows}
\renewcommand{\familydefault}{\sfdefault}
\begin{document}
\selectlanguage{english}
\pagestyle{empty}
";

/// Render the complete wrapper document for the given targets.
///
/// Pure and deterministic: preamble, one `\include{<stem>} \newpage` per
/// target in order, closing directive. Zero targets degenerate to preamble
/// plus closing with no includes.
pub fn assemble_document(targets: &[OutputTarget]) -> String {
    let mut doc = String::with_capacity(PREAMBLE.len() + targets.len() * 32 + 16);
    doc.push_str(PREAMBLE);
    for target in targets {
        // write! into a String cannot fail
        let _ = writeln!(doc, "\\include{{{}}} \\newpage", target.name);
    }
    doc.push_str("\\end{document}\n");
    doc
}

/// Write the assembled document to `path`, creating or overwriting it.
pub async fn write_wrapper(document: &str, path: &Path) -> Result<(), BuildError> {
    tokio::fs::write(path, document)
        .await
        .map_err(|source| BuildError::WrapperWrite {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Wrote wrapper document {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(names: &[&str]) -> Vec<OutputTarget> {
        names
            .iter()
            .enumerate()
            .map(|(page, name)| OutputTarget {
                name: name.to_string(),
                page,
            })
            .collect()
    }

    #[test]
    fn empty_sequence_yields_no_includes() {
        let doc = assemble_document(&[]);
        assert!(doc.starts_with("\\documentclass"));
        assert!(doc.ends_with("\\end{document}\n"));
        assert!(!doc.contains("\\include{"));
    }

    #[test]
    fn one_include_per_target_in_order() {
        let doc = assemble_document(&targets(&["a", "b"]));
        let a = doc.find("\\include{a} \\newpage").unwrap();
        let b = doc.find("\\include{b} \\newpage").unwrap();
        assert!(a < b);
        assert_eq!(doc.matches("\\include{").count(), 2);
    }

    #[test]
    fn includes_sit_between_preamble_and_closing() {
        let doc = assemble_document(&targets(&["decay"]));
        let include = doc.find("\\include{decay}").unwrap();
        assert!(doc.find("\\pagestyle{empty}").unwrap() < include);
        assert!(include < doc.find("\\end{document}").unwrap());
    }

    #[test]
    fn output_is_deterministic() {
        let t = targets(&["a", "b", "c"]);
        assert_eq!(assemble_document(&t), assemble_document(&t));
    }

    #[tokio::test]
    async fn write_failure_is_wrapper_write_error() {
        let err = write_wrapper("x", Path::new("/nonexistent/dir/Plot_x.tex"))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::WrapperWrite { .. }));
    }
}
