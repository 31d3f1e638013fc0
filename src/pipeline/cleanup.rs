//! Workspace cleaning: artifact sweep and include-path correction.
//!
//! Runs once the compile has succeeded, unordered relative to the viewer
//! and rasterizer branches. Both halves are best-effort: a file that cannot
//! be deleted or rewritten is logged and left alone, and never aborts a
//! sibling.
//!
//! The include rewrite exists because cairolatex emits
//! `\includegraphics{<stem>}` references relative to the script's own
//! directory. When the project root is somewhere above that directory, a
//! document built from the root would resolve those references against the
//! wrong base — prefixing them with the root-to-directory relative path
//! fixes the resolution without moving any files.

use crate::config::BuildConfig;
use crate::error::TargetError;
use crate::pipeline::extract::OutputTarget;
use crate::script::SourceScript;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

static RE_ARTIFACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(aux|log)$").unwrap());

static RE_INCLUDEGRAPHICS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\includegraphics\{(\w+)\}").unwrap());

/// Delete compiler droppings (`*.aux`, `*.log`) plus the wrapper document
/// itself from the script's directory, detached and best-effort.
pub fn sweep_artifacts(script: &SourceScript) -> JoinHandle<()> {
    let dir = script.dir.clone();
    let wrapper = script.wrapper_name();
    tokio::spawn(async move {
        let mut doomed: Vec<String> = Vec::new();
        match tokio::fs::read_dir(&dir).await {
            Ok(mut entries) => {
                while let Ok(Some(entry)) = entries.next_entry().await {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if RE_ARTIFACT.is_match(&name) {
                        doomed.push(name);
                    }
                }
            }
            Err(err) => {
                warn!("Cannot enumerate {} for cleanup: {err}", dir.display());
                return;
            }
        }
        doomed.push(wrapper);
        for name in doomed {
            let path = dir.join(&name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Swept {}", path.display()),
                Err(err) => debug!("Could not sweep {}: {err}", path.display()),
            }
        }
    })
}

/// Prefix every bare `\includegraphics{X}` image reference with `prefix`.
///
/// Pure text substitution; references that already carry a path component
/// contain `/` and therefore do not match, so applying a rewrite twice
/// never double-prefixes.
pub fn rewrite_include_paths(text: &str, prefix: &str) -> String {
    RE_INCLUDEGRAPHICS
        .replace_all(text, |caps: &regex::Captures<'_>| {
            format!("\\includegraphics{{{}/{}}}", prefix, &caps[1])
        })
        .into_owned()
}

/// Relative path from `root` down (or across) to `dir`, slash-separated.
///
/// Returns `None` when the two are equal — the caller skips the rewrite
/// entirely in that case.
pub fn relative_prefix(root: &Path, dir: &Path) -> Option<String> {
    if root == dir {
        return None;
    }
    let root_parts: Vec<_> = root.components().collect();
    let dir_parts: Vec<_> = dir.components().collect();
    let common = root_parts
        .iter()
        .zip(&dir_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..root_parts.len() {
        parts.push("..".into());
    }
    for component in &dir_parts[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Spawn one detached read-substitute-write rewrite per target's generated
/// include file. Returns no tasks when the script directory already is the
/// project root (or no root is configured).
pub fn rewrite_target_includes(
    config: &BuildConfig,
    script: &SourceScript,
    targets: &[OutputTarget],
) -> Vec<JoinHandle<()>> {
    let Some(root) = config.project_root.as_deref() else {
        return Vec::new();
    };
    let Some(prefix) = relative_prefix(root, &script.dir) else {
        return Vec::new();
    };

    targets
        .iter()
        .map(|target| {
            let path = script.dir.join(format!("{}.tex", target.name));
            let prefix = prefix.clone();
            let name = target.name.clone();
            tokio::spawn(async move {
                let result = async {
                    let text = tokio::fs::read_to_string(&path).await?;
                    let rewritten = rewrite_include_paths(&text, &prefix);
                    tokio::fs::write(&path, rewritten).await
                }
                .await;
                match result {
                    Ok(()) => debug!("Rewrote includes in {}", path.display()),
                    Err(err) => {
                        let err = TargetError::Rewrite {
                            target: name,
                            detail: err.to_string(),
                        };
                        warn!("{err}");
                    }
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn artifact_pattern_matches_aux_and_log_only() {
        assert!(RE_ARTIFACT.is_match("Plot_decay.aux"));
        assert!(RE_ARTIFACT.is_match("Plot_decay.log"));
        assert!(!RE_ARTIFACT.is_match("Plot_decay.pdf"));
        assert!(!RE_ARTIFACT.is_match("decay.aux.bak"));
    }

    #[test]
    fn rewrite_prefixes_bare_references() {
        let text = "\\includegraphics{foo}\ntext\n\\includegraphics{bar}";
        assert_eq!(
            rewrite_include_paths(text, "sub"),
            "\\includegraphics{sub/foo}\ntext\n\\includegraphics{sub/bar}"
        );
    }

    #[test]
    fn rewrite_is_idempotent_on_prefixed_references() {
        let once = rewrite_include_paths("\\includegraphics{foo}", "sub");
        assert_eq!(rewrite_include_paths(&once, "sub"), once);
    }

    #[test]
    fn relative_prefix_none_for_same_dir() {
        let p = PathBuf::from("/proj");
        assert_eq!(relative_prefix(&p, &p), None);
    }

    #[test]
    fn relative_prefix_for_subdirectory() {
        assert_eq!(
            relative_prefix(Path::new("/proj"), Path::new("/proj/sub")),
            Some("sub".into())
        );
        assert_eq!(
            relative_prefix(Path::new("/proj"), Path::new("/proj/a/b")),
            Some("a/b".into())
        );
    }

    #[test]
    fn relative_prefix_walks_up_for_siblings() {
        assert_eq!(
            relative_prefix(Path::new("/proj/docs"), Path::new("/proj/plots")),
            Some("../plots".into())
        );
    }

    #[tokio::test]
    async fn sweep_removes_artifacts_and_wrapper_but_not_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        for name in [
            "Plot_decay.tex",
            "Plot_decay.aux",
            "Plot_decay.log",
            "Plot_decay.pdf",
            "png_a.png",
            "a.tex",
        ] {
            std::fs::write(dir.join(name), "x").unwrap();
        }
        let script =
            SourceScript::from_text("", dir.join("decay.gp")).unwrap();
        sweep_artifacts(&script).await.unwrap();

        assert!(!dir.join("Plot_decay.tex").exists());
        assert!(!dir.join("Plot_decay.aux").exists());
        assert!(!dir.join("Plot_decay.log").exists());
        assert!(dir.join("Plot_decay.pdf").exists());
        assert!(dir.join("png_a.png").exists());
        assert!(dir.join("a.tex").exists());
    }

    #[tokio::test]
    async fn rewrites_apply_only_under_a_differing_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let sub = root.join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("a.tex"), "\\includegraphics{a-inc}").unwrap();

        let script = SourceScript::from_text("", sub.join("decay.gp")).unwrap();
        let targets = vec![OutputTarget { name: "a".into(), page: 0 }];

        // Same root and dir: nothing spawned, file untouched.
        let same = BuildConfig::builder().project_root(&sub).build().unwrap();
        assert!(rewrite_target_includes(&same, &script, &targets).is_empty());

        // Differing root: reference gains the relative prefix.
        let config = BuildConfig::builder().project_root(root).build().unwrap();
        for handle in rewrite_target_includes(&config, &script, &targets) {
            handle.await.unwrap();
        }
        let text = std::fs::read_to_string(sub.join("a.tex")).unwrap();
        assert_eq!(text, "\\includegraphics{sub/a-inc}");
    }
}
