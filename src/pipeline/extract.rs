//! Output-target extraction: scan the script for declared `.tex` outputs.
//!
//! This is lightweight pattern extraction, not a gnuplot parser. A statement
//! that sets the output device to a quoted path ending in `.tex` declares
//! one target; anything malformed simply fails to match and is skipped.
//! Match order is source order, and source order is load-bearing: the n-th
//! target becomes page n of the compiled wrapper and rasterizes with page
//! index n.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// One declared rendering target: the quoted stem of a `set output` path
/// and its 0-based position, used as the rasterization page index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub name: String,
    pub page: usize,
}

static RE_OUTPUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*set\s+output\s+['"]([\w-]+)\.tex['"]"#).unwrap());

/// Extract all declared output targets from script text, in source order.
///
/// A script with zero matches yields an empty sequence; downstream stages
/// degenerate to a wrapper with no includes. Names are not validated here —
/// duplicate detection is the orchestrator's call via [`find_duplicate`].
pub fn extract_output_targets(text: &str) -> Vec<OutputTarget> {
    RE_OUTPUT
        .captures_iter(text)
        .enumerate()
        .map(|(page, caps)| OutputTarget {
            name: caps[1].to_string(),
            page,
        })
        .collect()
}

/// First target name that appears more than once, if any.
pub fn find_duplicate(targets: &[OutputTarget]) -> Option<&str> {
    let mut seen = HashSet::new();
    targets
        .iter()
        .find(|t| !seen.insert(t.name.as_str()))
        .map(|t| t.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_statements_yield_empty_sequence() {
        let script = "set terminal cairolatex\nplot sin(x)\n";
        assert!(extract_output_targets(script).is_empty());
    }

    #[test]
    fn targets_in_source_order_with_page_indices() {
        let script = "\
set terminal cairolatex
set output 'a.tex'
plot sin(x)
set output 'b.tex'
plot cos(x)
";
        let targets = extract_output_targets(script);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0], OutputTarget { name: "a".into(), page: 0 });
        assert_eq!(targets[1], OutputTarget { name: "b".into(), page: 1 });
    }

    #[test]
    fn first_line_and_indented_statements_match() {
        let script = "set output 'first.tex'\n    set output \"second.tex\"\n";
        let names: Vec<_> = extract_output_targets(script)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn hyphens_and_underscores_allowed_in_stems() {
        let targets = extract_output_targets("set output 'fig_3-b.tex'\n");
        assert_eq!(targets[0].name, "fig_3-b");
    }

    #[test]
    fn non_tex_outputs_ignored() {
        let script = "set output 'plot.png'\nset output 'plot.pdf'\n";
        assert!(extract_output_targets(script).is_empty());
    }

    #[test]
    fn malformed_statements_silently_skipped() {
        let script = "set output a.tex\nset output 'unterminated.tex\nset output 'ok.tex'\n";
        let targets = extract_output_targets(script);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "ok");
    }

    #[test]
    fn duplicate_detection() {
        let targets = extract_output_targets("set output 'a.tex'\nset output 'a.tex'\n");
        assert_eq!(find_duplicate(&targets), Some("a"));

        let distinct = extract_output_targets("set output 'a.tex'\nset output 'b.tex'\n");
        assert_eq!(find_duplicate(&distinct), None);
    }
}
