//! Conflict resolution.
//!
//! The [`ConflictResolver`] turns a scanned [`ConfigDocument`] into a
//! [`ResolvedConfig`] by replacing every region with the lines a
//! [`Policy`] selects: one side verbatim, or the semantic union.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conflict::document::{ConfigDocument, ConflictRegion, Segment};
use crate::conflict::merger::{ShadowedAssignment, UnionMerger};

/// How each conflict region is resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Keep the lines between the start marker and the separator.
    Ours,
    /// Keep the lines between the separator and the end marker.
    Theirs,
    /// Keep both, de-duplicating assignments (last one wins).
    Union,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ours => write!(f, "ours"),
            Self::Theirs => write!(f, "theirs"),
            Self::Union => write!(f, "union"),
        }
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ours" => Ok(Self::Ours),
            "theirs" => Ok(Self::Theirs),
            "union" => Ok(Self::Union),
            other => Err(format!(
                "unknown policy '{other}' (expected ours, theirs or union)"
            )),
        }
    }
}

/// The lines chosen for one region, tagged by how they were obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Ours(Vec<String>),
    Theirs(Vec<String>),
    Merged(Vec<String>),
}

impl Resolution {
    pub fn lines(&self) -> &[String] {
        match self {
            Self::Ours(lines) | Self::Theirs(lines) | Self::Merged(lines) => lines,
        }
    }

    /// Short label for logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ours(_) => "ours",
            Self::Theirs(_) => "theirs",
            Self::Merged(_) => "merged",
        }
    }
}

/// What happened to one region.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RegionOutcome {
    pub start_line: usize,
    pub end_line: usize,
    pub ours_label: Option<String>,
    pub theirs_label: Option<String>,
    /// `ours`, `theirs` or `merged`.
    pub resolution: &'static str,
    /// Number of lines written in place of the region.
    pub lines_written: usize,
    pub shadowed: Vec<ShadowedAssignment>,
}

/// Marker-free output of a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    text: String,
    outcomes: Vec<RegionOutcome>,
}

impl ResolvedConfig {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Per-region outcomes in document order.
    pub fn outcomes(&self) -> &[RegionOutcome] {
        &self.outcomes
    }
}

/// Applies a [`Policy`] to every region of a document.
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver {
    merger: UnionMerger,
}

impl ConflictResolver {
    pub fn new(merger: UnionMerger) -> Self {
        Self { merger }
    }

    /// Resolve every region of `document` under `policy`.
    pub fn resolve(&self, document: &ConfigDocument, policy: Policy) -> ResolvedConfig {
        info!(%policy, regions = document.region_count(), "resolving conflicts");

        let mut text = String::new();
        let mut outcomes = Vec::new();

        for segment in document.segments() {
            match segment {
                Segment::Text(lines) => lines.iter().for_each(|l| text.push_str(l)),
                Segment::Conflict(region) => {
                    let (resolution, shadowed) = self.resolve_region(region, policy);
                    debug!(
                        start = region.start_line,
                        end = region.end_line,
                        resolution = resolution.label(),
                        lines = resolution.lines().len(),
                        "region resolved"
                    );
                    resolution.lines().iter().for_each(|l| text.push_str(l));
                    outcomes.push(RegionOutcome {
                        start_line: region.start_line,
                        end_line: region.end_line,
                        ours_label: region.ours_label.clone(),
                        theirs_label: region.theirs_label.clone(),
                        resolution: resolution.label(),
                        lines_written: resolution.lines().len(),
                        shadowed,
                    });
                }
            }
        }

        ResolvedConfig { text, outcomes }
    }

    /// Resolve a single region.
    pub fn resolve_region(
        &self,
        region: &ConflictRegion,
        policy: Policy,
    ) -> (Resolution, Vec<ShadowedAssignment>) {
        match policy {
            Policy::Ours => (Resolution::Ours(region.ours.lines.clone()), Vec::new()),
            Policy::Theirs => (Resolution::Theirs(region.theirs.lines.clone()), Vec::new()),
            Policy::Union => {
                let merged = self.merger.merge(&region.ours, &region.theirs);
                (Resolution::Merged(merged.lines), merged.shadowed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::scanner::{marker_lines, scan, DEFAULT_MARKER_SIZE};

    const TWO_REGIONS: &str = "\
head
<<<<<<< HEAD
x = 1
=======
x = 2
y = 3
>>>>>>> feature
middle
<<<<<<< HEAD
z = 1
||||||| base
z = 0
=======
>>>>>>> feature
tail
";

    fn resolve(text: &str, policy: Policy) -> ResolvedConfig {
        let doc = scan(text, DEFAULT_MARKER_SIZE).unwrap();
        ConflictResolver::default().resolve(&doc, policy)
    }

    #[test]
    fn test_keep_ours() {
        let resolved = resolve(TWO_REGIONS, Policy::Ours);
        assert_eq!(resolved.text(), "head\nx = 1\nmiddle\nz = 1\ntail\n");
        assert!(resolved.outcomes().iter().all(|o| o.resolution == "ours"));
    }

    #[test]
    fn test_keep_theirs_is_verbatim() {
        let resolved = resolve(TWO_REGIONS, Policy::Theirs);
        assert_eq!(resolved.text(), "head\nx = 2\ny = 3\nmiddle\ntail\n");
        assert_eq!(resolved.outcomes()[0].lines_written, 2);
        assert_eq!(resolved.outcomes()[1].lines_written, 0);
    }

    #[test]
    fn test_union() {
        let resolved = resolve(TWO_REGIONS, Policy::Union);
        assert_eq!(resolved.text(), "head\nx = 2\ny = 3\nmiddle\nz = 1\ntail\n");
        assert_eq!(resolved.outcomes()[0].shadowed.len(), 1);
        assert_eq!(resolved.outcomes()[0].resolution, "merged");
    }

    #[test]
    fn test_no_markers_survive_any_policy() {
        for policy in [Policy::Ours, Policy::Theirs, Policy::Union] {
            let resolved = resolve(TWO_REGIONS, policy);
            assert!(marker_lines(resolved.text(), DEFAULT_MARKER_SIZE).is_empty());
            assert_eq!(resolved.outcomes().len(), 2);
        }
    }

    #[test]
    fn test_marker_free_input_unchanged() {
        let text = "plugins {\n    id(\"a\")\n}\nno trailing newline";
        for policy in [Policy::Ours, Policy::Theirs, Policy::Union] {
            let resolved = resolve(text, policy);
            assert_eq!(resolved.text(), text);
            assert!(resolved.outcomes().is_empty());
        }
    }

    #[test]
    fn test_labels_recorded() {
        let resolved = resolve(TWO_REGIONS, Policy::Ours);
        let first = &resolved.outcomes()[0];
        assert_eq!(first.ours_label.as_deref(), Some("HEAD"));
        assert_eq!(first.theirs_label.as_deref(), Some("feature"));
        assert_eq!((first.start_line, first.end_line), (2, 7));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("ours".parse::<Policy>(), Ok(Policy::Ours));
        assert_eq!("Theirs".parse::<Policy>(), Ok(Policy::Theirs));
        assert_eq!("union".parse::<Policy>(), Ok(Policy::Union));
        assert!("mine".parse::<Policy>().is_err());
        assert_eq!(Policy::Union.to_string(), "union");
    }

    #[test]
    fn test_resolution_labels() {
        assert_eq!(Resolution::Ours(vec![]).label(), "ours");
        assert_eq!(Resolution::Theirs(vec![]).label(), "theirs");
        assert_eq!(Resolution::Merged(vec!["a\n".into()]).lines(), ["a\n"]);
    }
}
