//! Semantic union of the two sides of a conflict region.
//!
//! Uses the `diffy` crate to align "ours" and "theirs" line by line. Common
//! lines are kept once; differing stretches keep ours-only lines followed by
//! theirs-only lines. Assignments that end up declared more than once in the
//! same block keep only their last occurrence, the way a declarative build
//! script would overwrite them.

use std::collections::{HashMap, HashSet};

use diffy::{DiffOptions, Line};
use serde::Serialize;
use tracing::{debug, warn};

use crate::conflict::document::{ConflictBlock, Side};
use crate::validation::code_brackets;

/// Property names that Groovy build scripts assign without `=`.
pub const DEFAULT_SPACE_ASSIGNMENT_KEYS: &[&str] = &[
    "sourceCompatibility",
    "targetCompatibility",
    "coreLibraryDesugaringEnabled",
    "jvmTarget",
    "minSdkVersion",
    "targetSdkVersion",
    "compileSdkVersion",
    "namespace",
    "applicationId",
    "versionCode",
    "versionName",
];

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Where a merged line came from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Origin {
    pub side: Side,
    /// Line number in the input document.
    pub line: usize,
}

/// An assignment dropped because a later one in the same block wins.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShadowedAssignment {
    /// Property name, normalised (`isFoo` becomes `foo`).
    pub key: String,
    /// Where the dropped line came from.
    pub dropped: Origin,
    /// Where the surviving line came from.
    pub kept: Origin,
}

/// The result of a union merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Merged lines, terminators preserved.
    pub lines: Vec<String>,
    /// Assignments removed by last-wins de-duplication.
    pub shadowed: Vec<ShadowedAssignment>,
}

// ---------------------------------------------------------------------------
// Merger
// ---------------------------------------------------------------------------

/// Key-aware union merger.
#[derive(Debug, Clone)]
pub struct UnionMerger {
    space_keys: HashSet<String>,
}

impl Default for UnionMerger {
    fn default() -> Self {
        Self::new(DEFAULT_SPACE_ASSIGNMENT_KEYS.iter().copied())
    }
}

impl UnionMerger {
    /// Create a merger recognising `space_keys` as Groovy-style
    /// `name value` assignments in addition to `name = value`.
    pub fn new<I, S>(space_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            space_keys: space_keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Merge two sides of a region.
    pub fn merge(&self, ours: &ConflictBlock, theirs: &ConflictBlock) -> MergeResult {
        if ours.lines == theirs.lines {
            debug!("ours == theirs, identical sides");
            return MergeResult {
                lines: ours.lines.clone(),
                shadowed: Vec::new(),
            };
        }
        if ours.is_empty() || theirs.is_empty() {
            let side = if ours.is_empty() { theirs } else { ours };
            debug!(side = %side.side, "one side empty");
            return MergeResult {
                lines: side.lines.clone(),
                shadowed: Vec::new(),
            };
        }

        let aligned = align(ours, theirs);
        self.drop_shadowed(aligned)
    }

    /// The assignment key of a line, if it is an assignment.
    pub fn assignment_key(&self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*') {
            return None;
        }

        let mut chars = trimmed.char_indices();
        let (_, first) = chars.next()?;
        if !(first.is_ascii_alphabetic() || first == '_') {
            return None;
        }
        let end = chars
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '.'))
            .map(|(i, _)| i)
            .unwrap_or(trimmed.len());
        let name = &trimmed[..end];
        let rest = trimmed[end..].trim_start();

        let is_assignment = if let Some(after) = rest.strip_prefix('=') {
            !after.starts_with('=')
        } else {
            self.space_keys.contains(name)
                && end < trimmed.len()
                && !rest.is_empty()
                && !rest.starts_with(['{', '(', '.'])
        };

        is_assignment.then(|| normalise_key(name))
    }

    fn drop_shadowed(&self, aligned: Vec<(Origin, &String)>) -> MergeResult {
        let mut scope = Scope::default();
        let keys: Vec<Option<String>> = aligned
            .iter()
            .map(|(_, line)| {
                let key = self
                    .assignment_key(line)
                    .map(|name| format!("{}{}", scope.path(), name));
                scope.advance(line);
                key
            })
            .collect();

        let mut last: HashMap<&str, usize> = HashMap::new();
        for (idx, key) in keys.iter().enumerate() {
            if let Some(key) = key {
                last.insert(key.as_str(), idx);
            }
        }

        let mut lines = Vec::with_capacity(aligned.len());
        let mut shadowed = Vec::new();
        for (idx, (origin, line)) in aligned.iter().enumerate() {
            let winner = keys[idx]
                .as_deref()
                .and_then(|key| last.get(key).copied())
                .filter(|&w| w != idx);
            match winner {
                Some(w) => {
                    let key = self.assignment_key(line).unwrap_or_default();
                    warn!(
                        key = key.as_str(),
                        dropped_line = origin.line,
                        kept_line = aligned[w].0.line,
                        "dropping shadowed assignment"
                    );
                    shadowed.push(ShadowedAssignment {
                        key,
                        dropped: *origin,
                        kept: aligned[w].0,
                    });
                }
                None => lines.push((*line).clone()),
            }
        }

        MergeResult { lines, shadowed }
    }
}

/// Strip a Kotlin boolean getter prefix: `isFooEnabled` -> `fooEnabled`.
fn normalise_key(name: &str) -> String {
    let last = name.rsplit('.').next().unwrap_or(name);
    let prefix = &name[..name.len() - last.len()];
    match last.strip_prefix("is") {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => {
            let mut chars = rest.chars();
            let head = chars.next().map(|c| c.to_ascii_lowercase());
            format!("{prefix}{}{}", head.map(String::from).unwrap_or_default(), chars.as_str())
        }
        _ => name.to_string(),
    }
}

/// Align both sides with a line diff, keeping every line of each.
fn align<'a>(ours: &'a ConflictBlock, theirs: &'a ConflictBlock) -> Vec<(Origin, &'a String)> {
    let ours_text = ours.text();
    let theirs_text = theirs.text();
    let context = ours.len() + theirs.len() + 1;
    let patch = DiffOptions::new()
        .set_context_len(context)
        .create_patch(&ours_text, &theirs_text);

    let at = |block: &ConflictBlock, idx: usize| Origin {
        side: block.side,
        line: block.start_line + idx,
    };

    let mut out = Vec::with_capacity(ours.len() + theirs.len());
    let mut pending_ours = Vec::new();
    let mut pending_theirs = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);

    let flush = move |out: &mut Vec<(Origin, &'a String)>,
                 pending_ours: &mut Vec<usize>,
                 pending_theirs: &mut Vec<usize>| {
        out.extend(pending_ours.drain(..).map(|k| (at(ours, k), &ours.lines[k])));
        out.extend(
            pending_theirs
                .drain(..)
                .map(|k| (at(theirs, k), &theirs.lines[k])),
        );
    };

    for hunk in patch.hunks() {
        for line in hunk.lines() {
            match line {
                Line::Context(_) => {
                    flush(&mut out, &mut pending_ours, &mut pending_theirs);
                    if i < ours.len() {
                        out.push((at(ours, i), &ours.lines[i]));
                    }
                    i += 1;
                    j += 1;
                }
                Line::Delete(_) => {
                    if i < ours.len() {
                        pending_ours.push(i);
                    }
                    i += 1;
                }
                Line::Insert(_) => {
                    if j < theirs.len() {
                        pending_theirs.push(j);
                    }
                    j += 1;
                }
            }
        }
    }
    flush(&mut out, &mut pending_ours, &mut pending_theirs);

    // Anything past the last hunk is common to both sides.
    out.extend((i..ours.len()).map(|k| (at(ours, k), &ours.lines[k])));
    out
}

/// Tracks the enclosing `name {` blocks of merged lines.
#[derive(Debug, Default)]
struct Scope {
    /// Closing braces seen with no matching opener inside the region.
    escaped: usize,
    stack: Vec<String>,
}

impl Scope {
    fn path(&self) -> String {
        let mut path = format!("{}/", self.escaped);
        for name in &self.stack {
            path.push_str(name);
            path.push('/');
        }
        path
    }

    /// Move past `line`, ignoring braces inside strings and comments.
    fn advance(&mut self, line: &str) {
        let mut segment_start = 0;
        for bracket in code_brackets(line) {
            match bracket.ch {
                '{' => {
                    let name = line[segment_start..bracket.offset]
                        .split_whitespace()
                        .last()
                        .unwrap_or("")
                        .to_string();
                    self.stack.push(name);
                    segment_start = bracket.offset + 1;
                }
                '}' => {
                    if self.stack.pop().is_none() {
                        self.escaped += 1;
                    }
                    segment_start = bracket.offset + 1;
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(side: Side, start_line: usize, text: &str) -> ConflictBlock {
        let mut b = ConflictBlock::new(side, start_line);
        for (idx, line) in text.split_inclusive('\n').enumerate() {
            b.push(line, start_line + idx);
        }
        b
    }

    #[test]
    fn test_identical_sides() {
        let ours = block(Side::Ours, 2, "a = 1\nb = 2\n");
        let theirs = block(Side::Theirs, 5, "a = 1\nb = 2\n");
        let result = UnionMerger::default().merge(&ours, &theirs);
        assert_eq!(result.lines, ours.lines);
        assert!(result.shadowed.is_empty());
    }

    #[test]
    fn test_empty_side_yields_other() {
        let ours = block(Side::Ours, 2, "");
        let theirs = block(Side::Theirs, 3, "dependencies {\n    implementation(\"x\")\n}\n");
        let result = UnionMerger::default().merge(&ours, &theirs);
        assert_eq!(result.lines, theirs.lines);

        let result = UnionMerger::default().merge(&theirs, &ours);
        assert_eq!(result.lines, theirs.lines);
    }

    #[test]
    fn test_last_assignment_wins() {
        let ours = block(
            Side::Ours,
            2,
            "    kotlinOptions {\n        jvmTarget = JavaVersion.VERSION_11.toString()\n    }\n",
        );
        let theirs = block(
            Side::Theirs,
            6,
            "    kotlinOptions {\n        jvmTarget = \"17\"\n    }\n",
        );
        let result = UnionMerger::default().merge(&ours, &theirs);
        assert_eq!(
            result.lines.concat(),
            "    kotlinOptions {\n        jvmTarget = \"17\"\n    }\n"
        );
        assert_eq!(result.shadowed.len(), 1);
        let shadow = &result.shadowed[0];
        assert_eq!(shadow.key, "jvmTarget");
        assert_eq!(shadow.dropped, Origin { side: Side::Ours, line: 3 });
        assert_eq!(shadow.kept, Origin { side: Side::Theirs, line: 7 });
    }

    #[test]
    fn test_union_keeps_additions_from_both_sides() {
        let ours = block(Side::Ours, 2, "a = 1\nb = 2\nc = 3\n");
        let theirs = block(Side::Theirs, 6, "a = 1\nd = 4\nc = 3\n");
        let result = UnionMerger::default().merge(&ours, &theirs);
        assert_eq!(result.lines.concat(), "a = 1\nb = 2\nd = 4\nc = 3\n");
        assert!(result.shadowed.is_empty());
    }

    #[test]
    fn test_same_key_in_different_blocks_survives() {
        let ours = block(Side::Ours, 2, "debug {\n    minify = false\n}\n");
        let theirs = block(Side::Theirs, 6, "release {\n    minify = true\n}\n");
        let result = UnionMerger::default().merge(&ours, &theirs);
        let text = result.lines.concat();
        assert!(text.contains("minify = false"));
        assert!(text.contains("minify = true"));
        assert!(result.shadowed.is_empty());
    }

    #[test]
    fn test_region_that_closes_outer_block() {
        let ours = block(
            Side::Ours,
            25,
            "        sourceCompatibility = JavaVersion.VERSION_17\n        targetCompatibility = JavaVersion.VERSION_17\n    }\n\n    kotlinOptions {\n        jvmTarget = JavaVersion.VERSION_11.toString()\n",
        );
        let theirs = block(
            Side::Theirs,
            32,
            "        sourceCompatibility = JavaVersion.VERSION_17\n        targetCompatibility = JavaVersion.VERSION_17\n        coreLibraryDesugaringEnabled = true\n    }\n\n    kotlinOptions {\n        jvmTarget = \"17\"\n",
        );
        let result = UnionMerger::default().merge(&ours, &theirs);
        assert_eq!(result.lines, theirs.lines);
        assert_eq!(result.shadowed.len(), 1);
    }

    #[test]
    fn test_braces_in_strings_keep_the_block_path() {
        let ours = block(Side::Ours, 2, "defaultConfig {\n    namespace = \"a{b\"\n");
        let theirs = block(Side::Theirs, 5, "defaultConfig {\n    namespace = \"c}d\" // }\n");
        let result = UnionMerger::default().merge(&ours, &theirs);
        assert_eq!(
            result.lines.concat(),
            "defaultConfig {\n    namespace = \"c}d\" // }\n"
        );
        assert_eq!(result.shadowed.len(), 1);
        assert_eq!(result.shadowed[0].key, "namespace");
    }

    #[test]
    fn test_groovy_space_assignment() {
        let merger = UnionMerger::default();
        assert_eq!(
            merger.assignment_key("    sourceCompatibility JavaVersion.VERSION_17\n"),
            Some("sourceCompatibility".into())
        );
        assert_eq!(merger.assignment_key("    implementation 'a:b:1'\n"), None);
        assert_eq!(merger.assignment_key("    compileOptions {\n"), None);
    }

    #[test]
    fn test_assignment_key_parsing() {
        let merger = UnionMerger::default();
        assert_eq!(merger.assignment_key("x = 1"), Some("x".into()));
        assert_eq!(
            merger.assignment_key("  android.namespace = \"a\""),
            Some("android.namespace".into())
        );
        assert_eq!(
            merger.assignment_key("isCoreLibraryDesugaringEnabled = true"),
            Some("coreLibraryDesugaringEnabled".into())
        );
        assert_eq!(merger.assignment_key("island = 1"), Some("island".into()));
        assert_eq!(merger.assignment_key("if (a == b) {"), None);
        assert_eq!(merger.assignment_key("// x = 1"), None);
        assert_eq!(merger.assignment_key("coreLibraryDesugaring(\"x\")"), None);
        assert_eq!(merger.assignment_key(""), None);
    }

    #[test]
    fn test_crlf_lines_preserved() {
        let ours = block(Side::Ours, 2, "a = 1\r\n");
        let theirs = block(Side::Theirs, 4, "a = 2\r\n");
        let result = UnionMerger::default().merge(&ours, &theirs);
        assert_eq!(result.lines, vec!["a = 2\r\n".to_string()]);
    }
}
