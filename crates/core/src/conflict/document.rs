//! Document model produced by the scanner.
//!
//! A [`ConfigDocument`] is the input text split into plain-text segments and
//! conflict regions. Lines keep their original terminators so that the
//! document can always be written back byte-for-byte.

use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which side of a conflict region a block belongs to.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Between the start marker and the base marker (or separator).
    Ours,
    /// diff3 common ancestor, between the base marker and the separator.
    Base,
    /// Between the separator and the end marker.
    Theirs,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ours => write!(f, "ours"),
            Self::Base => write!(f, "base"),
            Self::Theirs => write!(f, "theirs"),
        }
    }
}

/// The lines of one side of a conflict region.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConflictBlock {
    pub side: Side,
    /// First content line (1-based).
    pub start_line: usize,
    /// Last content line (1-based). `start_line - 1` when the block is empty.
    pub end_line: usize,
    /// Raw lines including their terminators.
    #[serde(skip)]
    pub lines: Vec<String>,
}

impl ConflictBlock {
    pub(crate) fn new(side: Side, start_line: usize) -> Self {
        Self {
            side,
            start_line,
            end_line: start_line.saturating_sub(1),
            lines: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, line: &str, line_no: usize) {
        self.lines.push(line.to_string());
        self.end_line = line_no;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// The block's raw text.
    pub fn text(&self) -> String {
        self.lines.concat()
    }
}

/// One `<<<<<<< ... >>>>>>>` region.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConflictRegion {
    /// Line of the start marker.
    pub start_line: usize,
    /// Line of the separator.
    pub separator_line: usize,
    /// Line of the end marker.
    pub end_line: usize,
    /// Label after the start marker (usually `HEAD`).
    pub ours_label: Option<String>,
    /// Label after the end marker (usually a branch or commit).
    pub theirs_label: Option<String>,
    pub ours: ConflictBlock,
    pub base: Option<ConflictBlock>,
    pub theirs: ConflictBlock,
}

/// A piece of the scanned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Lines outside any conflict region.
    Text(Vec<String>),
    /// A conflict region.
    Conflict(ConflictRegion),
}

/// Scanned input: plain text interleaved with conflict regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    segments: Vec<Segment>,
}

impl ConfigDocument {
    pub(crate) fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Iterate over conflict regions in document order.
    pub fn regions(&self) -> impl Iterator<Item = &ConflictRegion> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Conflict(region) => Some(region),
            Segment::Text(_) => None,
        })
    }

    pub fn region_count(&self) -> usize {
        self.regions().count()
    }

    pub fn has_conflicts(&self) -> bool {
        self.regions().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_block_range() {
        let block = ConflictBlock::new(Side::Theirs, 5);
        assert!(block.is_empty());
        assert_eq!(block.start_line, 5);
        assert_eq!(block.end_line, 4);
    }

    #[test]
    fn test_block_push_tracks_end_line() {
        let mut block = ConflictBlock::new(Side::Ours, 2);
        block.push("a = 1\n", 2);
        block.push("b = 2\n", 3);
        assert_eq!(block.len(), 2);
        assert_eq!(block.end_line, 3);
        assert_eq!(block.text(), "a = 1\nb = 2\n");
    }

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Ours.to_string(), "ours");
        assert_eq!(Side::Base.to_string(), "base");
        assert_eq!(Side::Theirs.to_string(), "theirs");
    }
}
