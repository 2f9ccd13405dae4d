//! Conflict marker scanning.
//!
//! Reads text once, line by line, and splits it into a [`ConfigDocument`].
//! Marker order inside a region must be start, optional base, separator,
//! end; anything else is rejected with a [`ConflictError`] naming the line.

use tracing::{debug, info};

use crate::conflict::document::{ConfigDocument, ConflictBlock, ConflictRegion, Segment, Side};
use crate::errors::ConflictError;

/// Marker length git writes by default.
pub const DEFAULT_MARKER_SIZE: usize = 7;

// ---------------------------------------------------------------------------
// Marker classification
// ---------------------------------------------------------------------------

/// A recognised marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// `<<<<<<< label`
    Start(Option<String>),
    /// `||||||| label` (diff3 style)
    Base,
    /// `=======`
    Separator,
    /// `>>>>>>> label`
    End(Option<String>),
}

/// Classify a single line (with or without its terminator).
///
/// A marker is exactly `size` repetitions of its character, followed by end
/// of line or whitespace. Longer runs are ordinary text.
pub fn classify(line: &str, size: usize) -> Option<Marker> {
    let line = line.trim_end_matches(['\n', '\r']);
    let first = line.chars().next()?;
    if !matches!(first, '<' | '|' | '=' | '>') {
        return None;
    }

    let run = line.chars().take_while(|&c| c == first).count();
    if run != size {
        return None;
    }

    let rest = &line[run..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let label = Some(rest.trim()).filter(|l| !l.is_empty()).map(str::to_string);

    match first {
        '<' => Some(Marker::Start(label)),
        '|' => Some(Marker::Base),
        '=' if label.is_none() => Some(Marker::Separator),
        '>' => Some(Marker::End(label)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// A region being read.
struct OpenRegion {
    start_line: usize,
    ours_label: Option<String>,
    ours: ConflictBlock,
    base: Option<ConflictBlock>,
    separator_line: Option<usize>,
    theirs: Option<ConflictBlock>,
}

impl OpenRegion {
    fn current_block(&mut self) -> &mut ConflictBlock {
        if let Some(theirs) = self.theirs.as_mut() {
            theirs
        } else if let Some(base) = self.base.as_mut() {
            base
        } else {
            &mut self.ours
        }
    }
}

/// Scan `text` into a [`ConfigDocument`].
///
/// Input without markers yields a single text segment (or none, for empty
/// input).
pub fn scan(text: &str, marker_size: usize) -> Result<ConfigDocument, ConflictError> {
    let mut segments = Vec::new();
    let mut plain: Vec<String> = Vec::new();
    let mut open: Option<OpenRegion> = None;

    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        let marker = classify(line, marker_size);

        let Some(region) = open.as_mut() else {
            match marker {
                None => plain.push(line.to_string()),
                Some(Marker::Start(label)) => {
                    if !plain.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut plain)));
                    }
                    debug!(line = line_no, "conflict region opened");
                    open = Some(OpenRegion {
                        start_line: line_no,
                        ours_label: label,
                        ours: ConflictBlock::new(Side::Ours, line_no + 1),
                        base: None,
                        separator_line: None,
                        theirs: None,
                    });
                }
                Some(Marker::Base) => {
                    return Err(ConflictError::UnexpectedBaseMarker { line: line_no })
                }
                Some(Marker::Separator) => {
                    return Err(ConflictError::UnexpectedSeparator { line: line_no })
                }
                Some(Marker::End(_)) => return Err(ConflictError::UnexpectedEnd { line: line_no }),
            }
            continue;
        };

        match marker {
            None => region.current_block().push(line, line_no),
            Some(Marker::Start(_)) => {
                return Err(ConflictError::NestedStart {
                    line: line_no,
                    outer: region.start_line,
                })
            }
            Some(Marker::Base) => {
                if region.base.is_some() || region.separator_line.is_some() {
                    return Err(ConflictError::UnexpectedBaseMarker { line: line_no });
                }
                region.base = Some(ConflictBlock::new(Side::Base, line_no + 1));
            }
            Some(Marker::Separator) => {
                if let Some(first) = region.separator_line {
                    return Err(ConflictError::DuplicateSeparator {
                        line: line_no,
                        first,
                    });
                }
                region.separator_line = Some(line_no);
                region.theirs = Some(ConflictBlock::new(Side::Theirs, line_no + 1));
            }
            Some(Marker::End(label)) => {
                let (Some(separator_line), Some(theirs)) =
                    (region.separator_line, region.theirs.take())
                else {
                    return Err(ConflictError::MissingSeparator {
                        line: line_no,
                        start: region.start_line,
                    });
                };
                let ours = std::mem::replace(
                    &mut region.ours,
                    ConflictBlock::new(Side::Ours, region.start_line + 1),
                );
                debug!(
                    start = region.start_line,
                    end = line_no,
                    ours = ours.len(),
                    theirs = theirs.len(),
                    "conflict region closed"
                );
                segments.push(Segment::Conflict(ConflictRegion {
                    start_line: region.start_line,
                    separator_line,
                    end_line: line_no,
                    ours_label: region.ours_label.take(),
                    theirs_label: label,
                    ours,
                    base: region.base.take(),
                    theirs,
                }));
                open = None;
            }
        }
    }

    if let Some(region) = open {
        return Err(ConflictError::UnterminatedRegion {
            line: region.start_line,
        });
    }
    if !plain.is_empty() {
        segments.push(Segment::Text(plain));
    }

    let document = ConfigDocument::new(segments);
    info!(regions = document.region_count(), "scanned document");
    Ok(document)
}

/// Line numbers of every marker line in `text`, regardless of nesting.
pub fn marker_lines(text: &str, marker_size: usize) -> Vec<usize> {
    text.split_inclusive('\n')
        .enumerate()
        .filter(|(_, line)| classify(line, marker_size).is_some())
        .map(|(idx, _)| idx + 1)
        .collect()
}
