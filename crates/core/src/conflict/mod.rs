//! Conflict scanning, merging, and resolution.
//!
//! The conflict subsystem is responsible for:
//! 1. **Scanning** -- splitting marker-annotated text into a [`ConfigDocument`].
//! 2. **Merging** -- the key-aware union of both sides of a region.
//! 3. **Resolution** -- applying a [`Policy`] to every region.

pub mod document;
pub mod merger;
pub mod resolver;
pub mod scanner;

pub use document::{ConfigDocument, ConflictBlock, ConflictRegion, Segment, Side};
pub use merger::{MergeResult, ShadowedAssignment, UnionMerger};
pub use resolver::{ConflictResolver, Policy, RegionOutcome, Resolution, ResolvedConfig};
pub use scanner::{scan, DEFAULT_MARKER_SIZE};
