//! Loaded atlas pages, definition application and frame queries
//!
//! A page owns the flat frame list from the atlas metadata, an index from
//! group name to ordered frames, and the texture handle it was loaded with.
//! The flat list never changes after construction. Group entries are
//! replaced wholesale whenever a definition is applied for that name.

use crate::diagnostic::{Diagnostic, DiagnosticSink};
use crate::grouping::{group_by_key_with, FrameOrder};
use crate::models::{Definitions, Frame};
use crate::parser::parse_definition;
use crate::sequence::{check_bounds, clamped_range, expand_checked, in_bounds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Whether diagnostics while applying a definition reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Report diagnostics and apply the best-effort result
    #[default]
    Lenient,
    /// Any diagnostic rejects the definition
    Strict,
}

/// Error while applying definitions to a page.
///
/// Application stops at the first failing name. Names applied earlier in the
/// same call keep their new entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("Animation name '{name}' not found. Known groups: {}", .known.join(", "))]
    UnknownAnimation { name: String, known: Vec<String> },
    #[error("Animation '{name}' rejected in strict mode:\n{}", .diagnostics.iter().map(|d| d.render()).collect::<Vec<_>>().join("\n"))]
    Rejected {
        name: String,
        diagnostics: Vec<Diagnostic>,
    },
}

/// What to fetch from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSelector {
    /// A group's current frame list
    Name(String),
    /// One frame of the flat list
    Index(i64),
    /// Flat frames from `start` toward `end`, excluding `end`
    Range(i64, i64),
}

impl From<&str> for FrameSelector {
    fn from(name: &str) -> Self {
        FrameSelector::Name(name.to_string())
    }
}

impl From<i64> for FrameSelector {
    fn from(index: i64) -> Self {
        FrameSelector::Index(index)
    }
}

impl From<(i64, i64)> for FrameSelector {
    fn from((start, end): (i64, i64)) -> Self {
        FrameSelector::Range(start, end)
    }
}

impl FromStr for FrameSelector {
    type Err = std::convert::Infallible;

    /// `"3"` selects an index, `"2..5"` a range, anything else a group name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(index) = s.parse::<i64>() {
            return Ok(FrameSelector::Index(index));
        }
        if let Some((start, end)) = s.split_once("..") {
            if let (Ok(start), Ok(end)) = (start.trim().parse(), end.trim().parse()) {
                return Ok(FrameSelector::Range(start, end));
            }
        }
        Ok(FrameSelector::Name(s.to_string()))
    }
}

impl fmt::Display for FrameSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSelector::Name(name) => write!(f, "{}", name),
            FrameSelector::Index(index) => write!(f, "{}", index),
            FrameSelector::Range(start, end) => write!(f, "{}..{}", start, end),
        }
    }
}

/// A fully loaded atlas page.
pub struct Page<T> {
    frames: Vec<Frame>,
    named_frames: RwLock<BTreeMap<String, Vec<Frame>>>,
    texture: T,
    strictness: Strictness,
}

impl<T: fmt::Debug> fmt::Debug for Page<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("frames", &self.frames.len())
            .field("groups", &self.group_names())
            .field("texture", &self.texture)
            .field("strictness", &self.strictness)
            .finish()
    }
}

impl<T> Page<T> {
    /// Build a page with lexicographic group order and lenient definitions.
    pub fn new(frames: Vec<Frame>, texture: T) -> Self {
        Self::with_options(frames, texture, FrameOrder::default(), Strictness::default())
    }

    pub fn with_options(
        frames: Vec<Frame>,
        texture: T,
        order: FrameOrder,
        strictness: Strictness,
    ) -> Self {
        let named_frames = group_by_key_with(&frames, order);
        Self {
            frames,
            named_frames: RwLock::new(named_frames),
            texture,
            strictness,
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn texture(&self) -> &T {
        &self.texture
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Names currently present in the group index, sorted.
    pub fn group_names(&self) -> Vec<String> {
        self.read_index().keys().cloned().collect()
    }

    pub fn contains_group(&self, name: &str) -> bool {
        self.read_index().contains_key(name)
    }

    /// Snapshot of one group's current frames.
    pub fn named_frames(&self, name: &str) -> Option<Vec<Frame>> {
        self.read_index().get(name).cloned()
    }

    /// Snapshot of the whole group index.
    pub fn groups(&self) -> BTreeMap<String, Vec<Frame>> {
        self.read_index().clone()
    }

    fn read_index(&self) -> RwLockReadGuard<'_, BTreeMap<String, Vec<Frame>>> {
        self.named_frames
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Vec<Frame>>> {
        self.named_frames
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply animation definitions to the group index.
    ///
    /// Each definition's indices select from the named group's *current*
    /// frames, and the result replaces that group's entry. An unknown name
    /// stops the call; earlier names stay applied.
    pub fn apply_definitions(
        &self,
        definitions: &Definitions,
        sink: &dyn DiagnosticSink,
    ) -> Result<(), DefinitionError> {
        for (name, definition) in definitions {
            self.apply_definition(name, definition, sink)?;
        }
        Ok(())
    }

    /// Apply a single definition. See [`Page::apply_definitions`].
    ///
    /// Clauses that would expand past
    /// [`MAX_SEQUENCE_LEN`](crate::sequence::MAX_SEQUENCE_LEN) frames are
    /// reported and skipped (rejected in strict mode).
    pub fn apply_definition(
        &self,
        name: &str,
        definition: &str,
        sink: &dyn DiagnosticSink,
    ) -> Result<(), DefinitionError> {
        let current = {
            let index = self.read_index();
            match index.get(name) {
                Some(frames) => frames.clone(),
                None => {
                    return Err(DefinitionError::UnknownAnimation {
                        name: name.to_string(),
                        known: index.keys().cloned().collect(),
                    })
                }
            }
        };

        let parsed = parse_definition(definition);
        let (indices, too_long) = expand_checked(&parsed.specs);
        let mut diagnostics = parsed.diagnostics;
        diagnostics.extend(too_long);
        diagnostics.extend(check_bounds(&indices, current.len()));

        if self.strictness == Strictness::Strict && !diagnostics.is_empty() {
            return Err(DefinitionError::Rejected {
                name: name.to_string(),
                diagnostics,
            });
        }

        let materialized: Vec<Frame> = indices
            .iter()
            .filter(|&&i| in_bounds(i, current.len()))
            .map(|&i| current[i as usize].clone())
            .collect();

        log::debug!(
            "applied definition '{}' to '{}': {} frames",
            definition,
            name,
            materialized.len()
        );
        self.write_index().insert(name.to_string(), materialized);

        for diagnostic in diagnostics {
            sink.report(diagnostic);
        }
        Ok(())
    }

    /// Fetch frames by group name, flat index, or flat index range.
    ///
    /// Problems are reported to `sink` and never fail the query: an unknown
    /// name or out-of-range index yields an empty list, and a range with an
    /// out-of-range bound yields only its in-range members.
    pub fn get_frames(&self, selector: &FrameSelector, sink: &dyn DiagnosticSink) -> Vec<Frame> {
        match selector {
            FrameSelector::Name(name) => self.frames_by_name(name, sink),
            FrameSelector::Index(index) => self.frame_by_index(*index, sink),
            FrameSelector::Range(start, end) => self.frames_by_range(*start, *end, sink),
        }
    }

    fn frames_by_name(&self, name: &str, sink: &dyn DiagnosticSink) -> Vec<Frame> {
        match self.named_frames(name) {
            Some(frames) => frames,
            None => {
                sink.report(Diagnostic::unknown_group(name));
                Vec::new()
            }
        }
    }

    fn frame_by_index(&self, index: i64, sink: &dyn DiagnosticSink) -> Vec<Frame> {
        if !in_bounds(index, self.frames.len()) {
            sink.report(Diagnostic::frame_out_of_bounds(index, self.frames.len()));
            return Vec::new();
        }
        vec![self.frames[index as usize].clone()]
    }

    fn frames_by_range(&self, start: i64, end: i64, sink: &dyn DiagnosticSink) -> Vec<Frame> {
        let len = self.frames.len();
        if !in_bounds(start, len) || !in_bounds(end, len) {
            sink.report(Diagnostic::range_out_of_bounds(start, end, len));
        }

        // An empty range selects the first frame of the page
        if start == end {
            return self.frames.first().cloned().into_iter().collect();
        }

        clamped_range(start, end, len)
            .map(|i| self.frames[i as usize].clone())
            .collect()
    }
}
