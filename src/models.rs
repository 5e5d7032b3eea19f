//! Data models for atlas metadata and parsed definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named rectangular region of the atlas image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Frame {
    pub name: String,
    #[serde(rename = "src", alias = "source", default)]
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub top: u32,
    pub left: u32,
}

/// Atlas metadata as read from the metadata file.
///
/// Frame order is significant: definitions and index selectors address
/// frames by their position in this list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AtlasMetadata {
    pub frames: Vec<Frame>,
}

/// Sentinel for a range spec with no explicit end frame.
pub const UNSET_FRAME: i64 = -1;

/// One comma-separated clause of a definition, e.g. `0-3(2)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RangeSpec {
    pub start_frame: i64,
    pub end_frame: i64,
    /// Repeat count for every frame in the clause
    pub duration: i64,
}

impl RangeSpec {
    /// A single frame held for one tick.
    pub fn single(frame: i64) -> Self {
        Self {
            start_frame: frame,
            end_frame: frame,
            duration: 1,
        }
    }

    pub fn new(start_frame: i64, end_frame: i64, duration: i64) -> Self {
        Self {
            start_frame,
            end_frame,
            duration,
        }
    }

    /// True when the clause names one frame rather than a range.
    pub fn is_hold(&self) -> bool {
        self.end_frame == UNSET_FRAME || self.end_frame == self.start_frame
    }
}

/// Animation name to definition text.
///
/// Ordered so application order is deterministic.
pub type Definitions = BTreeMap<String, String>;
