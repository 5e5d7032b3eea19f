//! Grouping of atlas frames into animations by name
//!
//! A frame's group key is its name with the trailing run of ASCII digits
//! removed: `heroIdle0` belongs to `heroIdle`, while `hero0Idle` and `hero`
//! belong to no group.

use crate::models::Frame;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// How frames inside a group are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameOrder {
    /// Ascending by full name, codepoint order. `x10` sorts before `x9`.
    #[default]
    Lexicographic,
    /// Ascending by the trailing number, ties broken by name.
    Numeric,
}

/// Group key of `name`, or `None` if it has no trailing digits.
///
/// ```
/// use atlasdef::grouping::group_key;
///
/// assert_eq!(group_key("heroIdle12"), Some("heroIdle"));
/// assert_eq!(group_key("hero0Idle"), None);
/// assert_eq!(group_key("7"), Some(""));
/// ```
pub fn group_key(name: &str) -> Option<&str> {
    let key = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if key.len() == name.len() {
        None
    } else {
        Some(key)
    }
}

/// The trailing number of `name`, saturating on overflow.
fn frame_number(name: &str) -> Option<u64> {
    let key = group_key(name)?;
    Some(name[key.len()..].bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    }))
}

fn compare(order: FrameOrder, a: &Frame, b: &Frame) -> Ordering {
    match order {
        FrameOrder::Lexicographic => a.name.cmp(&b.name),
        FrameOrder::Numeric => frame_number(&a.name)
            .cmp(&frame_number(&b.name))
            .then_with(|| a.name.cmp(&b.name)),
    }
}

/// Group frames by key, each group sorted by name.
///
/// # Examples
///
/// ```
/// use atlasdef::grouping::group_by_key;
/// use atlasdef::models::Frame;
///
/// let frame = |name: &str| Frame {
///     name: name.to_string(),
///     source: String::new(),
///     width: 1,
///     height: 1,
///     top: 0,
///     left: 0,
/// };
/// let groups = group_by_key(&[frame("heroJump3"), frame("heroJump0"), frame("hero")]);
/// let names: Vec<&str> = groups["heroJump"].iter().map(|f| f.name.as_str()).collect();
/// assert_eq!(names, vec!["heroJump0", "heroJump3"]);
/// assert!(!groups.contains_key("hero"));
/// ```
pub fn group_by_key(frames: &[Frame]) -> BTreeMap<String, Vec<Frame>> {
    group_by_key_with(frames, FrameOrder::Lexicographic)
}

/// Group frames by key using the given member order.
///
/// Members are appended in first-seen order and stably sorted once at the
/// end, which gives the same result as re-sorting after every insertion.
pub fn group_by_key_with(frames: &[Frame], order: FrameOrder) -> BTreeMap<String, Vec<Frame>> {
    let mut groups: BTreeMap<String, Vec<Frame>> = BTreeMap::new();

    for frame in frames {
        if let Some(key) = group_key(&frame.name) {
            groups.entry(key.to_string()).or_default().push(frame.clone());
        }
    }

    for members in groups.values_mut() {
        members.sort_by(|a, b| compare(order, a, b));
    }

    groups
}
