//! Expansion of range specs into frame index sequences
//!
//! Ranges are inclusive of the start frame and exclusive of the end frame,
//! stepping up or down toward the end. `0-3` expands to `0, 1, 2` and `3-0`
//! to `3, 2, 1`.

use crate::diagnostic::Diagnostic;
use crate::models::RangeSpec;

/// Indices from `start` toward `end`, excluding `end`.
///
/// Returns an empty iterator when `start == end`.
pub fn stepped_range(start: i64, end: i64) -> impl Iterator<Item = i64> {
    let diff = i128::from(end) - i128::from(start);
    let step = diff.signum();
    (0..diff.unsigned_abs()).map(move |i| (i128::from(start) + step * i as i128) as i64)
}

/// Most indices one definition may expand to.
pub const MAX_SEQUENCE_LEN: usize = 65_536;

/// Number of indices `spec` expands to, or `None` past `u64::MAX`.
pub fn spec_len(spec: &RangeSpec) -> Option<u64> {
    if spec.duration <= 0 {
        return Some(0);
    }
    let span = if spec.is_hold() {
        1
    } else {
        spec.end_frame.abs_diff(spec.start_frame)
    };
    span.checked_mul(spec.duration.unsigned_abs())
}

/// Expand range specs into the ordered list of frame indices they describe.
///
/// Specs with a non-positive duration contribute nothing. Specs that would
/// push the total past [`MAX_SEQUENCE_LEN`] are dropped; use
/// [`expand_checked`] to get a diagnostic for each.
///
/// # Examples
///
/// ```
/// use atlasdef::models::RangeSpec;
/// use atlasdef::sequence::expand;
///
/// assert_eq!(expand(&[RangeSpec::new(0, 3, 1)]), vec![0, 1, 2]);
/// assert_eq!(expand(&[RangeSpec::new(3, 0, 1)]), vec![3, 2, 1]);
/// assert_eq!(expand(&[RangeSpec::new(2, 2, 3)]), vec![2, 2, 2]);
/// ```
pub fn expand(specs: &[RangeSpec]) -> Vec<i64> {
    expand_checked(specs).0
}

/// Like [`expand`], also returning a `SequenceTooLong` diagnostic for every
/// spec that was dropped for length.
pub fn expand_checked(specs: &[RangeSpec]) -> (Vec<i64>, Vec<Diagnostic>) {
    let mut expanded = Vec::new();
    let mut diagnostics = Vec::new();

    for spec in specs {
        let fits = spec_len(spec)
            .and_then(|len| len.checked_add(expanded.len() as u64))
            .is_some_and(|total| total <= MAX_SEQUENCE_LEN as u64);
        if !fits {
            diagnostics.push(Diagnostic::sequence_too_long(
                spec.start_frame,
                spec.end_frame,
                spec.duration,
                MAX_SEQUENCE_LEN,
            ));
            continue;
        }
        if spec.duration <= 0 {
            continue;
        }
        let repeat = spec.duration as usize;

        if spec.is_hold() {
            expanded.extend(std::iter::repeat(spec.start_frame).take(repeat));
        } else {
            for frame in stepped_range(spec.start_frame, spec.end_frame) {
                expanded.extend(std::iter::repeat(frame).take(repeat));
            }
        }
    }

    (expanded, diagnostics)
}

/// The members of `stepped_range(start, end)` that fall in `0..len`, in the
/// same order, without walking the out-of-range part.
pub fn clamped_range(start: i64, end: i64, len: usize) -> impl Iterator<Item = i64> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let (from, to) = if start <= end {
        let lo = start.max(0);
        let hi = end.min(len);
        if lo < hi {
            (lo, hi)
        } else {
            (0, 0)
        }
    } else {
        // Descending: members are start, start - 1, ..., end + 1
        let hi = start.min(len - 1);
        let lo = end.saturating_add(1).max(0);
        if hi >= lo {
            (hi, lo - 1)
        } else {
            (0, 0)
        }
    };
    stepped_range(from, to)
}

/// Report every index that falls outside `0..len`.
///
/// Out-of-range indices are not removed; the caller decides what to do with
/// them.
pub fn check_bounds(indices: &[i64], len: usize) -> Vec<Diagnostic> {
    indices
        .iter()
        .filter(|&&i| !in_bounds(i, len))
        .map(|&i| Diagnostic::frame_out_of_bounds(i, len))
        .collect()
}

/// True when `index` addresses an element of a list of length `len`.
pub fn in_bounds(index: i64, len: usize) -> bool {
    index >= 0 && (index as u64) < len as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use crate::models::UNSET_FRAME;

    #[test]
    fn test_ascending_range_excludes_end() {
        assert_eq!(expand(&[RangeSpec::new(0, 3, 1)]), vec![0, 1, 2]);
    }

    #[test]
    fn test_descending_range_excludes_end() {
        assert_eq!(expand(&[RangeSpec::new(3, 0, 1)]), vec![3, 2, 1]);
    }

    #[test]
    fn test_hold_repeats() {
        assert_eq!(expand(&[RangeSpec::new(2, 2, 3)]), vec![2, 2, 2]);
    }

    #[test]
    fn test_zero_duration_dropped() {
        assert_eq!(expand(&[RangeSpec::new(0, 0, 0)]), Vec::<i64>::new());
        assert_eq!(expand(&[RangeSpec::new(0, 5, 0)]), Vec::<i64>::new());
        assert_eq!(expand(&[RangeSpec::new(0, 5, -2)]), Vec::<i64>::new());
    }

    #[test]
    fn test_unset_end_is_hold() {
        assert_eq!(expand(&[RangeSpec::new(4, UNSET_FRAME, 2)]), vec![4, 4]);
    }

    #[test]
    fn test_range_with_duration() {
        assert_eq!(expand(&[RangeSpec::new(1, 3, 2)]), vec![1, 1, 2, 2]);
    }

    #[test]
    fn test_multiple_specs_concatenate() {
        let specs = [
            RangeSpec::new(0, 2, 1),
            RangeSpec::single(7),
            RangeSpec::new(5, 3, 2),
        ];
        assert_eq!(expand(&specs), vec![0, 1, 7, 5, 5, 4, 4]);
    }

    #[test]
    fn test_length_matches_duration_times_span() {
        let specs = [
            RangeSpec::new(0, 4, 3),
            RangeSpec::new(10, 7, 2),
            RangeSpec::new(2, 3, 5),
        ];
        let expected: i64 = specs
            .iter()
            .map(|s| s.duration * (s.end_frame - s.start_frame).abs())
            .sum();
        assert_eq!(expand(&specs).len() as i64, expected);
    }

    #[test]
    fn test_stepped_range() {
        assert_eq!(stepped_range(2, 5).collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(stepped_range(5, 2).collect::<Vec<_>>(), vec![5, 4, 3]);
        assert_eq!(stepped_range(1, 1).count(), 0);
    }

    #[test]
    fn test_huge_duration_is_skipped() {
        let (indices, diagnostics) = expand_checked(&[
            RangeSpec::single(1),
            RangeSpec::new(0, 0, i64::MAX),
            RangeSpec::single(2),
        ]);
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::SequenceTooLong);
    }

    #[test]
    fn test_huge_span_is_skipped() {
        let (indices, diagnostics) = expand_checked(&[RangeSpec::new(0, 9_999_999_999, 1)]);
        assert!(indices.is_empty());
        assert_eq!(diagnostics.len(), 1);

        // Span and duration multiply past u64
        let specs = [RangeSpec::new(i64::MIN, i64::MAX, i64::MAX)];
        assert_eq!(spec_len(&specs[0]), None);
        assert!(expand(&specs).is_empty());
    }

    #[test]
    fn test_limit_applies_to_running_total() {
        let half = (MAX_SEQUENCE_LEN / 2) as i64;
        let specs = [
            RangeSpec::new(0, half, 1),
            RangeSpec::new(0, half, 1),
            RangeSpec::single(3),
        ];
        let (indices, diagnostics) = expand_checked(&specs);
        assert_eq!(indices.len(), MAX_SEQUENCE_LEN);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(expand(&[RangeSpec::new(0, MAX_SEQUENCE_LEN as i64, 1)]).len(), MAX_SEQUENCE_LEN);
    }

    #[test]
    fn test_spec_len() {
        assert_eq!(spec_len(&RangeSpec::new(0, 4, 3)), Some(12));
        assert_eq!(spec_len(&RangeSpec::new(5, 5, 2)), Some(2));
        assert_eq!(spec_len(&RangeSpec::new(5, 1, 0)), Some(0));
    }

    #[test]
    fn test_clamped_range_matches_filtered_stepped_range() {
        for (start, end) in [(0, 3), (3, 0), (-4, 2), (2, -4), (1, 9), (9, 1), (6, 8), (-3, -1), (2, 2)] {
            let filtered: Vec<i64> = stepped_range(start, end).filter(|&i| in_bounds(i, 5)).collect();
            assert_eq!(clamped_range(start, end, 5).collect::<Vec<_>>(), filtered, "{}..{}", start, end);
        }
    }

    #[test]
    fn test_clamped_range_huge_bounds() {
        assert_eq!(clamped_range(0, i64::MAX, 2).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(clamped_range(i64::MAX, i64::MIN, 3).collect::<Vec<_>>(), vec![2, 1, 0]);
        assert_eq!(clamped_range(i64::MIN, -1, 3).count(), 0);
        assert_eq!(clamped_range(0, 5, 0).count(), 0);
    }

    #[test]
    fn test_check_bounds() {
        let diagnostics = check_bounds(&[0, 1, 3, -1, 2], 3);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].message.contains("index 3"));
        assert!(diagnostics[1].message.contains("index -1"));
    }

    #[test]
    fn test_in_bounds() {
        assert!(in_bounds(0, 1));
        assert!(!in_bounds(1, 1));
        assert!(!in_bounds(-1, 5));
        assert!(!in_bounds(0, 0));
    }
}
