//! Operational transform for single-hunk diffs.

use crate::types::Diff;

/// Rebase `diff` over `other`, which was applied first to the same base.
///
/// - `diff` entirely after `other` (`diff.from >= other.to`): both ends shift
///   by `other`'s length delta.
/// - `diff` entirely before `other` (`diff.to <= other.from`): unchanged.
/// - Otherwise the ranges overlap and `None` is returned.
///
/// Touching ranges are not overlapping. The shift uses `other.delete_length`
/// (0 when absent), matching what the sender declared.
///
/// # Examples
///
/// ```
/// use codesync::Diff;
/// use codesync::merge::transform_diff;
///
/// let local = Diff::new(8, 10, "ok");
/// let remote = Diff::new(0, 3, "a");
/// let rebased = transform_diff(&local, &remote).unwrap();
/// assert_eq!((rebased.from, rebased.to), (6, 8));
/// ```
pub fn transform_diff(diff: &Diff, other: &Diff) -> Option<Diff> {
    if diff.from >= other.to {
        let offset = other.length_delta();
        Some(Diff {
            from: shift(diff.from, offset),
            to: shift(diff.to, offset),
            ..diff.clone()
        })
    } else if diff.to <= other.from {
        Some(diff.clone())
    } else {
        None
    }
}

// A well-formed `other` never deletes past `diff.from`, so the result stays
// non-negative; saturate anyway for malformed declared lengths.
fn shift(pos: usize, offset: isize) -> usize {
    pos.saturating_add_signed(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_after_insertion_shifts() {
        let diff = Diff::insertion(5, "x");
        let other = Diff::insertion(2, "abc");
        assert_eq!(transform_diff(&diff, &other), Some(Diff::insertion(8, "x")));
    }

    #[test]
    fn test_after_deletion_shifts_back() {
        let diff = Diff::new(10, 12, "zz");
        let other = Diff::deletion(0, 4);
        let out = transform_diff(&diff, &other).unwrap();
        assert_eq!((out.from, out.to), (6, 8));
        assert_eq!(out.insert, "zz");
        assert_eq!(out.delete_length, Some(2));
    }

    #[test]
    fn test_before_is_unchanged() {
        let diff = Diff::new(0, 2, "q");
        let other = Diff::new(4, 6, "");
        assert_eq!(transform_diff(&diff, &other), Some(diff));
    }

    #[test]
    fn test_adjacent_is_not_conflict() {
        let left = Diff::new(0, 5, "a");
        let right = Diff::new(5, 10, "b");
        assert!(transform_diff(&left, &right).is_some());
        assert!(transform_diff(&right, &left).is_some());
    }

    #[test]
    fn test_overlap_and_containment_are_none() {
        assert!(transform_diff(&Diff::new(2, 6, ""), &Diff::new(4, 8, "")).is_none());
        assert!(transform_diff(&Diff::new(3, 4, "x"), &Diff::new(0, 10, "")).is_none());
        assert!(transform_diff(&Diff::new(0, 10, ""), &Diff::new(3, 4, "x")).is_none());
    }

    #[test]
    fn test_undeclared_delete_length_is_not_subtracted() {
        let diff = Diff::insertion(10, "x");
        let other = Diff {
            from: 0,
            to: 4,
            insert: "ab".into(),
            delete_length: None,
        };
        assert_eq!(transform_diff(&diff, &other).unwrap().from, 12);
    }

    proptest! {
        #[test]
        fn prop_shift_matches_length_delta(
            other_from in 0usize..20,
            other_span in 0usize..10,
            insert in "[a-z]{0,8}",
            gap in 0usize..10,
            span in 0usize..5,
        ) {
            let other = Diff::new(other_from, other_from + other_span, insert.clone());
            let diff = Diff::new(other.to + gap, other.to + gap + span, "k");
            let out = transform_diff(&diff, &other).unwrap();
            let expected = diff.from as isize + insert.chars().count() as isize - other_span as isize;
            prop_assert_eq!(out.from as isize, expected);
            prop_assert_eq!(out.to - out.from, diff.to - diff.from);
        }
    }
}
