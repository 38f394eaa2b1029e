//! Diff engine: compute, validate and apply single-hunk text diffs.
//!
//! Diffs are computed by trimming the longest common prefix and the longest
//! common suffix of two snapshots. The middle section is the one replaced
//! range. This captures keystrokes, deletions, replacements and pastes
//! exactly; edits spread over several regions collapse into one larger hunk.
//!
//! # Examples
//!
//! ```
//! use codesync::diff::{apply_diff, calculate_diff};
//!
//! let diff = calculate_diff("hello", "hello world").unwrap();
//! assert_eq!((diff.from, diff.to, diff.insert.as_str()), (5, 5, " world"));
//! assert_eq!(apply_diff("hello", &diff).unwrap(), "hello world");
//!
//! assert!(calculate_diff("same", "same").is_none());
//! ```

use crate::error::{Result, SyncError};
use crate::protocol::constants::FULL_CODE_RATIO;
use crate::types::Diff;

/// Length of `text` in characters.
#[inline]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the `char_idx`-th character, or `None` past the end.
fn byte_index(text: &str, char_idx: usize) -> Option<usize> {
    if char_idx == 0 {
        return Some(0);
    }
    match text.char_indices().nth(char_idx) {
        Some((byte, _)) => Some(byte),
        None if char_len(text) == char_idx => Some(text.len()),
        None => None,
    }
}

/// Compute the diff turning `old_text` into `new_text`.
///
/// Returns `None` when both snapshots are identical.
pub fn calculate_diff(old_text: &str, new_text: &str) -> Option<Diff> {
    if old_text == new_text {
        return None;
    }

    let prefix = old_text
        .chars()
        .zip(new_text.chars())
        .take_while(|(a, b)| a == b)
        .count();

    let old_len = char_len(old_text);
    let new_len = char_len(new_text);

    // The suffix may not reach back into the prefix of either string.
    let max_suffix = (old_len - prefix).min(new_len - prefix);
    let suffix = old_text
        .chars()
        .rev()
        .zip(new_text.chars().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let insert: String = new_text
        .chars()
        .skip(prefix)
        .take(new_len - suffix - prefix)
        .collect();

    Some(Diff::new(prefix, old_len - suffix, insert))
}

/// Whether `diff` fits inside `text`.
///
/// Only checks the range. It does not verify that the characters being
/// replaced are the ones the diff's author saw.
pub fn can_apply_diff(text: &str, diff: &Diff) -> bool {
    !diff.is_inverted() && diff.to <= char_len(text)
}

/// Apply `diff` to `text`.
///
/// # Errors
///
/// [`SyncError::InvalidDiffRange`] when the range does not fit `text`.
/// Out-of-range diffs are rejected, never clamped.
pub fn apply_diff(text: &str, diff: &Diff) -> Result<String> {
    let invalid = || SyncError::InvalidDiffRange {
        from: diff.from,
        to: diff.to,
        len: char_len(text),
    };

    if diff.is_inverted() {
        return Err(invalid());
    }
    let start = byte_index(text, diff.from).ok_or_else(invalid)?;
    let end = byte_index(text, diff.to).ok_or_else(invalid)?;

    let mut out = String::with_capacity(text.len() - (end - start) + diff.insert.len());
    out.push_str(&text[..start]);
    out.push_str(&diff.insert);
    out.push_str(&text[end..]);
    Ok(out)
}

/// Whether sending the whole document is preferable to sending `diff`.
///
/// True when the inserted plus declared-deleted characters exceed half of
/// `current_length`. Exactly half is still sent as a diff.
pub fn should_send_full_code(diff: Option<&Diff>, current_length: usize) -> bool {
    should_send_full_code_with_ratio(diff, current_length, FULL_CODE_RATIO)
}

/// [`should_send_full_code`] with a configurable ratio.
pub fn should_send_full_code_with_ratio(
    diff: Option<&Diff>,
    current_length: usize,
    ratio: f64,
) -> bool {
    let Some(diff) = diff else {
        return false;
    };
    let size = diff.insert_len() + diff.declared_delete_len();
    size as f64 > current_length as f64 * ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_simple_insertion() {
        let diff = calculate_diff("hello", "hello world").unwrap();
        assert_eq!(diff, Diff::insertion(5, " world"));
    }

    #[test]
    fn test_deletion() {
        let diff = calculate_diff("hello world", "hello").unwrap();
        assert_eq!(diff.from, 5);
        assert_eq!(diff.to, 11);
        assert_eq!(diff.insert, "");
        assert_eq!(diff.delete_length, Some(6));
    }

    #[test]
    fn test_replacement() {
        let diff = calculate_diff("hello world", "hello there").unwrap();
        assert_eq!(diff, Diff::new(6, 11, "there"));
        assert_eq!(diff.delete_length, Some(5));
    }

    #[test]
    fn test_insert_in_repeated_run() {
        // Prefix takes "aa", suffix is capped so the ranges never cross.
        let diff = calculate_diff("aa", "aaa").unwrap();
        assert_eq!(diff, Diff::insertion(2, "a"));
        assert_eq!(apply_diff("aa", &diff).unwrap(), "aaa");
    }

    #[test]
    fn test_identical_is_none() {
        assert!(calculate_diff("", "").is_none());
        assert!(calculate_diff("abc", "abc").is_none());
    }

    #[test]
    fn test_multibyte_positions_are_chars() {
        let diff = calculate_diff("añb", "añxb").unwrap();
        assert_eq!(diff, Diff::insertion(2, "x"));
        assert_eq!(apply_diff("añb", &diff).unwrap(), "añxb");
    }

    #[test]
    fn test_can_apply_bounds() {
        assert!(can_apply_diff("hello", &Diff::new(0, 5, "")));
        assert!(can_apply_diff("hello", &Diff::insertion(5, "!")));
        assert!(!can_apply_diff("hello", &Diff::new(2, 6, "")));
        let inverted = Diff {
            from: 3,
            to: 1,
            insert: String::new(),
            delete_length: None,
        };
        assert!(!can_apply_diff("hello", &inverted));
    }

    #[test]
    fn test_apply_rejects_out_of_range() {
        let err = apply_diff("abc", &Diff::new(1, 9, "x")).unwrap_err();
        assert!(matches!(err, SyncError::InvalidDiffRange { from: 1, to: 9, len: 3 }));
    }

    #[test]
    fn test_full_code_threshold() {
        let large = Diff {
            from: 0,
            to: 10,
            insert: "a".repeat(60),
            delete_length: None,
        };
        assert!(should_send_full_code(Some(&large), 100));

        let half = Diff {
            from: 0,
            to: 10,
            insert: "a".repeat(50),
            delete_length: None,
        };
        assert!(!should_send_full_code(Some(&half), 100));
        assert!(!should_send_full_code(None, 100));
    }

    proptest! {
        #[test]
        fn prop_round_trip(a in ".{0,24}", b in ".{0,24}") {
            match calculate_diff(&a, &b) {
                Some(diff) => {
                    prop_assert_ne!(&a, &b);
                    prop_assert!(can_apply_diff(&a, &diff));
                    prop_assert_eq!(apply_diff(&a, &diff).unwrap(), b);
                }
                None => prop_assert_eq!(a, b),
            }
        }

        #[test]
        fn prop_noop_is_none(a in ".{0,32}") {
            prop_assert!(calculate_diff(&a, &a).is_none());
        }

        #[test]
        fn prop_rejects_ranges_past_end(text in "[a-z]{0,10}", extra in 1usize..5) {
            let len = char_len(&text);
            let diff = Diff::new(0, len + extra, "");
            prop_assert!(!can_apply_diff(&text, &diff));
        }
    }
}
