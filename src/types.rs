//! Core data types shared by the diff, merge and session layers.
//!
//! All positions are counted in Unicode scalar values (`char`s), never bytes,
//! so a [`Diff`] computed on one peer addresses the same characters on another
//! regardless of how either side stores its text.

use serde::{Deserialize, Serialize};

/// A single contiguous replace-range edit.
///
/// Replaces the half-open character range `[from, to)` of an implicit base
/// snapshot with `insert`. A `Diff` is meaningless without that base.
///
/// `delete_length` is an informational cache of `to - from`, present only when
/// the edit removes characters. On the wire the range fields are named
/// `from_pos` / `to_pos`.
///
/// # Examples
///
/// ```
/// use codesync::Diff;
///
/// let diff = Diff::new(5, 11, "");
/// assert_eq!(diff.delete_length, Some(6));
///
/// let insert = Diff::insertion(5, " world");
/// assert_eq!(insert.delete_length, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diff {
    /// Start of the replaced range
    #[serde(rename = "from_pos")]
    pub from: usize,
    /// End of the replaced range (exclusive)
    #[serde(rename = "to_pos")]
    pub to: usize,
    /// Replacement text
    pub insert: String,
    /// Number of characters removed, when non-zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_length: Option<usize>,
}

impl Diff {
    /// Create a diff, filling `delete_length` from the range.
    pub fn new(from: usize, to: usize, insert: impl Into<String>) -> Self {
        let removed = to.saturating_sub(from);
        Diff {
            from,
            to,
            insert: insert.into(),
            delete_length: (removed > 0).then_some(removed),
        }
    }

    /// Pure insertion at `pos`.
    pub fn insertion(pos: usize, text: impl Into<String>) -> Self {
        Self::new(pos, pos, text)
    }

    /// Pure deletion of `[from, to)`.
    pub fn deletion(from: usize, to: usize) -> Self {
        Self::new(from, to, "")
    }

    /// Length of `insert` in characters.
    pub fn insert_len(&self) -> usize {
        self.insert.chars().count()
    }

    /// Deleted character count as declared by the diff (`delete_length` or 0).
    pub fn declared_delete_len(&self) -> usize {
        self.delete_length.unwrap_or(0)
    }

    /// How much the document grows (positive) or shrinks (negative) when this
    /// diff is applied, based on the declared delete length.
    pub fn length_delta(&self) -> isize {
        self.insert_len() as isize - self.declared_delete_len() as isize
    }

    /// Whether the range end precedes its start.
    pub fn is_inverted(&self) -> bool {
        self.to < self.from
    }
}

/// Outcome of reconciling a pending local diff with an incoming remote diff.
///
/// Transient: produced by [`resolve_conflict`](crate::merge::resolve_conflict)
/// and consumed by the caller straight away.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictInfo {
    /// The two edits overlap
    pub has_conflict: bool,
    /// A usable diff was produced
    pub can_resolve: bool,
    /// Remote diff (no local work) or the rebased local diff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_diff: Option<Diff>,
    /// Human-readable note for the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConflictInfo {
    /// A clean resolution carrying `diff`.
    pub fn resolved(diff: Diff) -> Self {
        ConflictInfo {
            has_conflict: false,
            can_resolve: true,
            resolved_diff: Some(diff),
            message: None,
        }
    }

    /// An irreconcilable overlap.
    pub fn conflict(message: impl Into<String>) -> Self {
        ConflictInfo {
            has_conflict: true,
            can_resolve: false,
            resolved_diff: None,
            message: Some(message.into()),
        }
    }
}

/// Cursor location shared with other editors. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorPosition {
    /// Line number (1-indexed)
    pub line: u32,
    /// Column (0-indexed)
    pub column: u32,
}
