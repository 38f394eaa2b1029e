//! Merge algorithms for concurrent edits to the same document.
//!
//! Two editors may change the same snapshot at once. This module decides what
//! happens when one of those edits reaches the other side.
//!
//! # Strategies
//!
//! | Strategy | Entry point | Behaviour |
//! |----------|-------------|-----------|
//! | Operational transform | [`resolve_conflict`] | Rebase a pending local diff over a remote diff when the ranges are disjoint; report a conflict otherwise |
//! | Last-write-wins | [`resolve_with_lww`] | Keep whichever diff carries the later timestamp |
//!
//! The two strategies are independent alternatives. When the transform
//! reports an overlap, callers fall back to remote-wins: drop the local
//! pending diff, apply the remote one, and tell the user.
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConflictInfo`](crate::types::ConflictInfo) | Result of [`resolve_conflict`] |
//! | [`Timestamp`] | Inputs accepted by [`resolve_with_lww`] |
//!
//! # Examples
//!
//! ## Disjoint edits
//!
//! ```
//! use codesync::Diff;
//! use codesync::merge::resolve_conflict;
//!
//! // Local user typed at the end, remote user inserted at the start.
//! let local = Diff::insertion(10, "!");
//! let remote = Diff::insertion(0, ">> ");
//!
//! let info = resolve_conflict(Some(&local), &remote);
//! assert!(!info.has_conflict);
//! assert_eq!(info.resolved_diff.unwrap().from, 13);
//! ```
//!
//! ## Overlapping edits
//!
//! ```
//! use codesync::Diff;
//! use codesync::merge::{has_conflict, resolve_conflict};
//!
//! let local = Diff::new(2, 6, "xx");
//! let remote = Diff::new(4, 8, "yy");
//!
//! assert!(has_conflict(&local, &remote));
//! assert!(resolve_conflict(Some(&local), &remote).has_conflict);
//! ```

mod conflict;
mod lww;
mod transform;

pub use conflict::{has_conflict, resolve_conflict, CONFLICT_MESSAGE};
pub use lww::{resolve_with_lww, Timestamp};
pub use transform::transform_diff;
