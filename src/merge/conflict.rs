//! Conflict detection and transform-based resolution.

use super::transform::transform_diff;
use crate::types::{ConflictInfo, Diff};

/// Note attached to an unresolvable conflict.
pub const CONFLICT_MESSAGE: &str = "Changes overlap. The remote change will be applied.";

/// Whether two diffs touch at least one common character position.
///
/// Symmetric. Adjacent ranges (`a.to == b.from`) do not conflict.
pub fn has_conflict(diff1: &Diff, diff2: &Diff) -> bool {
    !(diff1.to <= diff2.from || diff2.to <= diff1.from)
}

/// Reconcile a pending local diff with an incoming remote diff.
///
/// - No pending diff: the remote diff is returned as-is.
/// - Disjoint ranges: `resolved_diff` is the *local* diff rebased onto the
///   document with `remote_diff` applied. It is what should still be sent
///   (and kept as the pending diff), not what merges the remote change.
/// - Overlap: `has_conflict` is set and no diff is produced. Callers drop the
///   local diff and apply `remote_diff`.
pub fn resolve_conflict(local_diff: Option<&Diff>, remote_diff: &Diff) -> ConflictInfo {
    let Some(local) = local_diff else {
        return ConflictInfo::resolved(remote_diff.clone());
    };

    match transform_diff(local, remote_diff) {
        Some(rebased) => ConflictInfo::resolved(rebased),
        None => ConflictInfo::conflict(CONFLICT_MESSAGE),
    }
}
