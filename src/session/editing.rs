//! Per-editor document state: visible text, shadow, and the pending diff slot.

use super::config::SessionConfig;
use crate::diff::{apply_diff, calculate_diff, can_apply_diff, char_len, should_send_full_code_with_ratio};
use crate::error::{Result, SyncError};
use crate::merge::{resolve_conflict, CONFLICT_MESSAGE};
use crate::protocol::{ChangePayload, CodeChange};
use crate::types::{ConflictInfo, Diff};
use chrono::Utc;
use std::collections::HashMap;

/// Result of applying a remote change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOutcome {
    /// Visible document after the change
    pub document: String,
    /// How the pending local diff fared
    pub conflict: ConflictInfo,
}

/// The state one editor keeps about a shared document.
///
/// - `document` is what the user sees.
/// - `shadow` is the text last agreed with peers: the implicit base of every
///   remote diff and of the next outbound diff.
/// - the pending slot holds `shadow → document` as a single diff. Each local
///   edit overwrites it; sending or a remote conflict clears it.
///
/// Remote diffs are applied to the shadow. A disjoint pending diff is rebased
/// over them and re-applied to give the new document, so the rebased diff is
/// both the new pending diff and the local view. Overlapping diffs resolve
/// remote-wins.
///
/// # Invariants
///
/// - `apply_diff(shadow, pending) == document` whenever a diff is pending
/// - `shadow == document` when nothing is pending
/// - sequence numbers from each sender increase by exactly one
///
/// # Examples
///
/// ```
/// use codesync::session::EditingSession;
/// use codesync::protocol::CodeChange;
/// use codesync::Diff;
///
/// let mut session = EditingSession::new("hello");
/// session.local_edit("hello!");
///
/// // A peer prepends text concurrently.
/// let remote = CodeChange::from_diff(&Diff::insertion(0, ">> "));
/// let outcome = session.apply_remote(&remote).unwrap();
/// assert_eq!(outcome.document, ">> hello!");
///
/// // The pending local diff was rebased past the remote insert.
/// assert_eq!(session.pending().unwrap().from, 8);
/// ```
#[derive(Debug, Clone)]
pub struct EditingSession {
    document: String,
    shadow: String,
    pending: Option<Diff>,
    next_seq: u64,
    remote_seqs: HashMap<String, u64>,
    config: SessionConfig,
}

impl EditingSession {
    /// Session starting from `initial` with default configuration.
    pub fn new(initial: impl Into<String>) -> Self {
        Self::with_config(initial, SessionConfig::default())
    }

    /// Session starting from `initial`.
    pub fn with_config(initial: impl Into<String>, config: SessionConfig) -> Self {
        let initial = initial.into();
        EditingSession {
            shadow: initial.clone(),
            document: initial,
            pending: None,
            next_seq: 1,
            remote_seqs: HashMap::new(),
            config,
        }
    }

    /// Visible document.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Last text agreed with peers.
    pub fn shadow(&self) -> &str {
        &self.shadow
    }

    /// Diff not yet sent.
    pub fn pending(&self) -> Option<&Diff> {
        self.pending.as_ref()
    }

    /// Configuration in use.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Record a local edit and return the incremental change it made.
    ///
    /// The pending slot is recomputed against the shadow, so several edits
    /// made before a flush collapse into one diff.
    pub fn local_edit(&mut self, new_text: impl Into<String>) -> Option<Diff> {
        let new_text = new_text.into();
        let edit = calculate_diff(&self.document, &new_text)?;
        self.document = new_text;
        self.pending = calculate_diff(&self.shadow, &self.document);

        if self.config.enable_logging {
            tracing::debug!(
                "local edit {}..{} (+{} chars), pending: {}",
                edit.from,
                edit.to,
                edit.insert_len(),
                self.pending.is_some()
            );
        }
        Some(edit)
    }

    /// Consume the pending slot as an outbound change.
    ///
    /// Large edits are sent as a full snapshot. Either way the change is
    /// stamped with the next sequence number and the current time, and the
    /// shadow advances to the document.
    pub fn take_outbound(&mut self) -> Option<CodeChange> {
        let diff = self.pending.take()?;

        let send_full = should_send_full_code_with_ratio(
            Some(&diff),
            char_len(&self.document),
            self.config.full_code_ratio,
        );
        let change = if send_full {
            CodeChange::full(self.document.clone(), Some(diff.from + diff.insert_len()))
        } else {
            CodeChange::from_diff(&diff)
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.shadow.clone_from(&self.document);

        if self.config.enable_logging {
            tracing::debug!("outbound change seq={} full={}", seq, send_full);
        }
        Some(change.with_seq(seq).with_timestamp(Utc::now()))
    }

    /// Apply a change received from a peer.
    ///
    /// # Errors
    ///
    /// - [`SyncError::MalformedMessage`] for a change without usable payload
    /// - [`SyncError::OutOfOrder`] when the sender skipped or replayed a sequence number
    /// - [`SyncError::InvalidDiffRange`] when the diff does not fit the shadow
    ///
    /// The session is unchanged on error. The last two mean the sides have
    /// diverged; recover with [`EditingSession::resync`].
    pub fn apply_remote(&mut self, change: &CodeChange) -> Result<RemoteOutcome> {
        match change.payload()? {
            ChangePayload::Full { code, .. } => Ok(self.apply_remote_snapshot(change, code)),
            ChangePayload::Diff(remote) => self.apply_remote_diff(change, remote),
        }
    }

    fn apply_remote_snapshot(&mut self, change: &CodeChange, code: String) -> RemoteOutcome {
        // A snapshot re-baselines the sender's sequence.
        if let (Some(user_id), Some(seq)) = (&change.user_id, change.seq) {
            self.remote_seqs.insert(user_id.clone(), seq);
        }

        let conflict = match self.pending.take() {
            Some(dropped) => {
                tracing::warn!(
                    "remote snapshot replaced pending local diff {}..{}",
                    dropped.from,
                    dropped.to
                );
                ConflictInfo::conflict(CONFLICT_MESSAGE)
            }
            None => accepted(),
        };

        self.shadow = code;
        self.document.clone_from(&self.shadow);
        RemoteOutcome {
            document: self.document.clone(),
            conflict,
        }
    }

    fn apply_remote_diff(&mut self, change: &CodeChange, remote: Diff) -> Result<RemoteOutcome> {
        let seen = self.check_seq(change)?;

        if !can_apply_diff(&self.shadow, &remote) {
            return Err(SyncError::InvalidDiffRange {
                from: remote.from,
                to: remote.to,
                len: char_len(&self.shadow),
            });
        }

        let info = resolve_conflict(self.pending.as_ref(), &remote);
        let shadow = apply_diff(&self.shadow, &remote)?;

        let (document, pending, conflict) = match (&self.pending, info.resolved_diff.clone()) {
            (None, _) => (shadow.clone(), None, info),
            (Some(_), Some(rebased)) => {
                let document = apply_diff(&shadow, &rebased)?;
                (document, Some(rebased), info)
            }
            (Some(dropped), None) => {
                tracing::warn!(
                    "conflicting edits: local {}..{} overlaps remote {}..{}, remote wins",
                    dropped.from,
                    dropped.to,
                    remote.from,
                    remote.to
                );
                (shadow.clone(), None, info)
            }
        };

        self.shadow = shadow;
        self.document = document;
        self.pending = pending;
        if let Some((user_id, seq)) = seen {
            self.remote_seqs.insert(user_id, seq);
        }

        if self.config.enable_logging {
            tracing::debug!(
                "applied remote diff {}..{} conflict={}",
                remote.from,
                remote.to,
                conflict.has_conflict
            );
        }
        Ok(RemoteOutcome {
            document: self.document.clone(),
            conflict,
        })
    }

    /// Replace all state with an authoritative snapshot.
    ///
    /// Drops the pending diff and forgets every sender's sequence number.
    pub fn resync(&mut self, snapshot: impl Into<String>) {
        self.shadow = snapshot.into();
        self.document.clone_from(&self.shadow);
        self.pending = None;
        self.remote_seqs.clear();
        tracing::info!("session resynced ({} chars)", char_len(&self.document));
    }

    fn check_seq(&self, change: &CodeChange) -> Result<Option<(String, u64)>> {
        let (Some(user_id), Some(seq)) = (&change.user_id, change.seq) else {
            return Ok(None);
        };
        if let Some(last) = self.remote_seqs.get(user_id) {
            let expected = last + 1;
            if seq != expected {
                return Err(SyncError::OutOfOrder {
                    user_id: user_id.clone(),
                    expected,
                    got: seq,
                });
            }
        }
        Ok(Some((user_id.clone(), seq)))
    }
}

fn accepted() -> ConflictInfo {
    ConflictInfo {
        has_conflict: false,
        can_resolve: true,
        resolved_diff: None,
        message: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(diff: Diff, user: &str, seq: u64) -> CodeChange {
        CodeChange::from_diff(&diff).with_user(user).with_seq(seq)
    }

    #[test]
    fn test_local_edits_coalesce_into_pending() {
        let mut session = EditingSession::new("fn main() {}");
        session.local_edit("fn main() { }");
        session.local_edit("fn main() { x }");
        assert_eq!(session.pending(), Some(&Diff::insertion(11, " x ")));
        assert_eq!(session.shadow(), "fn main() {}");
    }

    #[test]
    fn test_noop_edit_returns_none() {
        let mut session = EditingSession::new("abc");
        assert!(session.local_edit("abc").is_none());
        assert!(session.pending().is_none());
    }

    #[test]
    fn test_edit_back_to_shadow_clears_pending() {
        let mut session = EditingSession::new("abc");
        session.local_edit("abcd");
        session.local_edit("abc");
        assert!(session.pending().is_none());
    }

    #[test]
    fn test_take_outbound_advances_shadow() {
        let mut session = EditingSession::new("hello world, this is long");
        session.local_edit("hello there, this is long");

        let change = session.take_outbound().unwrap();
        assert_eq!(change.as_diff(), Some(Diff::new(6, 11, "there")));
        assert_eq!(change.seq, Some(1));
        assert!(change.timestamp.is_some());
        assert_eq!(session.shadow(), session.document());
        assert!(session.take_outbound().is_none());
    }

    #[test]
    fn test_take_outbound_sends_full_code_for_large_edit() {
        let mut session = EditingSession::new("ab");
        session.local_edit("a completely new document");
        let change = session.take_outbound().unwrap();
        assert_eq!(change.code.as_deref(), Some("a completely new document"));
        assert!(change.from_pos.is_none());
    }

    #[test]
    fn test_remote_without_pending_applies_directly() {
        let mut session = EditingSession::new("hello");
        let outcome = session
            .apply_remote(&CodeChange::from_diff(&Diff::insertion(5, " world")))
            .unwrap();
        assert_eq!(outcome.document, "hello world");
        assert!(!outcome.conflict.has_conflict);
        assert_eq!(session.shadow(), "hello world");
    }

    #[test]
    fn test_remote_after_pending_keeps_local_position() {
        let mut session = EditingSession::new("0123456789");
        session.local_edit("01X23456789");
        let outcome = session
            .apply_remote(&CodeChange::from_diff(&Diff::new(6, 8, "")))
            .unwrap();
        assert_eq!(outcome.document, "01X234589");
        assert_eq!(session.pending(), Some(&Diff::insertion(2, "X")));
    }

    #[test]
    fn test_overlap_remote_wins() {
        let mut session = EditingSession::new("hello world");
        session.local_edit("hello there");
        let outcome = session
            .apply_remote(&CodeChange::from_diff(&Diff::new(6, 11, "earth")))
            .unwrap();
        assert!(outcome.conflict.has_conflict);
        assert_eq!(outcome.conflict.message.as_deref(), Some(CONFLICT_MESSAGE));
        assert_eq!(outcome.document, "hello earth");
        assert!(session.pending().is_none());
    }

    #[test]
    fn test_remote_snapshot_discards_pending() {
        let mut session = EditingSession::new("abc");
        session.local_edit("abcd");
        let outcome = session.apply_remote(&CodeChange::full("xyz", None)).unwrap();
        assert!(outcome.conflict.has_conflict);
        assert_eq!(session.document(), "xyz");
        assert_eq!(session.shadow(), "xyz");
    }

    #[test]
    fn test_out_of_range_remote_is_rejected_without_change() {
        let mut session = EditingSession::new("abc");
        session.local_edit("abcd");
        let err = session
            .apply_remote(&CodeChange::from_diff(&Diff::new(2, 9, "")))
            .unwrap_err();
        assert!(err.needs_resync());
        assert_eq!(session.document(), "abcd");
        assert!(session.pending().is_some());
    }

    #[test]
    fn test_sequence_gap_is_rejected() {
        let mut session = EditingSession::new("");
        session.apply_remote(&remote(Diff::insertion(0, "a"), "bob", 7)).unwrap();
        session.apply_remote(&remote(Diff::insertion(1, "b"), "bob", 8)).unwrap();

        let err = session
            .apply_remote(&remote(Diff::insertion(2, "c"), "bob", 10))
            .unwrap_err();
        assert!(matches!(err, SyncError::OutOfOrder { expected: 9, got: 10, .. }));
        assert_eq!(session.document(), "ab");

        // Other senders are tracked separately.
        session.apply_remote(&remote(Diff::insertion(2, "z"), "eve", 1)).unwrap();
        assert_eq!(session.document(), "abz");
    }

    #[test]
    fn test_resync_resets_sequences() {
        let mut session = EditingSession::new("");
        session.apply_remote(&remote(Diff::insertion(0, "a"), "bob", 1)).unwrap();
        session.resync("fresh");
        session.apply_remote(&remote(Diff::insertion(5, "!"), "bob", 40)).unwrap();
        assert_eq!(session.document(), "fresh!");
    }

    #[test]
    fn test_mismatched_delete_length_is_rejected_without_change() {
        let mut session = EditingSession::new("0123456789abc");
        session.local_edit("0123456789X abc");

        let change = CodeChange {
            from_pos: Some(0),
            to_pos: Some(4),
            insert: Some("ab".into()),
            delete_length: Some(1),
            ..Default::default()
        };
        let err = session.apply_remote(&change).unwrap_err();
        assert!(matches!(err, SyncError::MalformedMessage(_)));
        assert_eq!(session.document(), "0123456789X abc");

        let honest = CodeChange::from_diff(&Diff::new(0, 4, "ab"));
        assert_eq!(session.apply_remote(&honest).unwrap().document, "ab456789X abc");
    }
}
