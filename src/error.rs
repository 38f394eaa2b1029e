//! Error types for collaborative text synchronization.
//!
//! Conflicting edits are *not* errors: they are reported through
//! [`ConflictInfo`](crate::types::ConflictInfo). The variants below cover
//! structurally invalid input and broken session plumbing only.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised by the synchronization core.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A diff range does not fit the text it is applied to.
    #[error("invalid diff range {from}..{to} for text of length {len}")]
    InvalidDiffRange {
        /// Start of the replaced range
        from: usize,
        /// End of the replaced range (exclusive)
        to: usize,
        /// Length of the target text in characters
        len: usize,
    },

    /// A timestamp could not be normalized to an epoch value.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A remote change skipped or replayed a sequence number.
    #[error("out-of-order change from {user_id}: expected seq {expected}, got {got}")]
    OutOfOrder {
        /// Sender of the change
        user_id: String,
        /// Next sequence number we were waiting for
        expected: u64,
        /// Sequence number actually received
        got: u64,
    },

    /// A wire message is missing the fields its kind requires.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Room lookup failed.
    #[error("unknown room: {0}")]
    UnknownRoom(String),

    /// User lookup within a room failed.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// The room reached its configured member limit.
    #[error("room is full: {0}")]
    RoomFull(String),

    /// The outbound channel has no receiver anymore.
    #[error("outbound channel closed")]
    ChannelClosed,

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Whether the caller should recover by requesting a full snapshot.
    ///
    /// Range and ordering failures mean the local shadow no longer matches the
    /// sender's base text; replaying the full document re-aligns both sides.
    pub fn needs_resync(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidDiffRange { .. } | SyncError::OutOfOrder { .. }
        )
    }
}
