//! Wire messages exchanged between editors and the relay.
//!
//! Every message is a JSON object tagged by its `type` field:
//!
//! | `type` | Direction | Payload |
//! |--------|-----------|---------|
//! | `join` | client → relay | `username` |
//! | `leave` | client → relay | none |
//! | `code_change` | both | diff fields or a full `code` snapshot |
//! | `cursor_change` | both | `line`, `column` |
//! | `user_joined` | relay → client | `user_id`, `username` |
//! | `user_left` | relay → client | `user_id` |
//! | `error` | relay → client | `message` |
//!
//! # Examples
//!
//! ```
//! use codesync::protocol::{Message, CodeChange};
//! use codesync::Diff;
//!
//! let msg = Message::CodeChange(CodeChange::from_diff(&Diff::insertion(5, " world")));
//! let json = msg.to_json().unwrap();
//! assert!(json.contains(r#""type":"code_change""#));
//! assert!(json.contains(r#""from_pos":5"#));
//!
//! assert_eq!(Message::from_json(&json).unwrap(), msg);
//! ```

use super::constants::{message_types, DEFAULT_USERNAME};
use crate::error::{Result, SyncError};
use crate::types::{CursorPosition, Diff};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every message kind understood by the protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Announce a user to a room
    Join {
        /// Display name
        #[serde(default = "default_username")]
        username: String,
    },
    /// Leave the current room
    Leave,
    /// Document edit
    CodeChange(CodeChange),
    /// Cursor moved
    CursorChange(CursorChange),
    /// A member joined the room
    UserJoined {
        /// Relay-assigned id of the new member
        user_id: String,
        /// Display name of the new member
        username: String,
    },
    /// A member left the room
    UserLeft {
        /// Id of the departed member
        user_id: String,
    },
    /// Error report
    Error {
        /// Human-readable description
        message: String,
    },
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

impl Message {
    /// Wire discriminator of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Join { .. } => message_types::JOIN,
            Message::Leave => message_types::LEAVE,
            Message::CodeChange(_) => message_types::CODE_CHANGE,
            Message::CursorChange(_) => message_types::CURSOR_CHANGE,
            Message::UserJoined { .. } => message_types::USER_JOINED,
            Message::UserLeft { .. } => message_types::USER_LEFT,
            Message::Error { .. } => message_types::ERROR,
        }
    }

    /// Build an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Message::Error {
            message: message.into(),
        }
    }

    /// Encode as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from a JSON string.
    ///
    /// Unknown `type` values and missing required fields are errors.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// What a [`CodeChange`] carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangePayload {
    /// Incremental edit against the sender's shadow
    Diff(Diff),
    /// Whole document
    Full {
        /// Complete document text
        code: String,
        /// Sender's cursor offset, if known
        cursor_position: Option<usize>,
    },
}

/// A document edit, either as diff fields or as a full `code` snapshot.
///
/// When `code` is present the message is a snapshot, even if diff fields are
/// also set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CodeChange {
    /// Full document (snapshot form)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Sender's cursor offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_position: Option<usize>,
    /// Sender id, stamped by the relay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Diff start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_pos: Option<usize>,
    /// Diff end (exclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_pos: Option<usize>,
    /// Diff replacement text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert: Option<String>,
    /// Declared deleted length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_length: Option<usize>,
    /// When the edit was made
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Per-sender sequence number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl CodeChange {
    /// Diff-form change.
    pub fn from_diff(diff: &Diff) -> Self {
        CodeChange {
            from_pos: Some(diff.from),
            to_pos: Some(diff.to),
            insert: Some(diff.insert.clone()),
            delete_length: diff.delete_length,
            ..Default::default()
        }
    }

    /// Snapshot-form change.
    pub fn full(code: impl Into<String>, cursor_position: Option<usize>) -> Self {
        CodeChange {
            code: Some(code.into()),
            cursor_position,
            ..Default::default()
        }
    }

    /// Set the sender id.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the edit time.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the sequence number.
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = Some(seq);
        self
    }

    /// The diff fields, if all present and forming a forward range.
    ///
    /// A `delete_length` that disagrees with `to_pos - from_pos` makes the
    /// diff unusable: rebasing trusts the declared length.
    pub fn as_diff(&self) -> Option<Diff> {
        match (self.from_pos, self.to_pos, &self.insert) {
            (Some(from), Some(to), Some(insert))
                if from <= to && self.delete_length.map_or(true, |n| n == to - from) =>
            {
                Some(Diff {
                    from,
                    to,
                    insert: insert.clone(),
                    delete_length: self.delete_length,
                })
            }
            _ => None,
        }
    }

    /// Whether any diff field is set.
    fn has_diff_fields(&self) -> bool {
        self.from_pos.is_some() || self.to_pos.is_some() || self.insert.is_some()
    }

    /// Classify the change.
    ///
    /// # Errors
    ///
    /// [`SyncError::MalformedMessage`] when there is neither a usable diff nor
    /// a `code` snapshot.
    pub fn payload(&self) -> Result<ChangePayload> {
        if let Some(code) = &self.code {
            return Ok(ChangePayload::Full {
                code: code.clone(),
                cursor_position: self.cursor_position,
            });
        }
        self.as_diff().map(ChangePayload::Diff).ok_or_else(|| {
            SyncError::MalformedMessage(
                "code_change needs from_pos <= to_pos with insert, or code".to_string(),
            )
        })
    }

    /// Drop unusable diff fields when a snapshot can stand in for them.
    ///
    /// A change with a full `code` keeps only the snapshot. A diff-only change
    /// must be well-formed.
    pub fn normalized(mut self) -> Result<Self> {
        if self.code.is_some() {
            if self.has_diff_fields() {
                self.from_pos = None;
                self.to_pos = None;
                self.insert = None;
                self.delete_length = None;
            }
            return Ok(self);
        }
        self.payload()?;
        Ok(self)
    }
}

/// Cursor position broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorChange {
    /// Line number (1-indexed)
    pub line: u32,
    /// Column (0-indexed)
    pub column: u32,
    /// Sender id, stamped by the relay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl CursorChange {
    /// Cursor change without a sender id.
    pub fn new(position: CursorPosition) -> Self {
        CursorChange {
            line: position.line,
            column: position.column,
            user_id: None,
        }
    }

    /// The position carried.
    pub fn position(&self) -> CursorPosition {
        CursorPosition {
            line: self.line,
            column: self.column,
        }
    }

    /// Lines start at 1.
    pub fn validate(&self) -> Result<()> {
        if self.line == 0 {
            return Err(SyncError::MalformedMessage(
                "cursor_change line must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
