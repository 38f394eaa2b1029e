//! Protocol constants and tuning defaults.

/// Message `type` discriminators as they appear on the wire.
pub mod message_types {
    /// Client announces itself to a room
    pub const JOIN: &str = "join";
    /// Client leaves a room
    pub const LEAVE: &str = "leave";
    /// Document edit (diff or full snapshot)
    pub const CODE_CHANGE: &str = "code_change";
    /// Cursor moved
    pub const CURSOR_CHANGE: &str = "cursor_change";
    /// Another member joined
    pub const USER_JOINED: &str = "user_joined";
    /// Another member left
    pub const USER_LEFT: &str = "user_left";
    /// Error report
    pub const ERROR: &str = "error";
}

/// Edits touching more than this share of the document are sent in full.
pub const FULL_CODE_RATIO: f64 = 0.5;

/// Throttle window for small code changes, in milliseconds.
pub const CODE_THROTTLE_MS: u64 = 100;

/// Throttle window for cursor moves, in milliseconds.
pub const CURSOR_THROTTLE_MS: u64 = 200;

/// Quiet period before a large edit is flushed, in milliseconds.
pub const LARGE_EDIT_DEBOUNCE_MS: u64 = 300;

/// Edits larger than this many characters bypass the throttle and are debounced.
pub const LARGE_EDIT_THRESHOLD: usize = 100;

/// Username used when a join message does not carry one.
pub const DEFAULT_USERNAME: &str = "Anonymous";
