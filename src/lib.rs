#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Codesync: collaborative plain-text synchronization
//!
//! Building blocks for keeping several editors of one plain-text document in
//! step over a message channel.
//!
//! ## Overview
//!
//! The crate is layered:
//!
//! 1. **Diffs** - describe an edit as one replaced character range
//! 2. **Merge** - transform concurrent diffs, detect overlaps, last-writer-wins
//! 3. **Rate control** - throttle and debounce outbound traffic
//! 4. **Sessions** - per-editor state tying the above to wire messages
//! 5. **Relay** - in-process rooms that fan messages out to other members
//!
//! Positions everywhere are character (Unicode scalar value) offsets, not
//! bytes.
//!
//! ## Diffs and merging
//!
//! ```
//! use codesync::{apply_diff, calculate_diff, resolve_conflict, Diff};
//!
//! let diff = calculate_diff("hello", "hello world").unwrap();
//! assert_eq!(diff, Diff::insertion(5, " world"));
//! assert_eq!(apply_diff("hello", &diff).unwrap(), "hello world");
//!
//! // A concurrent remote insert earlier in the text shifts the local diff.
//! let remote = Diff::insertion(0, ">> ");
//! let info = resolve_conflict(Some(&diff), &remote);
//! assert!(!info.has_conflict);
//! assert_eq!(info.resolved_diff.unwrap().from, 8);
//! ```
//!
//! ## Editing sessions
//!
//! ```
//! use codesync::EditingSession;
//!
//! let mut alice = EditingSession::new("fn main() {}");
//! let mut bob = EditingSession::new("fn main() {}");
//!
//! alice.local_edit("fn main() { run(); }");
//! let change = alice.take_outbound().unwrap();
//!
//! let outcome = bob.apply_remote(&change).unwrap();
//! assert_eq!(outcome.document, alice.document());
//! ```
//!
//! ## Module Structure
//!
//! - **[types]** - Diff, ConflictInfo, CursorPosition
//! - **[error]** - Error types and result handling
//! - **[diff]** - Computing, applying and sizing diffs
//! - **[merge]** - Operational transform and conflict resolution
//! - **[rate]** - Throttle and debounce on the Tokio timer
//! - **[protocol]** - Wire messages and protocol constants
//! - **[session]** - Editing sessions and rate-limited change emission
//! - **[relay]** - Room registry and message fan-out

pub mod diff;
pub mod error;
pub mod merge;
pub mod protocol;
pub mod rate;
pub mod relay;
pub mod session;
pub mod types;

pub use diff::{apply_diff, calculate_diff, can_apply_diff, should_send_full_code};
pub use error::{Result, SyncError};
pub use merge::{has_conflict, resolve_conflict, resolve_with_lww, transform_diff, Timestamp};
pub use protocol::{CodeChange, CursorChange, Message};
pub use rate::{debounce, throttle, throttle_with_options, Debounce, Throttle, ThrottleOptions};
pub use relay::{RelayConfig, RoomHub, RoomSubscription};
pub use session::{ChangeEmitter, EditingSession, ReconnectPolicy, SessionConfig};
pub use types::{ConflictInfo, CursorPosition, Diff};
