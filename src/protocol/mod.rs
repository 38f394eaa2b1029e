//! Wire protocol: message types and shared constants.
//!
//! The transport itself is opaque to this crate. Anything that can carry a
//! JSON text frame (a WebSocket, a channel, a test harness) can move
//! [`Message`] values between editors and the [relay](crate::relay).
//!
//! Diffs travel with their range fields renamed to `from_pos` / `to_pos`, and
//! snapshots travel as a plain `code` string.

pub mod constants;
mod messages;

pub use messages::{ChangePayload, CodeChange, CursorChange, Message};
