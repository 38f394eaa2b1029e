//! Editing sessions: the state one editor keeps about a shared document.
//!
//! # Module Organization
//!
//! ```text
//! session/
//! ├── editing - EditingSession: document, shadow, pending slot, sequence checks
//! ├── emitter - ChangeEmitter: rate-limited outbound messages
//! └── config  - SessionConfig and ReconnectPolicy
//! ```
//!
//! # Data Flow
//!
//! 1. The editor reports new text; the session diffs it against the shadow
//!    and stores the result in the pending slot.
//! 2. The emitter's throttle or debounce fires and sends the pending slot as
//!    a `code_change` message (diff or full snapshot).
//! 3. Incoming `code_change` messages are applied to the shadow, and a
//!    disjoint pending diff is rebased over them. Overlaps resolve remote-wins.
//!
//! All state lives in the session instance. Nothing is global, so any number
//! of sessions can run side by side.

mod config;
mod editing;
mod emitter;

pub use config::{ReconnectPolicy, SessionConfig};
pub use editing::{EditingSession, RemoteOutcome};
pub use emitter::ChangeEmitter;
