//! Rate-controlled outbound change emission for one editor.

use super::config::SessionConfig;
use super::editing::{EditingSession, RemoteOutcome};
use crate::error::{Result, SyncError};
use crate::protocol::{CursorChange, Message};
use crate::rate::{Debounce, Throttle};
use crate::types::{CursorPosition, Diff};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Connects an [`EditingSession`] to an outbound message channel.
///
/// Small edits are flushed through a throttle, edits larger than
/// `large_edit_threshold` through a debounce, and cursor moves through their
/// own throttle. Each flush sends whatever the pending slot holds at that
/// moment, so edits coalesced between flushes go out as one change.
///
/// Timers run on the current Tokio runtime; construct and use the emitter
/// inside one.
///
/// # Examples
///
/// ```
/// use codesync::session::{ChangeEmitter, SessionConfig};
/// use codesync::protocol::Message;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (emitter, mut outbound) = ChangeEmitter::new("hello", SessionConfig::default());
///
/// emitter.on_local_change("hello!"); // first edit leaves immediately
/// match outbound.recv().await {
///     Some(Message::CodeChange(change)) => assert_eq!(change.insert.as_deref(), Some("!")),
///     other => panic!("unexpected {other:?}"),
/// }
/// # }
/// ```
pub struct ChangeEmitter {
    session: Arc<Mutex<EditingSession>>,
    outbound: mpsc::UnboundedSender<Message>,
    code_throttle: Throttle<()>,
    large_edit: Debounce<()>,
    cursor_throttle: Throttle<CursorPosition>,
    large_edit_threshold: usize,
}

impl ChangeEmitter {
    /// Create an emitter and the receiving end of its outbound channel.
    pub fn new(
        initial: impl Into<String>,
        config: SessionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::new(Mutex::new(EditingSession::with_config(initial, config.clone())));

        let code_throttle = Throttle::new(flusher(&session, &tx), config.code_throttle());
        let large_edit = Debounce::new(flusher(&session, &tx), config.large_edit_debounce());

        let cursor_tx = tx.clone();
        let cursor_throttle = Throttle::new(
            move |position: CursorPosition| {
                let message = Message::CursorChange(CursorChange::new(position));
                if cursor_tx.send(message).is_err() {
                    tracing::warn!("outbound channel closed, cursor move dropped");
                }
            },
            config.cursor_throttle(),
        );

        let emitter = ChangeEmitter {
            session,
            outbound: tx,
            code_throttle,
            large_edit,
            cursor_throttle,
            large_edit_threshold: config.large_edit_threshold,
        };
        (emitter, rx)
    }

    /// Record a local edit and schedule its emission.
    ///
    /// A large edit cancels any queued throttle flush and goes through the
    /// debounce. Small edits made while a large one is settling join the
    /// debounce too, so the bulk edit is never sent early.
    ///
    /// Returns the incremental diff, or `None` when the text did not change.
    pub fn on_local_change(&self, text: impl Into<String>) -> Option<Diff> {
        let edit = self.session.lock().local_edit(text)?;

        let size = edit.insert_len() + edit.declared_delete_len();
        if size > self.large_edit_threshold {
            self.code_throttle.cancel();
            self.large_edit.call(());
        } else if self.large_edit.is_pending() {
            self.large_edit.call(());
        } else {
            self.code_throttle.call(());
        }
        Some(edit)
    }

    /// Schedule a cursor broadcast.
    pub fn on_cursor_move(&self, position: CursorPosition) {
        self.cursor_throttle.call(position);
    }

    /// Handle a message from the transport.
    ///
    /// Code changes are merged into the session; other kinds are ignored and
    /// yield `Ok(None)`. When the remote change wins a conflict any queued
    /// flush is cancelled, since the pending diff it would send is gone.
    pub fn on_remote(&self, message: &Message) -> Result<Option<RemoteOutcome>> {
        let Message::CodeChange(change) = message else {
            return Ok(None);
        };

        let outcome = self.session.lock().apply_remote(change)?;
        if outcome.conflict.has_conflict {
            self.code_throttle.cancel();
            self.large_edit.cancel();
        }
        Ok(Some(outcome))
    }

    /// Send the pending diff now, bypassing the rate limits.
    ///
    /// Returns `Ok(false)` when nothing was pending.
    pub fn flush_now(&self) -> Result<bool> {
        self.code_throttle.cancel();
        self.large_edit.cancel();

        let Some(change) = self.session.lock().take_outbound() else {
            return Ok(false);
        };
        self.outbound
            .send(Message::CodeChange(change))
            .map_err(|_| SyncError::ChannelClosed)?;
        Ok(true)
    }

    /// Replace the document with an authoritative snapshot.
    pub fn resync(&self, snapshot: impl Into<String>) {
        self.code_throttle.cancel();
        self.large_edit.cancel();
        self.session.lock().resync(snapshot);
    }

    /// Current visible document.
    pub fn document(&self) -> String {
        self.session.lock().document().to_string()
    }

    /// Whether an edit is waiting to be sent.
    pub fn has_pending(&self) -> bool {
        self.session.lock().pending().is_some()
    }
}

fn flusher(
    session: &Arc<Mutex<EditingSession>>,
    outbound: &mpsc::UnboundedSender<Message>,
) -> impl Fn(()) + Send + Sync + 'static {
    let session = Arc::clone(session);
    let outbound = outbound.clone();
    move |()| {
        let Some(change) = session.lock().take_outbound() else {
            return;
        };
        if outbound.send(Message::CodeChange(change)).is_err() {
            tracing::warn!("outbound channel closed, change dropped");
        }
    }
}
