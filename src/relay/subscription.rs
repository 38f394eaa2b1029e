//! Per-member message stream handed out by [`RoomHub::connect`](super::RoomHub::connect).
//!
//! A [`RoomSubscription`] offers an async `next()` for simple loops and
//! implements [`Stream`] for use with `StreamExt` combinators.
//!
//! ```
//! use codesync::relay::RoomHub;
//! use futures::StreamExt;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let hub = RoomHub::new();
//! let (_alice, alice_rx) = hub.connect("doc", Some("alice")).unwrap();
//! let (bob, _bob_rx) = hub.connect("doc", Some("bob")).unwrap();
//! hub.disconnect("doc", &bob);
//!
//! let kinds: Vec<_> = alice_rx.take(2).map(|m| m.kind()).collect().await;
//! assert_eq!(kinds, ["user_joined", "user_left"]);
//! # }
//! ```

use crate::protocol::Message;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Messages addressed to one room member.
///
/// The stream ends when the member is disconnected from the hub.
pub struct RoomSubscription {
    receiver: UnboundedReceiverStream<Message>,
}

impl RoomSubscription {
    pub(crate) fn new(receiver: mpsc::UnboundedReceiver<Message>) -> Self {
        RoomSubscription {
            receiver: UnboundedReceiverStream::new(receiver),
        }
    }

    /// Receive the next message, or `None` once the member is gone.
    pub async fn next(&mut self) -> Option<Message> {
        self.receiver.as_mut().recv().await
    }

    /// Take a message if one is already queued.
    pub fn try_next(&mut self) -> Option<Message> {
        self.receiver.as_mut().try_recv().ok()
    }
}

impl Stream for RoomSubscription {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_subscription_receives_in_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscription = RoomSubscription::new(rx);

        tx.send(Message::error("one")).unwrap();
        tx.send(Message::error("two")).unwrap();
        drop(tx);

        assert_eq!(subscription.next().await, Some(Message::error("one")));
        assert_eq!(StreamExt::next(&mut subscription).await, Some(Message::error("two")));
        assert_eq!(subscription.next().await, None);
    }

    #[test]
    fn test_next_waits_for_a_message() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscription = RoomSubscription::new(rx);

        let mut next = tokio_test::task::spawn(subscription.next());
        tokio_test::assert_pending!(next.poll());

        tx.send(Message::Leave).unwrap();
        assert!(next.is_woken());
        assert_eq!(tokio_test::assert_ready!(next.poll()), Some(Message::Leave));
    }

    #[test]
    fn test_try_next_on_empty() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut subscription = RoomSubscription::new(rx);
        assert!(subscription.try_next().is_none());
    }
}
