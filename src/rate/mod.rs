//! Rate control for outbound change events.
//!
//! Editors produce an event per keystroke; peers do not need all of them.
//! [`Throttle`] caps the emission rate of small incremental edits, while
//! [`Debounce`] waits for bulk edits such as pastes to settle.
//!
//! Both types own their timer. Timers run as Tokio tasks, so `call` must be
//! made from within a Tokio runtime. Dropping a limiter (or calling
//! `cancel`) discards anything still queued.
//!
//! # Examples
//!
//! ```
//! use codesync::rate::{throttle, debounce};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sent = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&sent);
//! let throttled = throttle(move |_: String| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! }, Duration::from_millis(100));
//!
//! throttled.call("a".to_string()); // fires immediately
//! throttled.call("b".to_string()); // buffered for the trailing flush
//! assert_eq!(sent.load(Ordering::SeqCst), 1);
//!
//! let quiet = debounce(|text: String| println!("{text}"), Duration::from_millis(300));
//! quiet.call("pasted".to_string());
//! # }
//! ```

mod debounce;
mod throttle;

use std::sync::Arc;
use std::time::Duration;

pub use debounce::Debounce;
pub use throttle::{Throttle, ThrottleOptions};

/// Shared callback invoked by a limiter.
pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Leading-edge throttle with a trailing flush of the latest arguments.
pub fn throttle<T, F>(func: F, delay: Duration) -> Throttle<T>
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    Throttle::new(func, delay)
}

/// Throttle with explicit leading/trailing edges.
pub fn throttle_with_options<T, F>(func: F, delay: Duration, options: ThrottleOptions) -> Throttle<T>
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    Throttle::with_options(func, delay, options)
}

/// Fire once, `delay` after the last call of a burst.
pub fn debounce<T, F>(func: F, delay: Duration) -> Debounce<T>
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    Debounce::new(func, delay)
}
