//! Throttle with configurable leading and trailing edges.

use super::Callback;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

/// Which edges of a throttle window fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleOptions {
    /// Fire immediately when the window has elapsed
    pub leading: bool,
    /// Flush the latest buffered arguments when the window closes
    pub trailing: bool,
}

impl Default for ThrottleOptions {
    fn default() -> Self {
        ThrottleOptions {
            leading: true,
            trailing: true,
        }
    }
}

struct ThrottleState<T> {
    last_call: Option<Instant>,
    last_args: Option<T>,
    timer: Option<JoinHandle<()>>,
}

/// Limits how often a callback fires.
///
/// With default options the first call in a window fires at once; calls
/// inside the window are coalesced and the most recent arguments are flushed
/// when the window closes. In steady typing that is one emission per window.
///
/// - `leading = false`: the first call schedules a flush `delay` later instead
///   of firing.
/// - `trailing = false`: calls inside the window are dropped.
///
/// # Panics
///
/// [`Throttle::call`] spawns its trailing timer on the current Tokio runtime
/// and panics outside of one.
pub struct Throttle<T> {
    func: Callback<T>,
    delay: Duration,
    options: ThrottleOptions,
    state: Arc<Mutex<ThrottleState<T>>>,
}

impl<T: Send + 'static> Throttle<T> {
    /// Throttle with both edges enabled.
    pub fn new<F>(func: F, delay: Duration) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self::with_options(func, delay, ThrottleOptions::default())
    }

    /// Throttle with explicit edge options.
    pub fn with_options<F>(func: F, delay: Duration, options: ThrottleOptions) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Throttle {
            func: Arc::new(func),
            delay,
            options,
            state: Arc::new(Mutex::new(ThrottleState {
                last_call: None,
                last_args: None,
                timer: None,
            })),
        }
    }

    /// Submit a call.
    pub fn call(&self, args: T) {
        let now = Instant::now();
        let mut state = self.state.lock();
        let remaining = match state.last_call {
            Some(last) => self.delay.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        };

        state.last_args = Some(args);

        if remaining.is_zero() {
            if self.options.leading {
                state.last_call = Some(now);
                let args = state.last_args.take();
                drop(state);
                if let Some(args) = args {
                    (self.func)(args);
                }
            } else if self.options.trailing && state.timer.is_none() {
                self.schedule(&mut state, self.delay);
            }
        } else if self.options.trailing && state.timer.is_none() {
            self.schedule(&mut state, remaining);
        }
    }

    /// Drop any buffered call and stop the trailing timer.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.last_args = None;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    /// Whether a trailing flush is scheduled.
    pub fn is_pending(&self) -> bool {
        self.state.lock().timer.is_some()
    }

    /// Window length.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn schedule(&self, state: &mut ThrottleState<T>, wait: Duration) {
        let shared = Arc::clone(&self.state);
        let func = Arc::clone(&self.func);
        state.timer = Some(tokio::spawn(async move {
            sleep(wait).await;
            let args = {
                let mut state = shared.lock();
                state.timer = None;
                let args = state.last_args.take();
                if args.is_some() {
                    state.last_call = Some(Instant::now());
                }
                args
            };
            if let Some(args) = args {
                func(args);
            }
        }));
    }
}

impl<T> Drop for Throttle<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.state.lock().timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::testing::Recorder;

    const WINDOW: Duration = Duration::from_millis(100);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let rec = Recorder::default();
        let throttled = Throttle::new(rec.sink(), WINDOW);

        throttled.call("test".into());
        assert_eq!(rec.calls(), vec!["test"]);
        assert!(!throttled.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_flushes_latest() {
        let rec = Recorder::default();
        let throttled = Throttle::new(rec.sink(), WINDOW);

        throttled.call("call1".into());
        throttled.call("call2".into());
        throttled.call("call3".into());
        assert_eq!(rec.calls(), vec!["call1"]);

        sleep(ms(101)).await;
        assert_eq!(rec.calls(), vec!["call1", "call3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trailing_fires_at_window_end() {
        let rec = Recorder::default();
        let throttled = Throttle::new(rec.sink(), WINDOW);

        throttled.call("call1".into());
        sleep(ms(50)).await;
        throttled.call("call2".into());
        assert_eq!(rec.count(), 1);

        sleep(ms(51)).await;
        assert_eq!(rec.calls(), vec!["call1", "call2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_window_is_immediate() {
        let rec = Recorder::default();
        let throttled = Throttle::new(rec.sink(), WINDOW);

        throttled.call("call1".into());
        sleep(WINDOW).await;
        throttled.call("call2".into());
        assert_eq!(rec.calls(), vec!["call1", "call2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leading_disabled_defers_first_call() {
        let rec = Recorder::default();
        let throttled = Throttle::with_options(
            rec.sink(),
            WINDOW,
            ThrottleOptions {
                leading: false,
                trailing: true,
            },
        );

        throttled.call("test".into());
        assert_eq!(rec.count(), 0);
        assert!(throttled.is_pending());

        sleep(ms(101)).await;
        assert_eq!(rec.calls(), vec!["test"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trailing_disabled_drops_window_calls() {
        let rec = Recorder::default();
        let throttled = Throttle::with_options(
            rec.sink(),
            WINDOW,
            ThrottleOptions {
                leading: true,
                trailing: false,
            },
        );

        throttled.call("call1".into());
        throttled.call("call2".into());
        assert_eq!(rec.count(), 1);

        sleep(ms(150)).await;
        assert_eq!(rec.calls(), vec!["call1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_trailing_call() {
        let rec = Recorder::default();
        let throttled = Throttle::new(rec.sink(), WINDOW);

        throttled.call("kept".into());
        throttled.call("dropped".into());
        throttled.cancel();

        sleep(ms(150)).await;
        assert_eq!(rec.calls(), vec!["kept"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_timer() {
        let rec = Recorder::default();
        {
            let throttled = Throttle::new(rec.sink(), WINDOW);
            throttled.call("first".into());
            throttled.call("never".into());
        }
        sleep(ms(150)).await;
        assert_eq!(rec.calls(), vec!["first"]);
    }
}
