//! Trailing-edge debounce.

use super::Callback;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

#[derive(Default)]
struct DebounceState {
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

/// Fires once, `delay` after the last call in a burst, with that call's
/// arguments. Every call restarts the timer; there is no leading edge.
///
/// # Panics
///
/// [`Debounce::call`] spawns its timer on the current Tokio runtime and
/// panics outside of one.
pub struct Debounce<T> {
    func: Callback<T>,
    delay: Duration,
    state: Arc<Mutex<DebounceState>>,
}

impl<T: Send + 'static> Debounce<T> {
    /// Create a debouncer around `func`.
    pub fn new<F>(func: F, delay: Duration) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Debounce {
            func: Arc::new(func),
            delay,
            state: Arc::new(Mutex::new(DebounceState::default())),
        }
    }

    /// Submit a call, replacing any call still waiting.
    pub fn call(&self, args: T) {
        let mut state = self.state.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation += 1;
        let generation = state.generation;

        let shared = Arc::clone(&self.state);
        let func = Arc::clone(&self.func);
        let delay = self.delay;
        state.timer = Some(tokio::spawn(async move {
            sleep(delay).await;
            {
                let mut state = shared.lock();
                // A newer call raced the abort; it owns the next flush.
                if state.generation != generation {
                    return;
                }
                state.timer = None;
            }
            func(args);
        }));
    }

    /// Drop the waiting call, if any.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    /// Whether a call is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.state.lock().timer.is_some()
    }

    /// Quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debounce<T> {
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

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_delays_execution() {
        let rec = Recorder::default();
        let debounced = Debounce::new(rec.sink(), ms(100));

        debounced.call("test".into());
        assert_eq!(rec.count(), 0);
        assert!(debounced.is_pending());

        sleep(ms(101)).await;
        assert_eq!(rec.calls(), vec!["test"]);
        assert!(!debounced.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_call_resets_timer() {
        let rec = Recorder::default();
        let debounced = Debounce::new(rec.sink(), ms(100));

        debounced.call("call1".into());
        sleep(ms(50)).await;
        debounced.call("call2".into());
        sleep(ms(50)).await;
        debounced.call("call3".into());
        assert_eq!(rec.count(), 0);

        sleep(ms(101)).await;
        assert_eq!(rec.calls(), vec!["call3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let rec = Recorder::default();
        let debounced = Debounce::new(rec.sink(), ms(100));

        debounced.call("gone".into());
        debounced.cancel();
        sleep(ms(200)).await;
        assert_eq!(rec.count(), 0);
    }
}
