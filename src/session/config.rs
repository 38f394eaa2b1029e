//! Session configuration.

use crate::protocol::constants::{
    CODE_THROTTLE_MS, CURSOR_THROTTLE_MS, FULL_CODE_RATIO, LARGE_EDIT_DEBOUNCE_MS,
    LARGE_EDIT_THRESHOLD,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for an editing session and its change emitter.
///
/// # Examples
///
/// ```
/// use codesync::session::SessionConfig;
///
/// let config = SessionConfig {
///     code_throttle_ms: 50,
///     ..Default::default()
/// };
/// assert_eq!(config.large_edit_threshold, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Throttle window for small code edits
    pub code_throttle_ms: u64,
    /// Throttle window for cursor moves
    pub cursor_throttle_ms: u64,
    /// Quiet period before flushing a large edit
    pub large_edit_debounce_ms: u64,
    /// Edits above this many characters are debounced instead of throttled
    pub large_edit_threshold: usize,
    /// Share of the document above which a full snapshot is sent
    pub full_code_ratio: f64,
    /// Emit per-edit debug logs
    pub enable_logging: bool,
    /// Transport reconnect schedule
    pub reconnect: ReconnectPolicy,
}

impl SessionConfig {
    /// Code throttle window.
    pub fn code_throttle(&self) -> Duration {
        Duration::from_millis(self.code_throttle_ms)
    }

    /// Cursor throttle window.
    pub fn cursor_throttle(&self) -> Duration {
        Duration::from_millis(self.cursor_throttle_ms)
    }

    /// Large-edit debounce period.
    pub fn large_edit_debounce(&self) -> Duration {
        Duration::from_millis(self.large_edit_debounce_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            code_throttle_ms: CODE_THROTTLE_MS,
            cursor_throttle_ms: CURSOR_THROTTLE_MS,
            large_edit_debounce_ms: LARGE_EDIT_DEBOUNCE_MS,
            large_edit_threshold: LARGE_EDIT_THRESHOLD,
            full_code_ratio: FULL_CODE_RATIO,
            enable_logging: true,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Exponential backoff for re-establishing a dropped transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Attempts before giving up
    pub max_attempts: u32,
    /// Base delay, doubled per attempt
    pub base_delay_ms: u64,
    /// Upper bound on a single delay
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy {
            max_attempts: 5,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based), or `None` once the
    /// attempts are exhausted.
    ///
    /// ```
    /// use codesync::session::ReconnectPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = ReconnectPolicy::default();
    /// assert_eq!(policy.delay_for(1), Some(Duration::from_millis(2000)));
    /// assert_eq!(policy.delay_for(4), Some(Duration::from_millis(10_000)));
    /// assert_eq!(policy.delay_for(6), None);
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt > self.max_attempts {
            return None;
        }
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(2_u64.pow(attempt.min(20)))
            .min(self.max_delay_ms);
        Some(Duration::from_millis(delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_usage_contract() {
        let config = SessionConfig::default();
        assert_eq!(config.code_throttle(), Duration::from_millis(100));
        assert_eq!(config.cursor_throttle(), Duration::from_millis(200));
        assert_eq!(config.large_edit_debounce(), Duration::from_millis(300));
        assert_eq!(config.large_edit_threshold, 100);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"code_throttle_ms": 40, "reconnect": {"max_attempts": 2}}"#)
                .unwrap();
        assert_eq!(config.code_throttle_ms, 40);
        assert_eq!(config.cursor_throttle_ms, 200);
        assert_eq!(config.reconnect.max_attempts, 2);
        assert_eq!(config.reconnect.base_delay_ms, 1000);
    }

    #[test]
    fn test_backoff_grows_then_caps() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<_> = (1..=5).filter_map(|n| policy.delay_for(n)).collect();
        assert_eq!(
            delays,
            [2000, 4000, 8000, 10_000, 10_000].map(Duration::from_millis).to_vec()
        );
        assert!(policy.delay_for(6).is_none());
    }
}
