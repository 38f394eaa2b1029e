//! Relay configuration.

use crate::protocol::constants::DEFAULT_USERNAME;
use serde::{Deserialize, Serialize};

/// Configuration for a [`RoomHub`](super::RoomHub).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Member limit per room (0 = unlimited)
    pub max_users_per_room: usize,
    /// Name given to members that join without one
    pub default_username: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            max_users_per_room: 0,
            default_username: DEFAULT_USERNAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unlimited() {
        let config = RelayConfig::default();
        assert_eq!(config.max_users_per_room, 0);
        assert_eq!(config.default_username, "Anonymous");
    }

    #[test]
    fn test_partial_json() {
        let config: RelayConfig = serde_json::from_str(r#"{"max_users_per_room": 8}"#).unwrap();
        assert_eq!(config.max_users_per_room, 8);
        assert_eq!(config.default_username, "Anonymous");
    }
}
