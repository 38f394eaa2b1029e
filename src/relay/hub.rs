//! Room registry and message fan-out.
//!
//! Each room holds its members' outbound channels. Messages from one member
//! are stamped with the sender id and forwarded to every other member.
//! Access is thread-safe via `Arc<RwLock<>>`.

use super::config::RelayConfig;
use super::subscription::RoomSubscription;
use crate::error::{Result, SyncError};
use crate::protocol::Message;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug)]
struct Member {
    username: String,
    sender: mpsc::UnboundedSender<Message>,
}

/// A single collaboration room.
#[derive(Debug)]
struct Room {
    members: HashMap<String, Member>,
    last_activity: SystemTime,
}

impl Room {
    fn new() -> Self {
        Room {
            members: HashMap::new(),
            last_activity: SystemTime::now(),
        }
    }

    fn touch(&mut self) {
        self.last_activity = SystemTime::now();
    }

    /// Send to every member except `exclude`.
    ///
    /// Members with a closed channel are removed and the rest of the room
    /// receives `user_left` for each of them.
    fn broadcast(&mut self, message: &Message, exclude: Option<&str>) {
        let mut dropped = self.send_all(message, exclude);
        while !dropped.is_empty() {
            let mut next = Vec::new();
            for user_id in dropped {
                next.extend(self.send_all(&Message::UserLeft { user_id }, None));
            }
            dropped = next;
        }
    }

    /// Returns the ids of the members dropped for a closed channel.
    fn send_all(&mut self, message: &Message, exclude: Option<&str>) -> Vec<String> {
        let mut closed = Vec::new();
        for (user_id, member) in &self.members {
            if exclude == Some(user_id.as_str()) {
                continue;
            }
            if member.sender.send(message.clone()).is_err() {
                closed.push(user_id.clone());
            }
        }
        for user_id in &closed {
            tracing::debug!("dropping member {} with closed channel", user_id);
            self.members.remove(user_id);
        }
        closed
    }

    /// Send to one member; a closed channel drops it like [`Room::broadcast`].
    fn reply(&mut self, user_id: &str, message: Message) {
        let Some(member) = self.members.get(user_id) else {
            return;
        };
        if member.sender.send(message).is_err() {
            tracing::debug!("dropping member {} with closed channel", user_id);
            self.members.remove(user_id);
            self.broadcast(
                &Message::UserLeft {
                    user_id: user_id.to_string(),
                },
                None,
            );
        }
    }
}

/// Thread-safe registry of collaboration rooms.
///
/// Rooms are created on first join and removed when their last member
/// leaves. Clones share the same registry.
///
/// # Examples
///
/// ```
/// use codesync::relay::RoomHub;
/// use codesync::protocol::{CodeChange, Message};
/// use codesync::Diff;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let hub = RoomHub::new();
/// let (alice, _alice_rx) = hub.connect("room-1", Some("alice")).unwrap();
/// let (_bob, mut bob_rx) = hub.connect("room-1", Some("bob")).unwrap();
///
/// let change = CodeChange::from_diff(&Diff::insertion(0, "hi"));
/// hub.handle_message("room-1", &alice, Message::CodeChange(change)).unwrap();
///
/// match bob_rx.next().await {
///     Some(Message::CodeChange(received)) => {
///         assert_eq!(received.user_id.as_deref(), Some(alice.as_str()));
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct RoomHub {
    rooms: Arc<RwLock<HashMap<String, Arc<RwLock<Room>>>>>,
    config: Arc<RelayConfig>,
}

impl RoomHub {
    /// Hub with default configuration.
    pub fn new() -> Self {
        Self::with_config(RelayConfig::default())
    }

    /// Hub with custom configuration.
    pub fn with_config(config: RelayConfig) -> Self {
        RoomHub {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    // ========== Membership ==========

    /// Add a member to `room_id`, creating the room if needed.
    ///
    /// Returns the new member's id and the stream of messages addressed to
    /// it. Existing members receive `user_joined`.
    ///
    /// # Errors
    ///
    /// [`SyncError::RoomFull`] when the room is at its member limit.
    pub fn connect(&self, room_id: &str, username: Option<&str>) -> Result<(String, RoomSubscription)> {
        let username = username
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.config.default_username)
            .to_string();

        // Hold the registry lock so a concurrent last-leave cannot drop the
        // room between lookup and insert.
        let mut rooms = self.rooms.write();
        let room = rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Room::new())))
            .clone();
        let mut room = room.write();

        let limit = self.config.max_users_per_room;
        if limit > 0 && room.members.len() >= limit {
            tracing::warn!("room {} is full ({} members)", room_id, limit);
            return Err(SyncError::RoomFull(room_id.to_string()));
        }

        let user_id = Uuid::new_v4().simple().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        room.members.insert(
            user_id.clone(),
            Member {
                username: username.clone(),
                sender: tx,
            },
        );
        room.touch();

        let joined = Message::UserJoined {
            user_id: user_id.clone(),
            username: username.clone(),
        };
        room.broadcast(&joined, Some(user_id.as_str()));

        tracing::info!("{} ({}) joined room {}", username, user_id, room_id);
        Ok((user_id, RoomSubscription::new(rx)))
    }

    /// Remove a member. Remaining members receive `user_left`; an empty room
    /// is dropped.
    ///
    /// Returns the member's username, or `None` if it was not in the room.
    pub fn disconnect(&self, room_id: &str, user_id: &str) -> Option<String> {
        let mut rooms = self.rooms.write();
        let room = rooms.get(room_id)?.clone();
        let mut room = room.write();

        let member = room.members.remove(user_id)?;
        room.touch();

        let left = Message::UserLeft {
            user_id: user_id.to_string(),
        };
        room.broadcast(&left, None);
        if room.members.is_empty() {
            rooms.remove(room_id);
        }

        tracing::info!("{} ({}) left room {}", member.username, user_id, room_id);
        Some(member.username)
    }

    // ========== Messages ==========

    /// Route a message sent by `user_id`.
    ///
    /// - `code_change`: normalized (an invalid diff next to a `code`
    ///   snapshot degrades to the snapshot), stamped with sender and time,
    ///   forwarded to the other members.
    /// - `cursor_change`: validated, stamped, forwarded.
    /// - `leave`: disconnects the sender.
    /// - anything else: the sender gets an `error` reply.
    ///
    /// Invalid payloads are answered with an `error` message, not an `Err`.
    ///
    /// # Errors
    ///
    /// [`SyncError::UnknownRoom`] / [`SyncError::UnknownUser`] when the sender
    /// is not a member.
    pub fn handle_message(&self, room_id: &str, user_id: &str, message: Message) -> Result<()> {
        let room = self
            .get_room(room_id)
            .ok_or_else(|| SyncError::UnknownRoom(room_id.to_string()))?;

        if matches!(message, Message::Leave) {
            self.disconnect(room_id, user_id)
                .ok_or_else(|| SyncError::UnknownUser(user_id.to_string()))?;
            return Ok(());
        }

        let emptied = {
            let mut room = room.write();
            if !room.members.contains_key(user_id) {
                return Err(SyncError::UnknownUser(user_id.to_string()));
            }
            Self::route(&mut room, user_id, message);
            room.members.is_empty()
        };
        if emptied {
            self.remove_if_empty(room_id);
        }
        Ok(())
    }

    fn route(room: &mut Room, user_id: &str, message: Message) {
        let outgoing = match message {
            Message::CodeChange(change) => match change.normalized() {
                Ok(mut change) => {
                    change.user_id = Some(user_id.to_string());
                    change.timestamp.get_or_insert_with(Utc::now);
                    Message::CodeChange(change)
                }
                Err(err) => {
                    room.reply(user_id, Message::error(format!("Error processing message: {err}")));
                    return;
                }
            },
            Message::CursorChange(mut cursor) => {
                if let Err(err) = cursor.validate() {
                    room.reply(user_id, Message::error(format!("Error processing message: {err}")));
                    return;
                }
                cursor.user_id = Some(user_id.to_string());
                Message::CursorChange(cursor)
            }
            other => {
                room.reply(user_id, Message::error(format!("Unknown message type: {}", other.kind())));
                return;
            }
        };

        room.touch();
        room.broadcast(&outgoing, Some(user_id));
    }

    /// Decode a JSON text frame and route it like [`RoomHub::handle_message`].
    ///
    /// Frames that fail to decode are answered with an `error` message.
    pub fn handle_text(&self, room_id: &str, user_id: &str, text: &str) -> Result<()> {
        match Message::from_json(text) {
            Ok(message) => self.handle_message(room_id, user_id, message),
            Err(err) => {
                let room = self
                    .get_room(room_id)
                    .ok_or_else(|| SyncError::UnknownRoom(room_id.to_string()))?;
                let emptied = {
                    let mut room = room.write();
                    room.reply(user_id, Message::error(format!("Error processing message: {err}")));
                    room.members.is_empty()
                };
                if emptied {
                    self.remove_if_empty(room_id);
                }
                Ok(())
            }
        }
    }

    // ========== Query Methods ==========

    /// Number of members in a room (0 for unknown rooms).
    pub fn active_users(&self, room_id: &str) -> usize {
        self.get_room(room_id)
            .map(|room| room.read().members.len())
            .unwrap_or(0)
    }

    /// Usernames of a room's members, sorted.
    pub fn usernames(&self, room_id: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .get_room(room_id)
            .map(|room| room.read().members.values().map(|m| m.username.clone()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// IDs of all rooms, in arbitrary order.
    pub fn rooms(&self) -> Vec<String> {
        self.rooms.read().keys().cloned().collect()
    }

    /// When a room last saw a join, leave or forwarded message.
    pub fn last_activity(&self, room_id: &str) -> Option<SystemTime> {
        self.get_room(room_id).map(|room| room.read().last_activity)
    }

    /// Drop a room whose members all went away outside of `disconnect`.
    fn remove_if_empty(&self, room_id: &str) {
        let mut rooms = self.rooms.write();
        let empty = rooms
            .get(room_id)
            .is_some_and(|room| room.read().members.is_empty());
        if empty {
            rooms.remove(room_id);
            tracing::debug!("removed empty room {}", room_id);
        }
    }

    fn get_room(&self, room_id: &str) -> Option<Arc<RwLock<Room>>> {
        self.rooms.read().get(room_id).cloned()
    }
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new()
    }
}
