//! In-process relay that fans editor messages out to the other members of a
//! room.
//!
//! The relay is transport-agnostic: a WebSocket (or any other) server feeds
//! decoded frames into [`RoomHub::handle_text`] and forwards each member's
//! [`RoomSubscription`] back over its connection. The relay does not keep a
//! copy of the document; it only routes and stamps messages.
//!
//! # Routing rules
//!
//! | Incoming        | Action                                             |
//! |-----------------|----------------------------------------------------|
//! | `code_change`   | stamp `user_id`/`timestamp`, send to other members |
//! | `cursor_change` | validate, stamp `user_id`, send to other members   |
//! | `leave`         | disconnect, send `user_left` to remaining members  |
//! | anything else   | `error` reply to the sender                        |

mod config;
mod hub;
mod subscription;

pub use config::RelayConfig;
pub use hub::RoomHub;
pub use subscription::RoomSubscription;
