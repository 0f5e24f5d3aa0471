//! Presence events - facts delivered by the session, in delivery order.

use mumble::{ChannelId, Session};

/// A user as seen at the moment an event was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub session: Session,
    pub name: String,
    pub channel: ChannelId,
}

/// Which aspects of a user changed. Flags are independent; a fresh join
/// carries both `connected` and `channel_changed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeFlags {
    pub connected: bool,
    pub channel_changed: bool,
    pub disconnected: bool,
}

impl ChangeFlags {
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    pub fn channel_changed() -> Self {
        Self {
            channel_changed: true,
            ..Self::default()
        }
    }

    pub fn disconnected() -> Self {
        Self {
            disconnected: true,
            ..Self::default()
        }
    }

    /// Flags for a user who just connected straight into a channel.
    pub fn joined() -> Self {
        Self {
            connected: true,
            channel_changed: true,
            disconnected: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresenceEvent {
    /// Session established and roster synchronized. Fired once.
    Connected,

    /// Someone sent us text. `sender` is `None` for server messages.
    TextMessage {
        sender: Option<Participant>,
        body: String,
    },

    /// A user's presence changed.
    ///
    /// `agent_channel` and `agent_occupants` describe the bot's own channel
    /// *after* the change; the occupant count includes the bot.
    UserChanged {
        user: Participant,
        flags: ChangeFlags,
        agent_channel: Option<ChannelId>,
        agent_occupants: usize,
    },
}
