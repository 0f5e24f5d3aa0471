//! Translation from session events to presence events.

use mumble::{Event, User, UserChange};

use super::events::{ChangeFlags, Participant, PresenceEvent};
use crate::runtime::Inbound;

impl From<User> for Participant {
    fn from(user: User) -> Self {
        Self {
            session: user.session,
            name: user.name,
            channel: user.channel,
        }
    }
}

impl From<UserChange> for ChangeFlags {
    fn from(change: UserChange) -> Self {
        Self {
            connected: change.has(UserChange::CONNECTED),
            channel_changed: change.has(UserChange::CHANNEL),
            disconnected: change.has(UserChange::DISCONNECTED),
        }
    }
}

/// Map one session event onto the runtime's inbound stream.
pub fn inbound(event: Event) -> Inbound<PresenceEvent> {
    match event {
        Event::Connected => Inbound::Event(PresenceEvent::Connected),
        Event::TextMessage { sender, message } => Inbound::Event(PresenceEvent::TextMessage {
            sender: sender.map(Participant::from),
            body: message,
        }),
        Event::UserChanged {
            user,
            change,
            own_channel,
        } => Inbound::Event(PresenceEvent::UserChanged {
            user: user.into(),
            flags: change.into(),
            agent_channel: own_channel.as_ref().map(|c| c.id),
            agent_occupants: own_channel.map(|c| c.user_count).unwrap_or(0),
        }),
        Event::Disconnected { reason } => Inbound::Disconnected { reason },
    }
}
