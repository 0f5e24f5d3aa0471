//! Channel tree and user directory, kept in sync with server state messages.

use std::collections::HashMap;

use crate::event::UserChange;
use crate::proto::{ChannelState, UserState};

pub type Session = u32;
pub type ChannelId = u32;

/// The root channel always has id 0.
pub const ROOT_CHANNEL: ChannelId = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub session: Session,
    pub name: String,
    pub channel: ChannelId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub parent: Option<ChannelId>,
    pub name: String,
}

/// Point-in-time view of a channel and how many users are in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelView {
    pub id: ChannelId,
    pub name: String,
    pub user_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    own_session: Option<Session>,
    channels: HashMap<ChannelId, Channel>,
    users: HashMap<Session, User>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_own_session(&mut self, session: Session) {
        self.own_session = Some(session);
    }

    pub fn own_session(&self) -> Option<Session> {
        self.own_session
    }

    pub fn own_user(&self) -> Option<&User> {
        self.own_session.and_then(|s| self.users.get(&s))
    }

    pub fn user(&self, session: Session) -> Option<&User> {
        self.users.get(&session)
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    /// Number of users currently in `channel`.
    pub fn occupants(&self, channel: ChannelId) -> usize {
        self.users.values().filter(|u| u.channel == channel).count()
    }

    /// The channel we are in, with its current occupant count (us included).
    pub fn own_channel(&self) -> Option<ChannelView> {
        let own = self.own_user()?;
        let name = self
            .channels
            .get(&own.channel)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        Some(ChannelView {
            id: own.channel,
            name,
            user_count: self.occupants(own.channel),
        })
    }

    pub fn apply_channel_state(&mut self, state: &ChannelState) {
        let Some(id) = state.channel_id else {
            return;
        };
        let channel = self.channels.entry(id).or_insert_with(|| Channel {
            id,
            parent: None,
            name: String::new(),
        });
        if let Some(parent) = state.parent {
            channel.parent = Some(parent);
        }
        if let Some(name) = &state.name {
            channel.name = name.clone();
        }
    }

    pub fn remove_channel(&mut self, id: ChannelId) -> Option<Channel> {
        self.channels.remove(&id)
    }

    /// Apply a `UserState` and report what changed.
    ///
    /// A session we have not seen before is placed in the root channel and
    /// reported as `CONNECTED | CHANNEL`, then moved if the message names a
    /// different channel. Returns `None` when the message has no session.
    pub fn apply_user_state(&mut self, state: &UserState) -> Option<(User, UserChange)> {
        let session = state.session?;
        let mut change = UserChange::NONE;

        let user = self.users.entry(session).or_insert_with(|| {
            change.insert(UserChange::CONNECTED | UserChange::CHANNEL);
            User {
                session,
                name: String::new(),
                channel: ROOT_CHANNEL,
            }
        });

        if let Some(name) = &state.name {
            if *name != user.name {
                if !change.has(UserChange::CONNECTED) {
                    change.insert(UserChange::NAME);
                }
                user.name = name.clone();
            }
        }

        if let Some(channel) = state.channel_id {
            if channel != user.channel {
                user.channel = channel;
                change.insert(UserChange::CHANNEL);
            }
        }

        Some((user.clone(), change))
    }

    pub fn remove_user(&mut self, session: Session) -> Option<User> {
        self.users.remove(&session)
    }

    /// Resolve a channel by name path, starting below the root.
    ///
    /// Each segment selects a direct child of the previous channel by exact
    /// name. The empty path resolves to the root. When siblings share a
    /// name the lowest id wins.
    pub fn find_channel<S: AsRef<str>>(&self, path: &[S]) -> Option<ChannelId> {
        let mut current = self.channels.get(&ROOT_CHANNEL)?.id;

        for segment in path {
            let segment = segment.as_ref();
            current = self
                .channels
                .values()
                .filter(|c| c.parent == Some(current) && c.id != current && c.name == segment)
                .map(|c| c.id)
                .min()?;
        }

        Some(current)
    }
}
