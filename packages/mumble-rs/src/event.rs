//! Events delivered to the application, in the order the server sent them.

use std::ops::BitOr;

use crate::roster::{ChannelView, User};

/// What changed about a user in a single `UserState`/`UserRemove`.
///
/// Flags are independent; one message can carry several (a fresh user
/// arrives with both `CONNECTED` and `CHANNEL`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UserChange(u8);

impl UserChange {
    pub const NONE: Self = Self(0);
    pub const CONNECTED: Self = Self(1);
    pub const DISCONNECTED: Self = Self(1 << 1);
    pub const CHANNEL: Self = Self(1 << 2);
    pub const NAME: Self = Self(1 << 3);

    pub fn has(self, flag: Self) -> bool {
        flag.0 != 0 && self.0 & flag.0 == flag.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, flag: Self) {
        self.0 |= flag.0;
    }
}

impl BitOr for UserChange {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Session is synchronized; roster is complete. Always the first event.
    Connected,

    /// A text message addressed to us (directly or via our channel).
    /// `sender` is `None` for server-originated messages.
    TextMessage {
        sender: Option<User>,
        message: String,
    },

    /// A user's state changed. `own_channel` reflects the roster *after*
    /// the change was applied.
    UserChanged {
        user: User,
        change: UserChange,
        own_channel: Option<ChannelView>,
    },

    /// The session ended. Always the last event.
    Disconnected { reason: String },
}
