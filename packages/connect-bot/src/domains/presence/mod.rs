//! Presence domain - holds the connect string and hands it to arrivals
//!
//! Architecture (machine/effect pattern):
//!   mumble::Event → edges::inbound → PresenceMachine.decide → PresenceEffect
//!
//! Responsibilities:
//! - Arming the connect string from private messages
//! - Greeting users who enter the bot's channel
//! - Falling back to the default string when the bot is left alone

pub mod commands;
pub mod edges;
pub mod effects;
pub mod events;
pub mod machines;

pub use commands::PresenceCommand;
pub use effects::{PresenceEffect, SETTLE_DELAY};
pub use events::{ChangeFlags, Participant, PresenceEvent};
pub use machines::{Mode, PresenceMachine};
