//! Presence machine - owns the connect string and decides who gets it.
//!
//! Pure decisions, no IO. Every transition is a named method so it can be
//! driven directly from tests; [`Machine::decide`] only dispatches.
//!
//! ```text
//! Connected ─────────────► connect_string = default      → EnterTargetChannel
//! TextMessage("..connect..") ► connect_string = message  → Reply
//! UserChanged
//!   channel_changed:  sole occupant? reset; arrival in our channel? → Greet
//!   disconnected:     sole occupant? reset
//! ```

use mumble::ChannelId;
use tracing::{debug, info};

use super::commands::PresenceCommand;
use super::events::{ChangeFlags, Participant, PresenceEvent};
use crate::runtime::Machine;

/// Substring that marks a text message as a new connect string.
pub const CONNECT_TRIGGER: &str = "connect";

/// Prefix of the confirmation sent back to whoever armed the string.
pub const CONFIRMATION_PREFIX: &str = "Connect received: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Holding the default (or nothing, before the session connects).
    Idle,
    /// Holding a string a user sent us.
    Armed,
}

pub struct PresenceMachine {
    connect_string: String,
    default_connect_string: String,
    target_channel_path: Vec<String>,
    /// Events about a user with this exact name are treated as our own.
    self_name: String,
}

impl PresenceMachine {
    pub fn new(
        default_connect_string: impl Into<String>,
        target_channel_path: Vec<String>,
        self_name: impl Into<String>,
    ) -> Self {
        Self {
            connect_string: String::new(),
            default_connect_string: default_connect_string.into(),
            target_channel_path,
            self_name: self_name.into(),
        }
    }

    pub fn connect_string(&self) -> &str {
        &self.connect_string
    }

    pub fn default_connect_string(&self) -> &str {
        &self.default_connect_string
    }

    pub fn mode(&self) -> Mode {
        if self.connect_string.is_empty() || self.connect_string == self.default_connect_string {
            Mode::Idle
        } else {
            Mode::Armed
        }
    }

    pub fn on_connected(&mut self) -> Option<PresenceCommand> {
        if !self.target_channel_path.is_empty() {
            info!(path = ?self.target_channel_path, "connected, joining target channel");
        } else {
            info!("connected");
        }
        self.reset();
        Some(PresenceCommand::EnterTargetChannel {
            path: self.target_channel_path.clone(),
        })
    }

    pub fn on_text_message(
        &mut self,
        sender: Option<&Participant>,
        body: &str,
    ) -> Option<PresenceCommand> {
        if !body.contains(CONNECT_TRIGGER) {
            return None;
        }

        self.connect_string = body.to_string();
        info!(
            connect = %self.connect_string,
            from = sender.map(|s| s.name.as_str()).unwrap_or("<server>"),
            "connect string received"
        );

        sender.map(|s| PresenceCommand::Reply {
            to: s.session,
            name: s.name.clone(),
            text: format!("{}{}", CONFIRMATION_PREFIX, self.connect_string),
        })
    }

    pub fn on_user_changed(
        &mut self,
        user: &Participant,
        flags: ChangeFlags,
        agent_channel: Option<ChannelId>,
        agent_occupants: usize,
    ) -> Option<PresenceCommand> {
        let is_self = user.name == self.self_name;
        let in_agent_channel = agent_channel == Some(user.channel);
        let mut command = None;

        if flags.connected && !is_self && in_agent_channel {
            info!(user = %user.name, "user connected");
        }

        if flags.channel_changed {
            info!(user = %user.name, channel = user.channel, "user changed channel");
            self.reset_if_alone(agent_occupants);

            if !is_self && in_agent_channel {
                debug!(connect = %self.connect_string, "arrival in our channel");
                if !self.connect_string.is_empty() {
                    info!(user = %user.name, "sending connect string");
                    command = Some(PresenceCommand::Greet {
                        to: user.session,
                        name: user.name.clone(),
                        text: self.connect_string.clone(),
                    });
                }
            }
        }

        if flags.disconnected {
            info!(user = %user.name, occupants = agent_occupants, "user disconnected");
            self.reset_if_alone(agent_occupants);
        }

        command
    }

    fn reset_if_alone(&mut self, agent_occupants: usize) {
        if agent_occupants == 1 {
            self.reset();
        }
    }

    fn reset(&mut self) {
        if self.connect_string != self.default_connect_string {
            debug!(default = %self.default_connect_string, "connect string reset");
        }
        self.connect_string.clone_from(&self.default_connect_string);
    }
}

impl Machine for PresenceMachine {
    type Event = PresenceEvent;
    type Command = PresenceCommand;

    fn decide(&mut self, event: &PresenceEvent) -> Option<PresenceCommand> {
        match event {
            PresenceEvent::Connected => self.on_connected(),
            PresenceEvent::TextMessage { sender, body } => {
                self.on_text_message(sender.as_ref(), body)
            }
            PresenceEvent::UserChanged {
                user,
                flags,
                agent_channel,
                agent_occupants,
            } => self.on_user_changed(user, *flags, *agent_channel, *agent_occupants),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOBBY: ChannelId = 2;
    const AFK: ChannelId = 3;

    fn machine() -> PresenceMachine {
        PresenceMachine::new("D", Vec::new(), "_ConnectBot")
    }

    fn user(session: u32, name: &str, channel: ChannelId) -> Participant {
        Participant {
            session,
            name: name.to_string(),
            channel,
        }
    }

    fn arm(machine: &mut PresenceMachine, text: &str) {
        machine.on_text_message(Some(&user(5, "Alice", LOBBY)), text);
    }

    #[test]
    fn starts_empty_and_idle() {
        let machine = machine();
        assert_eq!(machine.connect_string(), "");
        assert_eq!(machine.mode(), Mode::Idle);
    }

    #[test]
    fn connected_resets_to_default_and_settles() {
        let mut machine = machine();
        let cmd = machine.decide(&PresenceEvent::Connected);

        assert_eq!(machine.connect_string(), "D");
        assert_eq!(machine.mode(), Mode::Idle);
        assert_eq!(
            cmd,
            Some(PresenceCommand::EnterTargetChannel { path: Vec::new() })
        );
    }

    #[test]
    fn connected_carries_target_path() {
        let mut machine = PresenceMachine::new(
            "D",
            vec!["Games".to_string(), "Lobby".to_string()],
            "_ConnectBot",
        );
        let cmd = machine.on_connected();
        assert_eq!(
            cmd,
            Some(PresenceCommand::EnterTargetChannel {
                path: vec!["Games".to_string(), "Lobby".to_string()]
            })
        );
    }

    #[test]
    fn connected_discards_an_armed_string() {
        let mut machine = machine();
        arm(&mut machine, "connect 10.0.0.1");
        machine.on_connected();
        assert_eq!(machine.connect_string(), "D");
    }

    #[test]
    fn trigger_message_arms_and_replies() {
        let mut machine = machine();
        machine.on_connected();

        let alice = user(5, "Alice", LOBBY);
        let cmd = machine.on_text_message(Some(&alice), "please connect me");

        assert_eq!(machine.connect_string(), "please connect me");
        assert_eq!(machine.mode(), Mode::Armed);
        assert_eq!(
            cmd,
            Some(PresenceCommand::Reply {
                to: 5,
                name: "Alice".to_string(),
                text: "Connect received: please connect me".to_string(),
            })
        );
    }

    #[test]
    fn trigger_is_case_sensitive_substring() {
        let mut machine = machine();
        machine.on_connected();

        assert!(machine
            .on_text_message(Some(&user(5, "Alice", LOBBY)), "CONNECT now")
            .is_none());
        assert_eq!(machine.connect_string(), "D");

        assert!(machine
            .on_text_message(Some(&user(5, "Alice", LOBBY)), "reconnecting")
            .is_some());
        assert_eq!(machine.connect_string(), "reconnecting");
    }

    #[test]
    fn later_trigger_overrides_earlier() {
        let mut machine = machine();
        arm(&mut machine, "connect A");
        arm(&mut machine, "connect B");
        assert_eq!(machine.connect_string(), "connect B");
    }

    #[test]
    fn non_trigger_message_changes_nothing() {
        let mut machine = machine();
        arm(&mut machine, "connect A");
        let cmd = machine.on_text_message(Some(&user(6, "Bob", LOBBY)), "hello");
        assert!(cmd.is_none());
        assert_eq!(machine.connect_string(), "connect A");
    }

    #[test]
    fn server_message_arms_without_reply() {
        let mut machine = machine();
        let cmd = machine.on_text_message(None, "connect 10.0.0.1");
        assert!(cmd.is_none());
        assert_eq!(machine.connect_string(), "connect 10.0.0.1");
    }

    #[test]
    fn arrival_in_our_channel_is_greeted() {
        let mut machine = machine();
        arm(&mut machine, "please connect me");

        let cmd = machine.on_user_changed(
            &user(6, "Bob", LOBBY),
            ChangeFlags::channel_changed(),
            Some(LOBBY),
            3,
        );

        assert_eq!(
            cmd,
            Some(PresenceCommand::Greet {
                to: 6,
                name: "Bob".to_string(),
                text: "please connect me".to_string(),
            })
        );
    }

    #[test]
    fn fresh_join_is_greeted_once() {
        let mut machine = machine();
        machine.on_connected();

        let cmd = machine.on_user_changed(
            &user(6, "Bob", LOBBY),
            ChangeFlags::joined(),
            Some(LOBBY),
            2,
        );
        assert!(matches!(cmd, Some(PresenceCommand::Greet { to: 6, .. })));
    }

    #[test]
    fn connect_alone_does_not_greet() {
        let mut machine = machine();
        machine.on_connected();

        let cmd = machine.on_user_changed(
            &user(6, "Bob", LOBBY),
            ChangeFlags::connected(),
            Some(LOBBY),
            2,
        );
        assert!(cmd.is_none());
        assert_eq!(machine.connect_string(), "D");
    }

    #[test]
    fn arrival_elsewhere_is_ignored() {
        let mut machine = machine();
        arm(&mut machine, "please connect me");

        let cmd = machine.on_user_changed(
            &user(6, "Bob", AFK),
            ChangeFlags::channel_changed(),
            Some(LOBBY),
            2,
        );
        assert!(cmd.is_none());
        assert_eq!(machine.connect_string(), "please connect me");
    }

    #[test]
    fn self_is_never_greeted() {
        let mut machine = machine();
        arm(&mut machine, "please connect me");

        let cmd = machine.on_user_changed(
            &user(1, "_ConnectBot", LOBBY),
            ChangeFlags::channel_changed(),
            Some(LOBBY),
            2,
        );
        assert!(cmd.is_none());
    }

    #[test]
    fn self_name_match_is_literal() {
        let mut machine = PresenceMachine::new("D", Vec::new(), "Relay");
        machine.on_connected();

        // The configured name, not the session, identifies us
        let cmd = machine.on_user_changed(
            &user(1, "_ConnectBot", LOBBY),
            ChangeFlags::channel_changed(),
            Some(LOBBY),
            2,
        );
        assert!(cmd.is_some());

        let cmd = machine.on_user_changed(
            &user(9, "Relay", LOBBY),
            ChangeFlags::channel_changed(),
            Some(LOBBY),
            2,
        );
        assert!(cmd.is_none());
    }

    #[test]
    fn empty_string_is_never_sent() {
        let mut machine = PresenceMachine::new("", Vec::new(), "_ConnectBot");
        machine.on_connected();

        let cmd = machine.on_user_changed(
            &user(6, "Bob", LOBBY),
            ChangeFlags::joined(),
            Some(LOBBY),
            2,
        );
        assert!(cmd.is_none());
    }

    #[test]
    fn nothing_is_sent_before_connected() {
        let mut machine = machine();
        let cmd = machine.on_user_changed(
            &user(6, "Bob", LOBBY),
            ChangeFlags::channel_changed(),
            Some(LOBBY),
            2,
        );
        assert!(cmd.is_none());
    }

    #[test]
    fn departure_leaving_bot_alone_resets() {
        let mut machine = machine();
        arm(&mut machine, "please connect me");

        let cmd = machine.on_user_changed(
            &user(6, "Bob", LOBBY),
            ChangeFlags::disconnected(),
            Some(LOBBY),
            1,
        );
        assert!(cmd.is_none());
        assert_eq!(machine.connect_string(), "D");
        assert_eq!(machine.mode(), Mode::Idle);
    }

    #[test]
    fn departure_with_others_present_keeps_string() {
        let mut machine = machine();
        arm(&mut machine, "please connect me");

        machine.on_user_changed(
            &user(6, "Bob", LOBBY),
            ChangeFlags::disconnected(),
            Some(LOBBY),
            2,
        );
        assert_eq!(machine.connect_string(), "please connect me");
    }

    #[test]
    fn moving_out_leaving_bot_alone_resets() {
        let mut machine = machine();
        arm(&mut machine, "please connect me");

        machine.on_user_changed(
            &user(6, "Bob", AFK),
            ChangeFlags::channel_changed(),
            Some(LOBBY),
            1,
        );
        assert_eq!(machine.connect_string(), "D");
    }

    #[test]
    fn double_reset_is_harmless() {
        let mut machine = machine();
        arm(&mut machine, "please connect me");

        let both = ChangeFlags {
            connected: false,
            channel_changed: true,
            disconnected: true,
        };
        let cmd = machine.on_user_changed(&user(6, "Bob", AFK), both, Some(LOBBY), 1);

        assert!(cmd.is_none());
        assert_eq!(machine.connect_string(), "D");
    }

    #[test]
    fn bot_moving_into_empty_channel_resets() {
        let mut machine = machine();
        arm(&mut machine, "please connect me");

        machine.on_user_changed(
            &user(1, "_ConnectBot", AFK),
            ChangeFlags::channel_changed(),
            Some(AFK),
            1,
        );
        assert_eq!(machine.connect_string(), "D");
    }

    #[test]
    fn unknown_own_channel_never_resets_or_greets() {
        let mut machine = machine();
        arm(&mut machine, "please connect me");

        let cmd = machine.on_user_changed(
            &user(6, "Bob", LOBBY),
            ChangeFlags::channel_changed(),
            None,
            0,
        );
        assert!(cmd.is_none());
        assert_eq!(machine.connect_string(), "please connect me");
    }
}
