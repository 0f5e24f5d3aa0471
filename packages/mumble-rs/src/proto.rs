//! Control channel messages.
//!
//! Only the messages and fields this client reads or writes are modeled.
//! Field tags match the upstream `Mumble.proto`; unknown fields are skipped
//! by prost on decode.

use prost::Message;

/// Numeric message type carried in the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum MessageKind {
    Version = 0,
    UdpTunnel = 1,
    Authenticate = 2,
    Ping = 3,
    Reject = 4,
    ServerSync = 5,
    ChannelRemove = 6,
    ChannelState = 7,
    UserRemove = 8,
    UserState = 9,
    TextMessage = 11,
}

impl MessageKind {
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            0 => Self::Version,
            1 => Self::UdpTunnel,
            2 => Self::Authenticate,
            3 => Self::Ping,
            4 => Self::Reject,
            5 => Self::ServerSync,
            6 => Self::ChannelRemove,
            7 => Self::ChannelState,
            8 => Self::UserRemove,
            9 => Self::UserState,
            11 => Self::TextMessage,
            _ => return None,
        })
    }
}

/// Protocol version this client announces (1.3.0).
pub const CLIENT_VERSION: u32 = (1 << 16) | (3 << 8);

#[derive(Clone, PartialEq, Message)]
pub struct Version {
    #[prost(uint32, optional, tag = "1")]
    pub version: Option<u32>,
    #[prost(string, optional, tag = "2")]
    pub release: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub os: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub os_version: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Authenticate {
    #[prost(string, optional, tag = "1")]
    pub username: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub password: Option<String>,
    #[prost(string, repeated, tag = "3")]
    pub tokens: Vec<String>,
    #[prost(int32, repeated, packed = "false", tag = "4")]
    pub celt_versions: Vec<i32>,
    #[prost(bool, optional, tag = "5")]
    pub opus: Option<bool>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Ping {
    #[prost(uint64, optional, tag = "1")]
    pub timestamp: Option<u64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Reject {
    #[prost(int32, optional, tag = "1")]
    pub r#type: Option<i32>,
    #[prost(string, optional, tag = "2")]
    pub reason: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ServerSync {
    #[prost(uint32, optional, tag = "1")]
    pub session: Option<u32>,
    #[prost(uint32, optional, tag = "2")]
    pub max_bandwidth: Option<u32>,
    #[prost(string, optional, tag = "3")]
    pub welcome_text: Option<String>,
    #[prost(uint64, optional, tag = "4")]
    pub permissions: Option<u64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChannelRemove {
    #[prost(uint32, required, tag = "1")]
    pub channel_id: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChannelState {
    #[prost(uint32, optional, tag = "1")]
    pub channel_id: Option<u32>,
    #[prost(uint32, optional, tag = "2")]
    pub parent: Option<u32>,
    #[prost(string, optional, tag = "3")]
    pub name: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct UserRemove {
    #[prost(uint32, required, tag = "1")]
    pub session: u32,
    #[prost(uint32, optional, tag = "2")]
    pub actor: Option<u32>,
    #[prost(string, optional, tag = "3")]
    pub reason: Option<String>,
    #[prost(bool, optional, tag = "4")]
    pub ban: Option<bool>,
}

#[derive(Clone, PartialEq, Message)]
pub struct UserState {
    #[prost(uint32, optional, tag = "1")]
    pub session: Option<u32>,
    #[prost(uint32, optional, tag = "2")]
    pub actor: Option<u32>,
    #[prost(string, optional, tag = "3")]
    pub name: Option<String>,
    #[prost(uint32, optional, tag = "4")]
    pub user_id: Option<u32>,
    #[prost(uint32, optional, tag = "5")]
    pub channel_id: Option<u32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TextMessage {
    #[prost(uint32, optional, tag = "1")]
    pub actor: Option<u32>,
    #[prost(uint32, repeated, packed = "false", tag = "2")]
    pub session: Vec<u32>,
    #[prost(uint32, repeated, packed = "false", tag = "3")]
    pub channel_id: Vec<u32>,
    #[prost(uint32, repeated, packed = "false", tag = "4")]
    pub tree_id: Vec<u32>,
    #[prost(string, required, tag = "5")]
    pub message: String,
}

/// A decoded control channel message.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    Version(Version),
    Authenticate(Authenticate),
    Ping(Ping),
    Reject(Reject),
    ServerSync(ServerSync),
    ChannelRemove(ChannelRemove),
    ChannelState(ChannelState),
    UserRemove(UserRemove),
    UserState(UserState),
    TextMessage(TextMessage),
    /// Any message type this client does not interpret (audio tunnel,
    /// crypt setup, codec version, permission queries, ...).
    Other { kind: u16 },
}

impl ControlMessage {
    /// Decode a payload given the numeric type from the frame header.
    pub fn decode(kind: u16, payload: &[u8]) -> Result<Self, prost::DecodeError> {
        let Some(known) = MessageKind::from_u16(kind) else {
            return Ok(Self::Other { kind });
        };

        Ok(match known {
            MessageKind::Version => Self::Version(Version::decode(payload)?),
            MessageKind::UdpTunnel => Self::Other { kind },
            MessageKind::Authenticate => Self::Authenticate(Authenticate::decode(payload)?),
            MessageKind::Ping => Self::Ping(Ping::decode(payload)?),
            MessageKind::Reject => Self::Reject(Reject::decode(payload)?),
            MessageKind::ServerSync => Self::ServerSync(ServerSync::decode(payload)?),
            MessageKind::ChannelRemove => Self::ChannelRemove(ChannelRemove::decode(payload)?),
            MessageKind::ChannelState => Self::ChannelState(ChannelState::decode(payload)?),
            MessageKind::UserRemove => Self::UserRemove(UserRemove::decode(payload)?),
            MessageKind::UserState => Self::UserState(UserState::decode(payload)?),
            MessageKind::TextMessage => Self::TextMessage(TextMessage::decode(payload)?),
        })
    }

    /// Numeric type and encoded payload, ready for framing.
    ///
    /// `Other` carries no payload and encodes as an empty body.
    pub fn encode(&self) -> (u16, Vec<u8>) {
        match self {
            Self::Version(m) => (MessageKind::Version as u16, m.encode_to_vec()),
            Self::Authenticate(m) => (MessageKind::Authenticate as u16, m.encode_to_vec()),
            Self::Ping(m) => (MessageKind::Ping as u16, m.encode_to_vec()),
            Self::Reject(m) => (MessageKind::Reject as u16, m.encode_to_vec()),
            Self::ServerSync(m) => (MessageKind::ServerSync as u16, m.encode_to_vec()),
            Self::ChannelRemove(m) => (MessageKind::ChannelRemove as u16, m.encode_to_vec()),
            Self::ChannelState(m) => (MessageKind::ChannelState as u16, m.encode_to_vec()),
            Self::UserRemove(m) => (MessageKind::UserRemove as u16, m.encode_to_vec()),
            Self::UserState(m) => (MessageKind::UserState as u16, m.encode_to_vec()),
            Self::TextMessage(m) => (MessageKind::TextMessage as u16, m.encode_to_vec()),
            Self::Other { kind } => (*kind, Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kinds_decode_as_other() {
        let msg = ControlMessage::decode(15, &[0x0a, 0x01, 0x00]).unwrap();
        assert_eq!(msg, ControlMessage::Other { kind: 15 });

        let tunnel = ControlMessage::decode(1, &[0xff, 0xff]).unwrap();
        assert_eq!(tunnel, ControlMessage::Other { kind: 1 });
    }

    #[test]
    fn user_state_keeps_channel_and_name() {
        let state = UserState {
            session: Some(7),
            name: Some("Alice".to_string()),
            channel_id: Some(3),
            ..Default::default()
        };
        let (kind, payload) = ControlMessage::UserState(state.clone()).encode();
        assert_eq!(kind, 9);

        match ControlMessage::decode(kind, &payload).unwrap() {
            ControlMessage::UserState(decoded) => assert_eq!(decoded, state),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn text_message_lists_targets() {
        let msg = TextMessage {
            actor: None,
            session: vec![4, 9],
            channel_id: vec![],
            tree_id: vec![],
            message: "hi".to_string(),
        };
        let (kind, payload) = ControlMessage::TextMessage(msg).encode();

        match ControlMessage::decode(kind, &payload).unwrap() {
            ControlMessage::TextMessage(decoded) => {
                assert_eq!(decoded.session, vec![4, 9]);
                assert_eq!(decoded.message, "hi");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn client_version_is_1_3_0() {
        assert_eq!(CLIENT_VERSION, 0x0001_0300);
    }
}
