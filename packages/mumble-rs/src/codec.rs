//! Frame codec for the control channel.
//!
//! Every frame is a 6-byte header (`u16` type, `u32` length, both big-endian)
//! followed by a protobuf payload.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::MumbleError;
use crate::proto::ControlMessage;

const HEADER_LEN: usize = 6;

/// Upper bound on a single payload. Servers never send anything close to
/// this for the messages we care about.
pub const MAX_PAYLOAD_LEN: usize = 8 * 1024 * 1024;

#[derive(Debug, Default, Clone, Copy)]
pub struct ControlCodec;

impl Decoder for ControlCodec {
    type Item = ControlMessage;
    type Error = MumbleError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let kind = u16::from_be_bytes([src[0], src[1]]);
        let len = u32::from_be_bytes([src[2], src[3], src[4], src[5]]) as usize;

        if len > MAX_PAYLOAD_LEN {
            return Err(MumbleError::Protocol(format!(
                "frame of type {} declares {} bytes (max {})",
                kind, len, MAX_PAYLOAD_LEN
            )));
        }

        if src.len() < HEADER_LEN + len {
            src.reserve(HEADER_LEN + len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let payload = src.split_to(len);
        let message = ControlMessage::decode(kind, &payload)?;
        Ok(Some(message))
    }
}

impl Encoder<ControlMessage> for ControlCodec {
    type Error = MumbleError;

    fn encode(&mut self, item: ControlMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (kind, payload) = item.encode();
        dst.reserve(HEADER_LEN + payload.len());
        dst.put_u16(kind);
        dst.put_u32(payload.len() as u32);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}
