//! Agent framing for `tokio_util` streams.
//!
//! Each frame is a `u32` big-endian length followed by one message.

use std::mem::size_of;

use byteorder::{BigEndian, ByteOrder};
use ssh_encoding::{Decode, Encode};
use tokio_util::bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::encoding::MAX_PACKED_LEN;
use super::error::AgentError;
use super::proto::{ProtoError, Request, Response};

const LEN_PREFIX: usize = size_of::<u32>();

/// Client side codec: writes [`Request`]s, reads [`Response`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct AgentCodec;

impl Decoder for AgentCodec {
    type Item = Response;
    type Error = AgentError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Response>, AgentError> {
        if src.len() < LEN_PREFIX {
            return Ok(None);
        }

        let length = BigEndian::read_u32(&src[..LEN_PREFIX]) as usize;
        if length > MAX_PACKED_LEN {
            return Err(ProtoError::SshEncoding(ssh_encoding::Error::Length).into());
        }

        let frame_len = LEN_PREFIX + length;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(LEN_PREFIX);
        let frame = src.split_to(length);
        Ok(Some(Response::decode(&mut &frame[..])?))
    }
}

impl Encoder<Request> for AgentCodec {
    type Error = AgentError;

    fn encode(&mut self, request: Request, dst: &mut BytesMut) -> Result<(), AgentError> {
        let mut body = Vec::new();
        request.encode(&mut body).map_err(ProtoError::SshEncoding)?;
        let length = u32::try_from(body.len())
            .map_err(|_| ProtoError::SshEncoding(ssh_encoding::Error::Overflow))?;

        dst.reserve(LEN_PREFIX + body.len());
        dst.put_u32(length);
        dst.extend_from_slice(&body);
        Ok(())
    }
}
