//! Collector-side packet parsing.

use std::net::Ipv4Addr;

use crate::{error::DecodeError, level::Level};

use super::PROTOCOL_VERSION;

/// Fields recovered from a packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPacket {
    pub version: u8,
    /// Reserved flag byte. Senders always write zero.
    pub reserved: u8,
    pub timestamp_millis: i64,
    /// Level byte as transmitted, already truncated to eight bits.
    pub level: u8,
    pub event_id: i32,
    pub local_ip: Ipv4Addr,
    pub assembly_name: String,
    pub message: String,
}

struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.buf.len() - self.offset;
        if remaining < len {
            return Err(DecodeError::Truncated {
                offset: self.offset,
                needed: len - remaining,
            });
        }
        let slice = &self.buf[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn text(&mut self, len: usize, field: &'static str) -> Result<String, DecodeError> {
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }
}

impl DecodedPacket {
    /// Parse a complete datagram payload.
    pub fn parse(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader { buf, offset: 0 };
        let version = reader.u8()?;
        if version != PROTOCOL_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let reserved = reader.u8()?;
        let timestamp_millis = i64::from_be_bytes(reader.array()?);
        let level = reader.u8()?;
        let event_id = i32::from_be_bytes(reader.array()?);
        let local_ip = Ipv4Addr::from(reader.array::<4>()?);
        let assembly_len = usize::from(reader.u8()?);
        let assembly_name = reader.text(assembly_len, "assembly name")?;
        let message_len = u32::from_be_bytes(reader.array()?) as usize;
        let message = reader.text(message_len, "message")?;

        let trailing = buf.len() - reader.offset;
        if trailing > 0 {
            return Err(DecodeError::TrailingBytes(trailing));
        }

        Ok(Self {
            version,
            reserved,
            timestamp_millis,
            level,
            event_id,
            local_ip,
            assembly_name,
            message,
        })
    }

    /// Whether the transmitted level byte matches `level` after truncation.
    pub fn matches_level(&self, level: Level) -> bool {
        self.level == level.wire_byte()
    }
}
