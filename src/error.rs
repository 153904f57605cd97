//! Error types shared by the encoder and the sender.

use std::io;

use thiserror::Error;

/// Reasons an event cannot be turned into a well-formed packet.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// The origin name does not fit the one-byte length prefix.
    #[error("assembly name is {len} bytes but the length prefix holds at most 255")]
    AssemblyNameTooLong { len: usize },
    /// The `EventID` property cannot be represented as an `i32`.
    #[error("EventID property {value:?} is not a 32-bit integer")]
    InvalidEventId { value: String },
    /// The message does not fit the four-byte length prefix.
    #[error("message is {len} bytes but the length prefix holds at most {}", u32::MAX)]
    MessageTooLong { len: usize },
}

/// Local address lookup failures. Always recovered by falling back to
/// loopback; these only ever reach the debug log.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("host reported no IPv4 address")]
    NoIpv4Address,
    #[error("host address lookup failed: {0}")]
    Lookup(#[from] io::Error),
}

/// Outcome of a failed send attempt.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("UDP packet encoding failed: {0}")]
    Encoding(#[from] PacketError),
    #[error("UDP send failed: {0}")]
    Transport(#[from] io::Error),
}

/// Errors raised while reading a packet back.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("packet truncated: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },
    #[error("unsupported protocol version {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
}
