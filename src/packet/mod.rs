//! Binary wire format for a single log event.
//!
//! Every packet is one self-contained UDP payload laid out in network byte
//! order:
//!
//! ```text
//! version:u8 reserved:u8 timestamp_ms:i64 level:u8 event_id:i32 local_ip:[u8; 4]
//! assembly_len:u8 assembly:[u8] message_len:u32 message:[u8]
//! ```
//!
//! [`encode`] builds that layout from a [`LogEvent`](crate::log_event::LogEvent)
//! and [`DecodedPacket::parse`] reads it back on the collector side.

mod decode;
mod encode;


pub use decode::DecodedPacket;
pub use encode::{encode, encoded_len};

/// Protocol version written into byte 0.
pub const PROTOCOL_VERSION: u8 = 0x01;
/// Bytes occupied by every fixed-width field.
pub const FIXED_HEADER_LEN: usize = 24;
/// Largest origin name the one-byte length prefix can describe.
pub const MAX_ASSEMBLY_NAME_LEN: usize = u8::MAX as usize;
