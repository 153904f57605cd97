//! Packet serialisation.

use std::net::Ipv4Addr;

use crate::{error::PacketError, log_event::LogEvent};

use super::{FIXED_HEADER_LEN, MAX_ASSEMBLY_NAME_LEN, PROTOCOL_VERSION};

/// Total packet size for the given variable-length fields.
pub fn encoded_len(assembly_len: usize, message_len: usize) -> usize {
    FIXED_HEADER_LEN + assembly_len + message_len
}

/// Serialise `event` into a packet stamped with `local_ip`.
///
/// The output depends only on the inputs, so identical calls yield identical
/// bytes. Nothing is written when a field cannot be represented: an origin
/// name over 255 bytes, an unconvertible `EventID`, or a message longer than
/// `u32::MAX` bytes.
pub fn encode(event: &LogEvent, local_ip: Ipv4Addr) -> Result<Vec<u8>, PacketError> {
    let assembly = event.origin.as_bytes();
    if assembly.len() > MAX_ASSEMBLY_NAME_LEN {
        return Err(PacketError::AssemblyNameTooLong {
            len: assembly.len(),
        });
    }
    let assembly_len = assembly.len() as u8;
    let message = event.message.as_bytes();
    let message_len = u32::try_from(message.len()).map_err(|_| PacketError::MessageTooLong {
        len: message.len(),
    })?;
    let event_id = event.event_id()?;

    let mut packet = Vec::with_capacity(encoded_len(assembly.len(), message.len()));
    packet.push(PROTOCOL_VERSION);
    packet.push(0);
    packet.extend(event.timestamp.timestamp_millis().to_be_bytes());
    packet.push(event.level.wire_byte());
    packet.extend(event_id.to_be_bytes());
    packet.extend(local_ip.octets());
    packet.push(assembly_len);
    packet.extend_from_slice(assembly);
    packet.extend(message_len.to_be_bytes());
    packet.extend_from_slice(message);
    Ok(packet)
}
