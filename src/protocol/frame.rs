//! Frame building and acknowledgment recognition for the relay-service protocol.
//!
//! Every frame starts with a fixed two-byte header:
//! ```text
//! ┌──────────┬──────────┬─────────────────┐
//! │  0x56    │  opcode  │    payload      │
//! │  1 byte  │  1 byte  │    remainder    │
//! └──────────┴──────────┴─────────────────┘
//! ```
//!
//! Outgoing register and data frames carry the device identity and the user
//! payload respectively. Acknowledgment frames from the relay service may
//! carry backchannel payload after the header.

use bytes::{BufMut, Bytes, BytesMut};

/// Frame marker byte, first byte of every frame.
pub const FRAME_MARKER: u8 = 0x56;

/// Fixed header length (marker + opcode).
pub const HEADER_LEN: usize = 2;

/// Frame opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Register the device identity with the relay service.
    Register = 0x01,
    /// Deliver a user payload to the relay service.
    Data = 0x02,
    /// Relay-service confirmation of a register frame.
    RegisterAck = 0x81,
    /// Relay-service confirmation of a data frame.
    DataAck = 0x82,
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self {
        opcode as Self
    }
}

fn build(opcode: Opcode, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u8(FRAME_MARKER);
    buf.put_u8(opcode.into());
    buf.put_slice(payload);
    buf.freeze()
}

/// Builds a registration frame from the device identity.
#[must_use]
pub fn build_register_frame(identity: &str) -> Bytes {
    build(Opcode::Register, identity.as_bytes())
}

/// Builds a data frame from a user payload.
#[must_use]
pub fn build_data_frame(payload: &[u8]) -> Bytes {
    build(Opcode::Data, payload)
}

fn is_ack(frame: &[u8], opcode: Opcode) -> bool {
    frame.len() >= HEADER_LEN && frame[0] == FRAME_MARKER && frame[1] == u8::from(opcode)
}

/// Returns true if the frame is a positive registration acknowledgment.
#[must_use]
pub fn is_register_ack(frame: &[u8]) -> bool {
    is_ack(frame, Opcode::RegisterAck)
}

/// Returns true if the frame is a positive send acknowledgment.
#[must_use]
pub fn is_send_ack(frame: &[u8]) -> bool {
    is_ack(frame, Opcode::DataAck)
}
