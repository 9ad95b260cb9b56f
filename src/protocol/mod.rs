//! Protocol definitions for relay-service communication.
//!
//! This module contains the low-level protocol pieces:
//! - Frame building and acknowledgment recognition
//! - Backchannel payload extraction

pub mod frame;
pub mod payload;

pub use frame::{
    FRAME_MARKER, HEADER_LEN, Opcode, build_data_frame, build_register_frame, is_register_ack,
    is_send_ack,
};
pub use payload::extract_backchannel;
