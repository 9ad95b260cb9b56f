//! Backchannel payload extraction.
//!
//! The relay service may piggyback payload for the device on a send
//! acknowledgment. Anything after the fixed frame header is backchannel
//! content.

use super::frame::HEADER_LEN;

/// Extracts the backchannel payload from a raw frame.
///
/// Returns `None` when the frame carries nothing beyond the protocol header.
#[must_use]
pub fn extract_backchannel(frame: &[u8]) -> Option<&[u8]> {
    if frame.len() > HEADER_LEN {
        Some(&frame[HEADER_LEN..])
    } else {
        None
    }
}
