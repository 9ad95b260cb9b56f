//! Session state for the protocol engine.
//!
//! A [`Session`] owns the device identity, the registration status and the
//! fixed-capacity working buffers (transmit, receive, backchannel). Buffers
//! are cleared before each use and never retain stale content across
//! operations. The session is not safe for concurrent use; the engine runs
//! exactly one operation at a time.

use bytes::Bytes;

use crate::error::FrameError;
use crate::protocol::extract_backchannel;

/// Registration status of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationState {
    /// No registration has been attempted yet.
    #[default]
    Unregistered,
    /// The relay service acknowledged the last registration.
    Registered,
    /// A register or send procedure exhausted its retries; the next send
    /// re-registers.
    Failed,
}

impl RegistrationState {
    /// Returns true if the session currently counts as registered.
    #[must_use]
    pub const fn is_registered(self) -> bool {
        matches!(self, Self::Registered)
    }
}

/// Mutable session state owned by the client.
#[derive(Debug)]
pub struct Session {
    identity: Option<String>,
    registration: RegistrationState,
    capacity: usize,
    transmit_buf: Bytes,
    receive_buf: Vec<u8>,
    backchannel_buf: Vec<u8>,
}

impl Session {
    /// Creates an empty session with the given buffer capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            identity: None,
            registration: RegistrationState::default(),
            capacity,
            transmit_buf: Bytes::new(),
            receive_buf: Vec::with_capacity(capacity),
            backchannel_buf: Vec::new(),
        }
    }

    /// Sets the device identity (subscriber identifier).
    ///
    /// The identity is immutable once set; later calls are ignored.
    pub fn set_identity(&mut self, identity: impl Into<String>) {
        if self.identity.is_some() {
            tracing::warn!("device identity already set, ignoring");
            return;
        }
        self.identity = Some(identity.into());
    }

    /// Returns the device identity, if set.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Returns the current registration state.
    #[must_use]
    pub const fn registration(&self) -> RegistrationState {
        self.registration
    }

    /// Records the registration state.
    pub fn set_registration(&mut self, state: RegistrationState) {
        self.registration = state;
    }

    /// Returns true if the session is registered with the relay service.
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.registration.is_registered()
    }

    /// Stages an outgoing frame in the transmit buffer.
    ///
    /// The buffer is cleared first; a frame larger than the configured
    /// capacity is rejected before anything reaches the transport.
    pub fn stage_transmit(&mut self, frame: Bytes) -> Result<(), FrameError> {
        self.transmit_buf = Bytes::new();
        if frame.len() > self.capacity {
            return Err(FrameError::TooLarge {
                size: frame.len(),
                capacity: self.capacity,
            });
        }
        self.transmit_buf = frame;
        Ok(())
    }

    /// Returns the staged outgoing frame.
    #[must_use]
    pub fn transmit_frame(&self) -> Bytes {
        self.transmit_buf.clone()
    }

    /// Clears the receive buffer and exposes it for one transport read.
    pub fn prepare_receive(&mut self) -> &mut [u8] {
        self.receive_buf.clear();
        self.receive_buf.resize(self.capacity, 0);
        &mut self.receive_buf
    }

    /// Trims the receive buffer to the `len` bytes actually read.
    pub fn commit_receive(&mut self, len: usize) {
        self.receive_buf.truncate(len.min(self.capacity));
    }

    /// Returns the most recently received raw frame.
    #[must_use]
    pub fn received(&self) -> &[u8] {
        &self.receive_buf
    }

    /// Captures backchannel payload from the most recently received frame.
    ///
    /// The backchannel buffer is overwritten unconditionally: it holds the
    /// trailing payload of the received frame, or nothing.
    ///
    /// Returns the number of captured bytes.
    pub fn capture_backchannel(&mut self) -> usize {
        self.backchannel_buf.clear();
        if let Some(payload) = extract_backchannel(&self.receive_buf) {
            self.backchannel_buf.extend_from_slice(payload);
        }
        self.backchannel_buf.len()
    }

    /// Returns the current backchannel buffer content (may be empty).
    #[must_use]
    pub fn backchannel(&self) -> &[u8] {
        &self.backchannel_buf
    }

    /// Returns true if `needle` occurs contiguously in the backchannel buffer.
    #[must_use]
    pub fn backchannel_contains(&self, needle: &[u8]) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.backchannel_buf
            .windows(needle.len())
            .any(|window| window == needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FRAME_MARKER, build_data_frame};

    fn received(session: &mut Session, frame: &[u8]) {
        let buf = session.prepare_receive();
        buf[..frame.len()].copy_from_slice(frame);
        session.commit_receive(frame.len());
    }

    #[test]
    fn test_identity_set_once() {
        let mut session = Session::new(64);
        assert_eq!(session.identity(), None);

        session.set_identity("123451234512345");
        session.set_identity("other");
        assert_eq!(session.identity(), Some("123451234512345"));
    }

    #[test]
    fn test_default_state_is_unregistered() {
        let session = Session::new(64);
        assert_eq!(session.registration(), RegistrationState::Unregistered);
        assert!(!session.is_registered());
    }

    #[test]
    fn test_failed_state_counts_as_not_registered() {
        let mut session = Session::new(64);
        session.set_registration(RegistrationState::Failed);
        assert!(!session.is_registered());
    }

    #[test]
    fn test_stage_transmit_rejects_oversized_frame() {
        let mut session = Session::new(8);
        let result = session.stage_transmit(build_data_frame(b"0123456789"));
        assert!(result.is_err());
        assert!(session.transmit_frame().is_empty());
    }

    #[test]
    fn test_stage_transmit_replaces_previous_frame() {
        let mut session = Session::new(64);
        session.stage_transmit(build_data_frame(b"first")).unwrap();
        session.stage_transmit(build_data_frame(b"second")).unwrap();
        assert_eq!(&session.transmit_frame()[2..], b"second");
    }

    #[test]
    fn test_receive_buffer_cleared_between_reads() {
        let mut session = Session::new(64);
        received(&mut session, b"stale data");
        received(&mut session, b"ok");
        assert_eq!(session.received(), b"ok");
    }

    #[test]
    fn test_backchannel_overwritten_not_appended() {
        let mut session = Session::new(64);

        received(&mut session, &[FRAME_MARKER, 0x82, b'O', b'N']);
        assert_eq!(session.capture_backchannel(), 2);
        assert_eq!(session.backchannel(), b"ON");

        received(&mut session, &[FRAME_MARKER, 0x82]);
        assert_eq!(session.capture_backchannel(), 0);
        assert_eq!(session.backchannel(), b"");
    }

    #[test]
    fn test_backchannel_contains() {
        let mut session = Session::new(64);
        received(&mut session, &[FRAME_MARKER, 0x82, b'O', b'N']);
        session.capture_backchannel();

        assert!(session.backchannel_contains(b"ON"));
        assert!(session.backchannel_contains(b"O"));
        assert!(session.backchannel_contains(b""));
        assert!(!session.backchannel_contains(b"OFF"));
        assert!(!session.backchannel_contains(b"ONX"));
    }
}
