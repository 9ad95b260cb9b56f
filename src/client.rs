//! Main [`RelayClient`] implementation.
//!
//! This module provides the high-level [`RelayClient`] that combines the
//! transport, the session state and the frame codec into the protocol engine:
//! bounded-retry register and send procedures, acknowledgment polling and
//! backchannel capture.
//!
//! The engine is strictly sequential. Every protocol method takes `&mut self`,
//! so exactly one operation can be in flight at a time and no locking is
//! needed. Retry loops block the calling task for the configured pauses and
//! run to completion; callers needing cancellation must wrap the engine in an
//! external timeout.

use tokio::time::sleep;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::event::{Event, EventDispatcher, Operation, Subscription};
use crate::protocol::{self, build_data_frame, build_register_frame};
use crate::session::{RegistrationState, Session};
use crate::transport::{SerialTransport, Transport, serial::SerialConfig};

/// Event channel capacity; slow subscribers lag rather than block the engine.
const EVENT_CAPACITY: usize = 64;

/// Which acknowledgment an inner poll loop waits for.
#[derive(Debug, Clone, Copy)]
enum AckKind {
    Register,
    Send,
}

impl AckKind {
    fn matches(self, frame: &[u8]) -> bool {
        match self {
            Self::Register => protocol::is_register_ack(frame),
            Self::Send => protocol::is_send_ack(frame),
        }
    }

    const fn operation(self) -> Operation {
        match self {
            Self::Register => Operation::Register,
            Self::Send => Operation::Send,
        }
    }
}

/// Client for exchanging short messages with a narrowband relay service.
pub struct RelayClient<T> {
    transport: T,
    config: ClientConfig,
    session: Session,
    dispatcher: EventDispatcher,
}

impl RelayClient<SerialTransport> {
    /// Creates a new client for a serial modem link.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0")
    ///
    /// # Returns
    ///
    /// A new client (not yet connected).
    #[must_use]
    pub fn serial(port: impl Into<String>) -> Self {
        Self::with_serial_config(SerialConfig::new(port))
    }

    /// Creates a new client with custom serial configuration.
    #[must_use]
    pub fn with_serial_config(config: SerialConfig) -> Self {
        Self::new(SerialTransport::new(config), ClientConfig::default())
    }
}

impl<T: Transport> RelayClient<T> {
    /// Creates a new client with the given transport and configuration.
    #[must_use]
    pub fn new(transport: T, config: ClientConfig) -> Self {
        let session = Session::new(config.buffer_capacity);
        Self {
            transport,
            config,
            session,
            dispatcher: EventDispatcher::new(EVENT_CAPACITY),
        }
    }

    /// Connects the underlying transport.
    pub async fn connect(&mut self) -> Result<()> {
        self.transport.connect().await
    }

    /// Disconnects the underlying transport.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.transport.disconnect().await
    }

    /// Returns true if the transport is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Sets the device identity (subscriber identifier, e.g. the SIM IMSI).
    ///
    /// Must be called before the first register or send. The identity is
    /// immutable once set.
    pub fn set_identity(&mut self, identity: impl Into<String>) {
        self.session.set_identity(identity);
    }

    /// Returns the current registration state.
    #[must_use]
    pub const fn registration(&self) -> RegistrationState {
        self.session.registration()
    }

    /// Returns true if the session is registered with the relay service.
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.session.is_registered()
    }

    /// Subscribes to diagnostic progress events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.dispatcher.subscribe()
    }

    // ==================== Registration ====================

    /// Registers the device identity with the relay service.
    ///
    /// Sends a register frame and polls for the registration acknowledgment,
    /// retrying the whole send+poll sequence up to the configured attempt
    /// bound. Records the outcome on the session.
    ///
    /// # Errors
    ///
    /// [`Error::IdentityUnset`] if no identity was set,
    /// [`Error::NoAcknowledge`] if the relay never confirmed within the retry
    /// budget, [`Error::ServerUnreachable`] if the transport send itself kept
    /// failing.
    pub async fn register(&mut self) -> Result<()> {
        let result = self.register_procedure().await;
        self.record_registration(&result);
        result
    }

    /// Runs the register procedure without touching the session state.
    ///
    /// Both public callers record the outcome themselves.
    async fn register_procedure(&mut self) -> Result<()> {
        let identity = self
            .session
            .identity()
            .ok_or(Error::IdentityUnset)?
            .to_owned();

        tracing::info!(identity = %identity, "registering with relay service");
        self.session.stage_transmit(build_register_frame(&identity))?;
        self.run_procedure(AckKind::Register).await
    }

    fn record_registration(&mut self, result: &Result<()>) {
        let state = if result.is_ok() {
            RegistrationState::Registered
        } else {
            RegistrationState::Failed
        };
        self.session.set_registration(state);
    }

    // ==================== Message sending ====================

    /// Sends a user payload to the relay service.
    ///
    /// Registers first if the session is not currently registered; a
    /// registration failure is returned directly and no data frame is built
    /// or transmitted. On a successful send acknowledgment the backchannel
    /// buffer is refreshed from the received frame. Retry exhaustion forces
    /// re-registration on the next call.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`register`](Self::register).
    pub async fn send_message(&mut self, payload: &[u8]) -> Result<()> {
        if self.session.is_registered() {
            tracing::debug!("already registered, no registration needed");
        } else {
            tracing::debug!("registration with the relay service needed");
            let registration = self.register_procedure().await;
            self.record_registration(&registration);
            registration?;
        }

        self.session.stage_transmit(build_data_frame(payload))?;
        match self.run_procedure(AckKind::Send).await {
            Ok(()) => {
                self.check_backchannel();
                Ok(())
            }
            Err(e) => {
                // Force re-registration on the next send
                self.session.set_registration(RegistrationState::Failed);
                Err(e)
            }
        }
    }

    // ==================== Retry engine ====================

    /// Runs one bounded-retry procedure on the staged frame: up to
    /// `max_retries` transmit attempts, each successful transmit followed by
    /// up to `max_retries` acknowledgment polls, with fixed pauses throughout.
    async fn run_procedure(&mut self, kind: AckKind) -> Result<()> {
        let operation = kind.operation();
        let attempts = self.config.max_retries;
        let mut last = Error::NoAcknowledge { attempts };

        for attempt in 1..=attempts {
            self.dispatcher
                .dispatch(Event::AttemptStarted { operation, attempt });

            match self.transmit().await {
                Ok(()) => {
                    if self.await_ack(kind).await {
                        tracing::debug!(?operation, attempt, "acknowledged by relay service");
                        self.dispatcher.dispatch(Event::Succeeded { operation });
                        return Ok(());
                    }
                    last = Error::NoAcknowledge { attempts };
                }
                Err(e) => {
                    tracing::debug!(?operation, attempt, error = %e, "frame not sendable");
                    self.dispatcher
                        .dispatch(Event::SendFailed { operation, attempt });
                    last = Error::ServerUnreachable { attempts };
                }
            }

            if attempt < attempts {
                sleep(self.config.retry_interval).await;
            }
        }

        tracing::warn!(?operation, attempts, "retry budget exhausted");
        self.dispatcher.dispatch(Event::Exhausted { operation });
        Err(last)
    }

    /// Sends the staged frame, pausing `send_delay` after a successful write.
    async fn transmit(&mut self) -> Result<()> {
        let frame = self.session.transmit_frame();
        tracing::trace!(frame = %hex::encode(&frame), "tx");
        self.transport.send(frame).await?;
        sleep(self.config.send_delay).await;
        Ok(())
    }

    /// Polls the transport for the expected acknowledgment.
    ///
    /// A receive failure or an unrecognized frame counts as a missed poll,
    /// not a hard error. Returns true as soon as the acknowledgment arrives.
    async fn await_ack(&mut self, kind: AckKind) -> bool {
        let operation = kind.operation();
        let polls = self.config.max_retries;

        for poll in 1..=polls {
            match self.transport.receive(self.session.prepare_receive()).await {
                Ok(n) => {
                    self.session.commit_receive(n);
                    let frame = self.session.received();
                    tracing::trace!(frame = %hex::encode(frame), "rx");
                    if kind.matches(frame) {
                        return true;
                    }
                }
                Err(e) => {
                    self.session.commit_receive(0);
                    tracing::trace!(error = %e, "receive failed");
                }
            }

            tracing::debug!(?operation, poll, "no acknowledgment yet, polling again");
            self.dispatcher.dispatch(Event::AckMissed { operation, poll });

            if poll < polls {
                sleep(self.config.retry_interval).await;
            }
        }

        false
    }

    // ==================== Backchannel ====================

    /// Captures backchannel payload from the just-received ack frame.
    fn check_backchannel(&mut self) {
        let len = self.session.capture_backchannel();
        if len > 0 {
            tracing::debug!(
                payload = %String::from_utf8_lossy(self.session.backchannel()),
                "backchannel payload received from relay service"
            );
            self.dispatcher.dispatch(Event::BackchannelReceived { len });
        } else {
            tracing::debug!("no backchannel payload received from relay service");
            self.dispatcher.dispatch(Event::BackchannelEmpty);
        }
    }

    /// Returns true if `needle` occurs contiguously in the backchannel buffer.
    ///
    /// Pure query; does not trigger a receive.
    #[must_use]
    pub fn contains_backchannel(&self, needle: impl AsRef<[u8]>) -> bool {
        self.session.backchannel_contains(needle.as_ref())
    }

    /// Returns the current backchannel buffer content verbatim (may be empty).
    #[must_use]
    pub fn backchannel(&self) -> &[u8] {
        self.session.backchannel()
    }
}
