//! # nblink
//!
//! A Rust client library for narrowband IoT relay services.
//!
//! This library lets a resource-constrained device register with, and
//! exchange short messages over, a remote relay service reachable through a
//! cellular modem on a serial link. The relay service may push data back to
//! the device ("backchannel") piggybacked on a send acknowledgment.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Bounded-retry register and send procedures with fixed pacing
//! - Backchannel payload capture from send acknowledgments
//! - Diagnostic event stream for protocol progress
//!
//! ## Quick Start
//!
//! ```no_run
//! use nblink::RelayClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nblink::Error> {
//!     // Connect to the modem
//!     let mut client = RelayClient::serial("/dev/ttyUSB0");
//!     client.set_identity("123451234512345");
//!     client.connect().await?;
//!
//!     // Send a reading; registration happens lazily on the first send
//!     client.send_message(b"temp=21.5").await?;
//!
//!     // Anything the relay piggybacked on the acknowledgment
//!     if client.contains_backchannel("ON") {
//!         println!("relay requested: ON");
//!     }
//!
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`protocol`] - Frame building, acknowledgment recognition, backchannel extraction
//! - [`session`] - Registration state and fixed-capacity working buffers
//! - [`transport`] - Transport trait and the serial modem link
//! - [`event`] - Diagnostic event stream
//! - [`config`] - Retry and buffer configuration
//! - [`client`] - High-level [`RelayClient`]

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use client::RelayClient;
pub use config::ClientConfig;
pub use error::{Error, FrameError, Result};
pub use event::{Event, EventDispatcher, Operation, Subscription};
pub use protocol::{FRAME_MARKER, HEADER_LEN, Opcode};
pub use session::{RegistrationState, Session};
pub use transport::{SerialTransport, Transport, serial::list_ports};
