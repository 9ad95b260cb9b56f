//! Error types for the nblink library.

use thiserror::Error;

/// The main error type for nblink operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Serial port error.
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame building error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The relay service never acknowledged within the retry budget.
    ///
    /// Recoverable; the next send re-runs the full procedure.
    #[error("no acknowledgment from relay service within {attempts} attempts")]
    NoAcknowledge { attempts: u32 },

    /// Transport-level send kept failing through all retries.
    ///
    /// Recoverable; usually a connectivity outage on the cellular link.
    #[error("relay service unreachable after {attempts} send attempts")]
    ServerUnreachable { attempts: u32 },

    /// Receive timed out waiting for a response frame.
    #[error("receive timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Device identity has not been set.
    #[error("device identity not set")]
    IdentityUnset,

    /// Connection is not established.
    #[error("not connected")]
    NotConnected,
}

/// Frame-specific errors.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Frame does not fit the fixed-capacity working buffer.
    #[error("frame too large: {size} bytes exceeds buffer capacity {capacity}")]
    TooLarge { size: usize, capacity: usize },
}

/// Result type alias for nblink operations.
pub type Result<T> = std::result::Result<T, Error>;
