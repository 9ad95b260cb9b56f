//! Serial transport implementation.
//!
//! This module provides communication with a cellular modem attached over
//! USB/serial. The modem is driven strictly request/response, so the
//! transport owns its stream directly; there are no split halves and no
//! background read task.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Default baud rate for modem links.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default settle time after opening the port before the modem is usable.
pub const DEFAULT_CONNECTION_DELAY: Duration = Duration::from_millis(300);

/// Default deadline for a single receive call.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for the serial modem link.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Serial device path of the modem (e.g., "/dev/ttyUSB0" or "COM3").
    pub port: String,
    /// Baud rate of the modem link.
    pub baud_rate: u32,
    /// Settle time after opening the port before frames are sent.
    pub connection_delay: Duration,
    /// Deadline for a single receive call.
    pub read_timeout: Duration,
}

impl SerialConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            connection_delay: DEFAULT_CONNECTION_DELAY,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Sets the baud rate.
    #[must_use]
    pub const fn baud_rate(mut self, rate: u32) -> Self {
        self.baud_rate = rate;
        self
    }

    /// Sets the settle time after opening the port.
    #[must_use]
    pub const fn connection_delay(mut self, delay: Duration) -> Self {
        self.connection_delay = delay;
        self
    }

    /// Sets the receive deadline.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// Serial transport for the modem link.
pub struct SerialTransport {
    config: SerialConfig,
    stream: Option<SerialStream>,
}

impl SerialTransport {
    /// Creates a new serial transport with the given configuration.
    #[must_use]
    pub fn new(config: SerialConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    /// Creates a new serial transport for the given port with default settings.
    #[must_use]
    pub fn with_port(port: impl Into<String>) -> Self {
        Self::new(SerialConfig::new(port))
    }
}

impl Transport for SerialTransport {
    fn connect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.stream.is_some() {
                return Ok(());
            }

            tracing::info!(port = %self.config.port, "opening modem link");

            let mut stream = tokio_serial::new(&self.config.port, self.config.baud_rate)
                .open_native_async()
                .map_err(Error::Serial)?;

            // Modems expect RTS deasserted before the first frame
            if let Err(e) = tokio_serial::SerialPort::write_request_to_send(&mut stream, false) {
                tracing::warn!(error = %e, "could not deassert RTS");
            }

            tokio::time::sleep(self.config.connection_delay).await;

            // Discard unsolicited result codes the modem may emit after open,
            // so the first acknowledgment poll does not see stale bytes.
            // The line counts as quiet after five consecutive empty reads.
            let mut scratch = [0u8; 256];
            let mut discarded = 0usize;
            let mut quiet = 0u8;
            while quiet < 5 {
                match tokio::time::timeout(Duration::from_millis(20), stream.read(&mut scratch))
                    .await
                {
                    Ok(Ok(n)) if n > 0 => {
                        discarded += n;
                        quiet = 0;
                    }
                    _ => quiet += 1,
                }
            }
            if discarded > 0 {
                tracing::debug!(discarded, "discarded stale modem output");
            }

            self.stream = Some(stream);

            tracing::info!("modem link ready");
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.stream.take().is_some() {
                tracing::info!("modem link closed");
            }
            Ok(())
        })
    }

    fn send(&mut self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

            tracing::trace!(len = data.len(), "writing frame to modem");

            stream.write_all(&data).await.map_err(Error::Io)?;
            stream.flush().await.map_err(Error::Io)?;

            Ok(())
        })
    }

    fn receive<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + 'a>> {
        Box::pin(async move {
            let deadline = self.config.read_timeout;
            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

            match tokio::time::timeout(deadline, stream.read(buf)).await {
                Ok(Ok(0)) => Err(Error::Io(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "modem link closed",
                ))),
                Ok(Ok(n)) => {
                    tracing::trace!(len = n, "read frame from modem");
                    Ok(n)
                }
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "modem read failed");
                    Err(Error::Io(e))
                }
                Err(_) => Err(Error::Timeout {
                    timeout_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                }),
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// Lists serial ports that may host a modem.
///
/// # Errors
///
/// Returns an error if the port list cannot be retrieved.
pub fn list_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().map_err(Error::Serial)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
