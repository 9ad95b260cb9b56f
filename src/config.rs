//! Client configuration.

use std::time::Duration;

/// Default outer attempt bound for the register and send procedures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default pause between acknowledgment polls and between send retries.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(6_500);

/// Default pause after a successful transmit.
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_millis(500);

/// Default capacity of the transmit/receive/backchannel working buffers.
pub const DEFAULT_BUFFER_CAPACITY: usize = 512;

/// Configuration for the protocol engine.
///
/// The retry policy is deliberately uniform: register and send share the same
/// attempt bound and the same fixed pause, with no backoff growth.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Outer attempt bound for the register and send procedures.
    /// Also bounds the inner acknowledgment poll loop.
    pub max_retries: u32,
    /// Fixed pause between acknowledgment polls and between send retries.
    pub retry_interval: Duration,
    /// Pause after a successful transmit before polling for a response.
    pub send_delay: Duration,
    /// Capacity of the transmit, receive and backchannel buffers.
    pub buffer_capacity: usize,
}

impl ClientConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            send_delay: DEFAULT_SEND_DELAY,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Sets the outer attempt bound.
    #[must_use]
    pub const fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the pause between retries and acknowledgment polls.
    #[must_use]
    pub const fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Sets the pause after a successful transmit.
    #[must_use]
    pub const fn send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    /// Sets the working buffer capacity.
    #[must_use]
    pub const fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.retry_interval, DEFAULT_RETRY_INTERVAL);
        assert_eq!(config.send_delay, DEFAULT_SEND_DELAY);
        assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new()
            .max_retries(5)
            .retry_interval(Duration::from_millis(100))
            .send_delay(Duration::ZERO)
            .buffer_capacity(64);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_interval, Duration::from_millis(100));
        assert_eq!(config.send_delay, Duration::ZERO);
        assert_eq!(config.buffer_capacity, 64);
    }
}
