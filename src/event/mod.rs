//! Diagnostic event stream for protocol progress.
//!
//! The engine emits an [`Event`] at defined transition points (attempt
//! started, attempt failed, final outcome) so embedding code can surface
//! progress without the core logic carrying output concerns. Subscribing is
//! optional; dispatch is fire-and-forget and never blocks a retry loop.

use tokio::sync::broadcast;

/// The protocol operation an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Registration with the relay service.
    Register,
    /// User payload delivery.
    Send,
}

/// Progress events dispatched by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An outer send attempt is starting (1-based attempt counter).
    AttemptStarted { operation: Operation, attempt: u32 },
    /// The transport failed to send the frame.
    SendFailed { operation: Operation, attempt: u32 },
    /// An acknowledgment poll came back without the expected ack.
    AckMissed { operation: Operation, poll: u32 },
    /// The operation was acknowledged by the relay service.
    Succeeded { operation: Operation },
    /// The operation exhausted its retry budget.
    Exhausted { operation: Operation },
    /// A send acknowledgment carried backchannel payload.
    BackchannelReceived { len: usize },
    /// A send acknowledgment carried no backchannel payload.
    BackchannelEmpty,
}

/// A subscription to engine events.
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Receives the next event.
    ///
    /// Returns `None` once the dispatching client is dropped.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Dispatches events to subscribers.
#[derive(Clone)]
pub struct EventDispatcher {
    sender: broadcast::Sender<Event>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Dispatches an event to all subscribers.
    pub fn dispatch(&self, event: Event) {
        // Broadcast to all subscribers (ignore send errors - no receivers is fine)
        let _ = self.sender.send(event);
    }

    /// Subscribes to events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_dispatch() {
        let dispatcher = EventDispatcher::new(16);
        let mut sub = dispatcher.subscribe();

        dispatcher.dispatch(Event::Succeeded {
            operation: Operation::Register,
        });

        let event = tokio::time::timeout(std::time::Duration::from_millis(100), sub.recv())
            .await
            .unwrap();

        assert_eq!(
            event,
            Some(Event::Succeeded {
                operation: Operation::Register
            })
        );
    }

    #[test]
    fn test_dispatch_without_subscribers() {
        let dispatcher = EventDispatcher::new(16);
        dispatcher.dispatch(Event::BackchannelEmpty);
    }
}
