// Message Processor Port
// Sink supplied by the embedding application

use crate::domain::{Batch, Message};
use async_trait::async_trait;

/// Accepts a batch of decoded messages.
///
/// No return value and no error channel: handler failures are the
/// embedding application's business. Under fan-out dispatch the processor
/// is invoked concurrently, once per message, so implementations must be
/// safe to call from several tasks at once.
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    async fn consume(&self, messages: Batch);
}

/// Invokes a handler once per message
pub struct SplitMessageProcessor<F>
where
    F: Fn(Message) + Send + Sync,
{
    handler: F,
}

impl<F> SplitMessageProcessor<F>
where
    F: Fn(Message) + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<F> MessageProcessor for SplitMessageProcessor<F>
where
    F: Fn(Message) + Send + Sync,
{
    async fn consume(&self, messages: Batch) {
        for message in messages {
            (self.handler)(message);
        }
    }
}

/// Invokes a handler once per batch
pub struct BatchedMessageProcessor<F>
where
    F: Fn(Batch) + Send + Sync,
{
    handler: F,
}

impl<F> BatchedMessageProcessor<F>
where
    F: Fn(Batch) + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<F> MessageProcessor for BatchedMessageProcessor<F>
where
    F: Fn(Batch) + Send + Sync,
{
    async fn consume(&self, messages: Batch) {
        (self.handler)(messages);
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every invocation; can simulate slow or panicking handlers
    #[derive(Default)]
    pub struct RecordingProcessor {
        invocations: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        received: Mutex<Vec<Message>>,
        delay: Option<Duration>,
        panic_on_body: Option<String>,
    }

    impl RecordingProcessor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Hold each invocation open for `delay`
        pub fn with_delay(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        /// Panic when a message with this body is consumed
        pub fn panicking_on(body: impl Into<String>) -> Self {
            Self {
                panic_on_body: Some(body.into()),
                ..Self::default()
            }
        }

        pub fn invocations(&self) -> usize {
            self.invocations.load(Ordering::SeqCst)
        }

        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        pub fn received(&self) -> Vec<Message> {
            self.received.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageProcessor for RecordingProcessor {
        async fn consume(&self, messages: Batch) {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some(body) = &self.panic_on_body {
                if messages.iter().any(|m| &m.body == body) {
                    panic!("processor rejected message {}", body);
                }
            }
            self.received.lock().unwrap().extend(messages);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn batch(bodies: &[&str]) -> Batch {
        bodies
            .iter()
            .map(|b| Message::new(HashMap::new(), *b))
            .collect()
    }

    #[tokio::test]
    async fn test_split_processor_invokes_per_message() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let processor = SplitMessageProcessor::new(move |m: Message| {
            sink.lock().unwrap().push(m.body);
        });

        processor.consume(batch(&["{1}", "{2}", "{3}"])).await;

        assert_eq!(*seen.lock().unwrap(), vec!["{1}", "{2}", "{3}"]);
    }

    #[tokio::test]
    async fn test_batched_processor_invokes_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let processor = BatchedMessageProcessor::new(move |msgs: Batch| {
            sink.lock().unwrap().push(msgs.len());
        });

        processor.consume(batch(&["{1}", "{2}"])).await;
        processor.consume(batch(&[])).await;

        assert_eq!(*calls.lock().unwrap(), vec![2, 0]);
    }
}
