// Queue Gateway Port
// Remote operations against the REST proxy, transport-agnostic

use crate::domain::ConsumerInstanceHandle;
use async_trait::async_trait;
use thiserror::Error;

/// Remote operation that a gateway error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    CreateInstance,
    DestroyInstance,
    Subscribe,
    Unsubscribe,
    Poll,
    Commit,
    CheckConnectivity,
}

impl GatewayOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayOperation::CreateInstance => "create_instance",
            GatewayOperation::DestroyInstance => "destroy_instance",
            GatewayOperation::Subscribe => "subscribe",
            GatewayOperation::Unsubscribe => "unsubscribe",
            GatewayOperation::Poll => "poll",
            GatewayOperation::Commit => "commit",
            GatewayOperation::CheckConnectivity => "check_connectivity",
        }
    }
}

impl std::fmt::Display for GatewayOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote operation failure
#[derive(Error, Debug, Clone)]
#[error("{operation} failed: {cause}")]
pub struct GatewayError {
    pub operation: GatewayOperation,
    pub cause: String,
}

impl GatewayError {
    pub fn new(operation: GatewayOperation, cause: impl Into<String>) -> Self {
        Self {
            operation,
            cause: cause.into(),
        }
    }
}

/// Queue Gateway trait
///
/// Implementations:
/// - KafkaRestGateway: HTTP against a REST proxy (infra-http crate)
/// - MockQueueGateway: in-memory, for tests
#[async_trait]
pub trait QueueGateway: Send + Sync {
    /// Provision a consumer instance bound to the configured group and offset policy
    async fn create_instance(&self) -> Result<ConsumerInstanceHandle, GatewayError>;

    /// Release the instance; callers log failures and never retry
    async fn destroy_instance(&self, handle: &ConsumerInstanceHandle) -> Result<(), GatewayError>;

    /// Attach the instance to the configured topic
    async fn subscribe(&self, handle: &ConsumerInstanceHandle) -> Result<(), GatewayError>;

    /// Detach the instance before destruction
    async fn unsubscribe(&self, handle: &ConsumerInstanceHandle) -> Result<(), GatewayError>;

    /// Fetch pending records as the raw envelope bytes
    async fn poll(&self, handle: &ConsumerInstanceHandle) -> Result<Vec<u8>, GatewayError>;

    /// Advance committed offsets to the last consumed position
    async fn commit(&self, handle: &ConsumerInstanceHandle) -> Result<(), GatewayError>;

    /// Lightweight health probe, independent of any instance
    async fn check_connectivity(&self) -> Result<(), GatewayError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;

    /// Build a poll envelope whose records carry the given payload texts
    pub fn envelope(payloads: &[&str]) -> Vec<u8> {
        let records: Vec<_> = payloads
            .iter()
            .enumerate()
            .map(|(offset, payload)| {
                serde_json::json!({
                    "value": STANDARD.encode(payload),
                    "partition": 0,
                    "offset": offset
                })
            })
            .collect();
        serde_json::to_vec(&records).unwrap()
    }

    #[derive(Default)]
    struct MockState {
        calls: Vec<GatewayOperation>,
        failing: HashSet<GatewayOperation>,
        panicking: HashSet<GatewayOperation>,
        responses: VecDeque<Vec<u8>>,
        created: usize,
    }

    /// Mock Queue Gateway for testing
    ///
    /// Records every call; any operation can be made to fail or panic.
    /// `poll` drains queued responses, then returns an empty envelope.
    #[derive(Default)]
    pub struct MockQueueGateway {
        state: Mutex<MockState>,
    }

    impl MockQueueGateway {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make an operation fail until `recover` is called
        pub fn fail(&self, op: GatewayOperation) {
            self.state.lock().unwrap().failing.insert(op);
        }

        /// Make an operation panic (for fault containment testing)
        pub fn panic_on(&self, op: GatewayOperation) {
            self.state.lock().unwrap().panicking.insert(op);
        }

        pub fn recover(&self, op: GatewayOperation) {
            let mut state = self.state.lock().unwrap();
            state.failing.remove(&op);
            state.panicking.remove(&op);
        }

        /// Queue raw bytes for the next poll
        pub fn push_response(&self, bytes: Vec<u8>) {
            self.state.lock().unwrap().responses.push_back(bytes);
        }

        pub fn calls(&self) -> Vec<GatewayOperation> {
            self.state.lock().unwrap().calls.clone()
        }

        pub fn call_count(&self, op: GatewayOperation) -> usize {
            self.state
                .lock()
                .unwrap()
                .calls
                .iter()
                .filter(|c| **c == op)
                .count()
        }

        pub fn instances_created(&self) -> usize {
            self.state.lock().unwrap().created
        }

        fn record(&self, op: GatewayOperation) -> Result<(), GatewayError> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(op);
            if state.panicking.contains(&op) {
                drop(state);
                panic!("mock gateway panicked during {}", op);
            }
            if state.failing.contains(&op) {
                return Err(GatewayError::new(op, "mock failure"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl QueueGateway for MockQueueGateway {
        async fn create_instance(&self) -> Result<ConsumerInstanceHandle, GatewayError> {
            self.record(GatewayOperation::CreateInstance)?;
            let mut state = self.state.lock().unwrap();
            state.created += 1;
            let id = format!("mock-instance-{}", state.created);
            Ok(ConsumerInstanceHandle::new(
                id.clone(),
                format!("http://mock/consumers/group/instances/{}", id),
            ))
        }

        async fn destroy_instance(
            &self,
            _handle: &ConsumerInstanceHandle,
        ) -> Result<(), GatewayError> {
            self.record(GatewayOperation::DestroyInstance)
        }

        async fn subscribe(&self, _handle: &ConsumerInstanceHandle) -> Result<(), GatewayError> {
            self.record(GatewayOperation::Subscribe)
        }

        async fn unsubscribe(&self, _handle: &ConsumerInstanceHandle) -> Result<(), GatewayError> {
            self.record(GatewayOperation::Unsubscribe)
        }

        async fn poll(&self, _handle: &ConsumerInstanceHandle) -> Result<Vec<u8>, GatewayError> {
            self.record(GatewayOperation::Poll)?;
            let next = self.state.lock().unwrap().responses.pop_front();
            Ok(next.unwrap_or_else(|| b"[]".to_vec()))
        }

        async fn commit(&self, _handle: &ConsumerInstanceHandle) -> Result<(), GatewayError> {
            self.record(GatewayOperation::Commit)
        }

        async fn check_connectivity(&self) -> Result<(), GatewayError> {
            self.record(GatewayOperation::CheckConnectivity)
        }
    }
}
