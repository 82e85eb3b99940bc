// Restq Infrastructure - HTTP Adapter
// Implements: QueueGateway against a Kafka REST proxy (v2 API)

mod client;
mod gateway;

pub use client::{build_client, DEFAULT_HTTP_TIMEOUT};
pub use gateway::KafkaRestGateway;
