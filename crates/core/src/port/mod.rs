// Port Layer - Interfaces for external dependencies

pub mod message_processor;
pub mod queue_gateway;

// Re-exports
pub use message_processor::{BatchedMessageProcessor, MessageProcessor, SplitMessageProcessor};
pub use queue_gateway::{GatewayError, GatewayOperation, QueueGateway};
