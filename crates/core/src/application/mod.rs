// Application Layer - Consume loop, dispatch and lifecycle

pub mod consumer;
pub mod dispatch;
pub mod instance;

// Re-exports
pub use consumer::MessageConsumer;
pub use dispatch::DispatchMode;
pub use instance::{shutdown_channel, ConsumerInstance, InstanceState, ShutdownSender, ShutdownToken};
