// Domain Layer - Pure consumer entities and the wire envelope

pub mod envelope;
pub mod error;
pub mod instance;
pub mod message;
pub mod queue;

// Re-exports
pub use envelope::{decode_batch, decode_message};
pub use error::DecodeError;
pub use instance::ConsumerInstanceHandle;
pub use message::{Batch, Message};
pub use queue::{OffsetReset, QueueConfig};
