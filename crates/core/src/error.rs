// Central Error Type for the Consumer

use thiserror::Error;

/// Application-level error type
///
/// Every variant except `InvalidState` is recoverable: the controller tears
/// down its consumer instance and retries on the next cycle.
#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] crate::port::GatewayError),

    #[error("Decode error: {0}")]
    Decode(#[from] crate::domain::DecodeError),

    #[error("Runtime fault: {0}")]
    RuntimeFault(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ConsumerError {
    /// True for errors raised by a remote gateway operation
    pub fn is_gateway(&self) -> bool {
        matches!(self, ConsumerError::Gateway(_))
    }
}

/// Result type alias using ConsumerError
pub type Result<T> = std::result::Result<T, ConsumerError>;
