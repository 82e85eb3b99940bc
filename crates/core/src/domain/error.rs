// Domain Error Types

use thiserror::Error;

/// Raised when the outer poll envelope cannot be parsed.
///
/// Per-record payload problems never produce this error; they degrade to an
/// empty message instead.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::MalformedEnvelope(err.to_string())
    }
}
