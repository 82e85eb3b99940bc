// Consumer Instance Handle

use serde::Deserialize;

/// Opaque reference to a remote consumer instance.
///
/// Returned by the gateway on creation and required by every
/// instance-scoped operation afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsumerInstanceHandle {
    pub instance_id: String,
    pub base_uri: String,
}

impl ConsumerInstanceHandle {
    pub fn new(instance_id: impl Into<String>, base_uri: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            base_uri: base_uri.into(),
        }
    }
}

impl std::fmt::Display for ConsumerInstanceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.instance_id)
    }
}
