// Message Domain Model

use std::collections::HashMap;

/// Decoded unit of data delivered to a processor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Message {
    pub fn new(headers: HashMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Look up a header value by key
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// True for the placeholder produced when a payload could not be decoded
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.body.is_empty()
    }
}

/// Messages returned by a single poll, in gateway order
pub type Batch = Vec<Message>;
