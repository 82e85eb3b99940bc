// Queue Domain Model

use crate::error::{ConsumerError, Result};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Backoff applied after an empty or failed cycle when none is configured (seconds)
pub const DEFAULT_BACKOFF_PERIOD_SECS: u64 = 8;

/// Fan-out worker count when none is configured
pub const DEFAULT_PROCESSOR_COUNT: usize = 100;

/// Where a new consumer group starts reading when it has no committed offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetReset {
    /// Fails on the proxy side if no previous offset exists
    None,
    /// Replays the whole topic; heavy on proxy memory
    Earliest,
    #[default]
    Latest,
}

impl OffsetReset {
    /// Parse a reset policy, falling back to `Latest` for anything unrecognised
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim() {
            "none" => OffsetReset::None,
            "earliest" => OffsetReset::Earliest,
            _ => OffsetReset::Latest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetReset::None => "none",
            OffsetReset::Earliest => "earliest",
            OffsetReset::Latest => "latest",
        }
    }
}

impl std::fmt::Display for OffsetReset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OffsetReset {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse_lossy).unwrap_or_default())
    }
}

/// Queue configuration, created once at startup and never mutated
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// REST proxy endpoints, tried in order
    pub addrs: Vec<String>,
    pub group: String,
    pub topic: String,
    /// Virtual host of the proxy, sent as the `Host` header when set
    pub queue: String,
    pub offset: OffsetReset,
    /// Seconds to sleep after an empty or failed cycle (0 = default)
    pub backoff_period: u64,
    /// Number of independent consumer instances (0 = 1)
    pub stream_count: usize,
    pub concurrent_processing: bool,
    /// Fan-out worker count (0 = default)
    pub processor_count: usize,
    pub authorization_key: Option<String>,
    pub auto_commit_enable: bool,
}

impl QueueConfig {
    pub fn new(
        addrs: Vec<String>,
        group: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            addrs,
            group: group.into(),
            topic: topic.into(),
            ..Default::default()
        }
    }

    /// Reject configurations the gateway cannot possibly serve
    pub fn validate(&self) -> Result<()> {
        if self.addrs.iter().all(|a| a.trim().is_empty()) {
            return Err(ConsumerError::Config(
                "at least one proxy address is required".to_string(),
            ));
        }
        if self.group.trim().is_empty() {
            return Err(ConsumerError::Config("group cannot be empty".to_string()));
        }
        if self.topic.trim().is_empty() {
            return Err(ConsumerError::Config("topic cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Effective backoff period
    pub fn backoff(&self) -> Duration {
        let secs = if self.backoff_period > 0 {
            self.backoff_period
        } else {
            DEFAULT_BACKOFF_PERIOD_SECS
        };
        Duration::from_secs(secs)
    }

    /// Effective number of parallel consumer instances
    pub fn streams(&self) -> usize {
        self.stream_count.max(1)
    }

    /// Effective fan-out worker count
    pub fn workers(&self) -> usize {
        if self.processor_count > 0 {
            self.processor_count
        } else {
            DEFAULT_PROCESSOR_COUNT
        }
    }

    /// Authorization header value, if one is configured
    pub fn authorization(&self) -> Option<&str> {
        self.authorization_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_reset_known_values() {
        assert_eq!(OffsetReset::parse_lossy("none"), OffsetReset::None);
        assert_eq!(OffsetReset::parse_lossy("earliest"), OffsetReset::Earliest);
        assert_eq!(OffsetReset::parse_lossy("latest"), OffsetReset::Latest);
    }

    #[test]
    fn test_offset_reset_falls_back_to_latest() {
        assert_eq!(OffsetReset::parse_lossy("smallest"), OffsetReset::Latest);
        assert_eq!(OffsetReset::parse_lossy(""), OffsetReset::Latest);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: QueueConfig = serde_json::from_value(serde_json::json!({
            "addrs": ["http://proxy:8082"],
            "group": "content-ingester",
            "topic": "CmsPublicationEvents",
            "offset": "bogus"
        }))
        .unwrap();

        assert_eq!(config.offset, OffsetReset::Latest);
        assert_eq!(config.backoff(), Duration::from_secs(8));
        assert_eq!(config.streams(), 1);
        assert_eq!(config.workers(), 100);
        assert!(!config.auto_commit_enable);
        assert!(config.authorization().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_explicit_values() {
        let config: QueueConfig = serde_json::from_value(serde_json::json!({
            "addrs": ["http://a:8082", "http://b:8082"],
            "group": "g",
            "topic": "t",
            "offset": "earliest",
            "backoff_period": 2,
            "stream_count": 3,
            "concurrent_processing": true,
            "processor_count": 4,
            "authorization_key": "secret",
            "auto_commit_enable": true
        }))
        .unwrap();

        assert_eq!(config.offset, OffsetReset::Earliest);
        assert_eq!(config.backoff(), Duration::from_secs(2));
        assert_eq!(config.streams(), 3);
        assert_eq!(config.workers(), 4);
        assert_eq!(config.authorization(), Some("secret"));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let no_addrs = QueueConfig::new(vec![], "g", "t");
        assert!(no_addrs.validate().unwrap_err().to_string().contains("address"));

        let no_group = QueueConfig::new(vec!["http://a".to_string()], " ", "t");
        assert!(no_group.validate().unwrap_err().to_string().contains("group"));

        let no_topic = QueueConfig::new(vec!["http://a".to_string()], "g", "");
        assert!(no_topic.validate().unwrap_err().to_string().contains("topic"));

        let valid = QueueConfig::new(vec!["http://a".to_string()], "g", "t");
        tokio_test::assert_ok!(valid.validate());
    }
}
