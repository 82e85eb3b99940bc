// HTTP Client Setup

use reqwest::Client;
use std::time::Duration;

/// Request timeout; must exceed the proxy's own consumer request timeout
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Idle connections kept per proxy host
const MAX_IDLE_PER_HOST: usize = 16;

/// Create an HTTP client suitable for sharing across consumer streams
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        assert!(build_client(DEFAULT_HTTP_TIMEOUT).is_ok());
    }
}
