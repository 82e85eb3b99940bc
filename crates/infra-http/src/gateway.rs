// Kafka REST proxy gateway (v2 API)

use crate::client::{build_client, DEFAULT_HTTP_TIMEOUT};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HOST};
use reqwest::{Client, Method, RequestBuilder, Response};
use restq_core::domain::{ConsumerInstanceHandle, OffsetReset, QueueConfig};
use restq_core::port::{GatewayError, GatewayOperation, QueueGateway};
use serde_json::json;
use tracing::{debug, info, warn};

const KAFKA_V2_JSON: &str = "application/vnd.kafka.v2+json";
const KAFKA_BINARY_V2_JSON: &str = "application/vnd.kafka.binary.v2+json";

/// QueueGateway over HTTP against a Kafka REST proxy
#[derive(Debug, Clone)]
pub struct KafkaRestGateway {
    client: Client,
    addrs: Vec<String>,
    group: String,
    topic: String,
    host: Option<String>,
    offset: OffsetReset,
    auto_commit_enable: bool,
    authorization: Option<String>,
}

impl KafkaRestGateway {
    /// Create a gateway with its own HTTP client
    pub fn new(config: &QueueConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(DEFAULT_HTTP_TIMEOUT)?;
        Ok(Self::with_client(config, client))
    }

    /// Create a gateway sharing an existing HTTP client
    pub fn with_client(config: &QueueConfig, client: Client) -> Self {
        Self {
            client,
            addrs: config
                .addrs
                .iter()
                .map(|a| a.trim().trim_end_matches('/').to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            group: config.group.clone(),
            topic: config.topic.clone(),
            host: Some(config.queue.trim().to_string()).filter(|q| !q.is_empty()),
            offset: config.offset,
            auto_commit_enable: config.auto_commit_enable,
            authorization: config.authorization().map(str::to_string),
        }
    }

    /// Builds a request with routing and authentication headers
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(host) = &self.host {
            builder = builder.header(HOST, host);
        }
        if let Some(key) = &self.authorization {
            builder = builder.header(AUTHORIZATION, key);
        }
        builder
    }

    /// Send a request and require a 2xx status
    async fn send(
        &self,
        operation: GatewayOperation,
        builder: RequestBuilder,
    ) -> Result<Response, GatewayError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::new(operation, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(GatewayError::new(
                operation,
                format!("unexpected status {}: {}", status.as_u16(), body.trim()),
            ))
        }
    }

    async fn create_on(&self, addr: &str) -> Result<ConsumerInstanceHandle, GatewayError> {
        let op = GatewayOperation::CreateInstance;
        let url = format!("{}/consumers/{}", addr, self.group);
        let body = json!({
            "format": "binary",
            "auto.offset.reset": self.offset.as_str(),
            "auto.commit.enable": self.auto_commit_enable.to_string(),
        });
        debug!(url = %url, "Creating consumer instance");

        let response = self
            .send(
                op,
                self.request(Method::POST, &url)
                    .header(CONTENT_TYPE, KAFKA_V2_JSON)
                    .body(body.to_string()),
            )
            .await?;

        response
            .json::<ConsumerInstanceHandle>()
            .await
            .map_err(|e| GatewayError::new(op, format!("invalid instance response: {}", e)))
    }

    fn subscription_url(handle: &ConsumerInstanceHandle) -> String {
        format!("{}/subscription", handle.base_uri.trim_end_matches('/'))
    }
}

#[async_trait]
impl QueueGateway for KafkaRestGateway {
    async fn create_instance(&self) -> Result<ConsumerInstanceHandle, GatewayError> {
        let mut last_error = GatewayError::new(
            GatewayOperation::CreateInstance,
            "no proxy addresses configured",
        );

        for addr in &self.addrs {
            match self.create_on(addr).await {
                Ok(handle) => {
                    info!(
                        addr = %addr,
                        instance_id = %handle.instance_id,
                        base_uri = %handle.base_uri,
                        "Consumer instance provisioned"
                    );
                    return Ok(handle);
                }
                Err(e) => {
                    warn!(addr = %addr, error = %e, "Proxy refused consumer instance");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn destroy_instance(&self, handle: &ConsumerInstanceHandle) -> Result<(), GatewayError> {
        let url = handle.base_uri.trim_end_matches('/');
        self.send(
            GatewayOperation::DestroyInstance,
            self.request(Method::DELETE, url).header(CONTENT_TYPE, KAFKA_V2_JSON),
        )
        .await?;
        Ok(())
    }

    async fn subscribe(&self, handle: &ConsumerInstanceHandle) -> Result<(), GatewayError> {
        let body = json!({ "topics": [self.topic] });
        self.send(
            GatewayOperation::Subscribe,
            self.request(Method::POST, &Self::subscription_url(handle))
                .header(CONTENT_TYPE, KAFKA_V2_JSON)
                .body(body.to_string()),
        )
        .await?;
        Ok(())
    }

    async fn unsubscribe(&self, handle: &ConsumerInstanceHandle) -> Result<(), GatewayError> {
        self.send(
            GatewayOperation::Unsubscribe,
            self.request(Method::DELETE, &Self::subscription_url(handle))
                .header(CONTENT_TYPE, KAFKA_V2_JSON),
        )
        .await?;
        Ok(())
    }

    async fn poll(&self, handle: &ConsumerInstanceHandle) -> Result<Vec<u8>, GatewayError> {
        let op = GatewayOperation::Poll;
        let url = format!("{}/records", handle.base_uri.trim_end_matches('/'));
        let response = self
            .send(op, self.request(Method::GET, &url).header(ACCEPT, KAFKA_BINARY_V2_JSON))
            .await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::new(op, format!("reading records failed: {}", e)))?;
        debug!(instance_id = %handle.instance_id, bytes = bytes.len(), "Polled records");
        Ok(bytes.to_vec())
    }

    async fn commit(&self, handle: &ConsumerInstanceHandle) -> Result<(), GatewayError> {
        let url = format!("{}/offsets", handle.base_uri.trim_end_matches('/'));
        self.send(
            GatewayOperation::Commit,
            self.request(Method::POST, &url).header(CONTENT_TYPE, KAFKA_V2_JSON),
        )
        .await?;
        Ok(())
    }

    async fn check_connectivity(&self) -> Result<(), GatewayError> {
        let op = GatewayOperation::CheckConnectivity;
        if self.addrs.is_empty() {
            return Err(GatewayError::new(op, "no proxy addresses configured"));
        }
        for addr in &self.addrs {
            let url = format!("{}/topics", addr);
            self.send(op, self.request(Method::GET, &url))
                .await
                .map_err(|e| GatewayError::new(op, format!("{}: {}", addr, e.cause)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> QueueConfig {
        let mut config = QueueConfig::new(
            vec!["http://proxy-a:8082/".to_string(), "  ".to_string()],
            "group",
            "topic",
        );
        config.queue = "kafka".to_string();
        config.authorization_key = Some("Basic abc".to_string());
        config
    }

    #[test]
    fn test_addresses_are_normalised() {
        let gateway = KafkaRestGateway::with_client(&config(), Client::new());
        assert_eq!(gateway.addrs, vec!["http://proxy-a:8082".to_string()]);
        assert_eq!(gateway.host.as_deref(), Some("kafka"));
        assert_eq!(gateway.authorization.as_deref(), Some("Basic abc"));
    }

    #[test]
    fn test_optional_headers_absent_when_unset() {
        let config = QueueConfig::new(vec!["http://proxy".to_string()], "g", "t");
        let gateway = KafkaRestGateway::with_client(&config, Client::new());

        let request = gateway
            .request(Method::GET, "http://proxy/topics")
            .build()
            .unwrap();

        assert!(request.headers().get(HOST).is_none());
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_request_carries_host_and_authorization() {
        let gateway = KafkaRestGateway::with_client(&config(), Client::new());

        let request = gateway
            .request(Method::GET, "http://proxy-a:8082/topics")
            .build()
            .unwrap();

        assert_eq!(request.headers().get(HOST).unwrap(), "kafka");
        assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "Basic abc");
    }

    #[test]
    fn test_subscription_url() {
        let handle = ConsumerInstanceHandle::new("i1", "http://proxy/consumers/g/instances/i1/");
        assert_eq!(
            KafkaRestGateway::subscription_url(&handle),
            "http://proxy/consumers/g/instances/i1/subscription"
        );
    }

    #[tokio::test]
    async fn test_no_addresses_fails_fast() {
        let config = QueueConfig::new(vec![], "g", "t");
        let gateway = KafkaRestGateway::with_client(&config, Client::new());

        let create = tokio_test::assert_err!(gateway.create_instance().await);
        assert_eq!(create.operation, GatewayOperation::CreateInstance);

        let probe = tokio_test::assert_err!(gateway.check_connectivity().await);
        assert_eq!(probe.operation, GatewayOperation::CheckConnectivity);
    }
}
