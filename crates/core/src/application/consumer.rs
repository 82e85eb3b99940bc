//! Message Consumer - entry point for embedding applications
//!
//! Runs one `ConsumerInstance` per configured stream. Each instance owns
//! its own remote handle and backoff timer; they only share the gateway,
//! the processor and the shutdown signal.

use crate::application::instance::constants::{CONNECTIVITY_ERROR_MESSAGE, CONNECTIVITY_OK_MESSAGE};
use crate::application::instance::fault_guard::join_error_message;
use crate::application::instance::{shutdown_channel, ConsumerInstance, ShutdownSender};
use crate::domain::{Batch, Message, QueueConfig};
use crate::error::Result;
use crate::port::{BatchedMessageProcessor, MessageProcessor, QueueGateway, SplitMessageProcessor};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Multi-stream queue consumer
pub struct MessageConsumer {
    config: Arc<QueueConfig>,
    gateway: Arc<dyn QueueGateway>,
    processor: Arc<dyn MessageProcessor>,
    shutdown: ShutdownSender,
}

impl MessageConsumer {
    pub fn new(
        config: QueueConfig,
        gateway: Arc<dyn QueueGateway>,
        processor: Arc<dyn MessageProcessor>,
    ) -> Self {
        let (shutdown, _token) = shutdown_channel();
        Self {
            config: Arc::new(config),
            gateway,
            processor,
            shutdown,
        }
    }

    /// Consumer whose handler is invoked once per message
    pub fn with_handler<F>(config: QueueConfig, gateway: Arc<dyn QueueGateway>, handler: F) -> Self
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        Self::new(config, gateway, Arc::new(SplitMessageProcessor::new(handler)))
    }

    /// Consumer whose handler is invoked once per polled batch
    pub fn with_batch_handler<F>(
        config: QueueConfig,
        gateway: Arc<dyn QueueGateway>,
        handler: F,
    ) -> Self
    where
        F: Fn(Batch) + Send + Sync + 'static,
    {
        Self::new(config, gateway, Arc::new(BatchedMessageProcessor::new(handler)))
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Run every stream until `stop` is called; resolves once all have stopped
    pub async fn start(&self) {
        let streams = self.config.streams();
        info!(
            streams = streams,
            group = %self.config.group,
            topic = %self.config.topic,
            "Starting message consumer"
        );

        let mut tasks = JoinSet::new();
        for stream in 0..streams {
            let mut instance = ConsumerInstance::new(
                Arc::clone(&self.config),
                Arc::clone(&self.gateway),
                Arc::clone(&self.processor),
                self.shutdown.token(),
            )
            .with_name(format!("{}-{}", self.config.topic, stream));

            tasks.spawn(async move { instance.run().await });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %join_error_message(e), "Consumer stream terminated abnormally");
            }
        }
        info!("Message consumer stopped");
    }

    /// Request shutdown of every stream (non-blocking, idempotent)
    pub fn stop(&self) {
        if !self.shutdown.is_shutdown() {
            info!("Stopping message consumer");
        }
        self.shutdown.shutdown();
    }

    /// Health probe against the proxy
    pub async fn connectivity_check(&self) -> Result<String> {
        match self.gateway.check_connectivity().await {
            Ok(()) => Ok(CONNECTIVITY_OK_MESSAGE.to_string()),
            Err(e) => {
                warn!(error = %e, "{}", CONNECTIVITY_ERROR_MESSAGE);
                Err(e.into())
            }
        }
    }
}
