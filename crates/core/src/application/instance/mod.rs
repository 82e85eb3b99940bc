// Consumer Instance - lifecycle state machine and poll/process/commit loop

pub mod constants;
pub mod fault_guard;
mod shutdown;

pub use fault_guard::guard;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::dispatch::{dispatch, DispatchMode};
use crate::domain::{decode_batch, ConsumerInstanceHandle, QueueConfig};
use crate::error::{ConsumerError, Result};
use crate::port::{MessageProcessor, QueueGateway};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Lifecycle of the remote consumer instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceState {
    /// No remote instance held
    Idle,
    /// Instance created and subscribed
    Active(ConsumerInstanceHandle),
    /// Shutdown observed; terminal
    Stopped,
}

/// Owns one remote consumer instance and drives its consume cycle.
///
/// Not shareable: each stream gets its own `ConsumerInstance`.
pub struct ConsumerInstance {
    name: String,
    config: Arc<QueueConfig>,
    gateway: Arc<dyn QueueGateway>,
    processor: Arc<dyn MessageProcessor>,
    dispatch_mode: DispatchMode,
    state: InstanceState,
    shutdown: ShutdownToken,
}

impl ConsumerInstance {
    pub fn new(
        config: Arc<QueueConfig>,
        gateway: Arc<dyn QueueGateway>,
        processor: Arc<dyn MessageProcessor>,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            name: config.topic.clone(),
            dispatch_mode: DispatchMode::from_config(&config),
            config,
            gateway,
            processor,
            state: InstanceState::Idle,
            shutdown,
        }
    }

    /// Label used in logs (defaults to the topic name)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &InstanceState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, InstanceState::Active(_))
    }

    /// Run the consume loop until shutdown is requested
    pub async fn run(&mut self) {
        info!(
            stream = %self.name,
            group = %self.config.group,
            topic = %self.config.topic,
            "Consumer instance started"
        );
        let backoff = self.config.backoff();

        loop {
            if self.shutdown.is_shutdown() {
                info!(stream = %self.name, "Consumer instance shutting down");
                self.teardown().await;
                self.state = InstanceState::Stopped;
                break;
            }

            let needs_backoff = match self.consume_cycle().await {
                Ok(0) => true,
                Ok(count) => {
                    debug!(stream = %self.name, messages = count, "Batch processed");
                    false
                }
                Err(e) => {
                    error!(stream = %self.name, error = %e, "Consume cycle failed");
                    true
                }
            };

            if needs_backoff {
                // Uninterruptible; shutdown is observed at the top of the next cycle
                debug!(stream = %self.name, backoff_secs = backoff.as_secs(), "Backing off");
                sleep(backoff).await;
            }
        }

        info!(stream = %self.name, "Consumer instance stopped");
    }

    /// Execute one poll/process/commit cycle.
    ///
    /// Returns the number of messages processed. Any failure (including a
    /// panic in the gateway or processor) leaves the instance `Idle` with its
    /// remote resources released on a best-effort basis.
    pub async fn consume_cycle(&mut self) -> Result<usize> {
        if self.state == InstanceState::Stopped {
            return Err(ConsumerError::InvalidState(format!(
                "consumer instance {} is stopped",
                self.name
            )));
        }

        let result = guard(self.try_consume()).await;
        if let Err(ConsumerError::RuntimeFault(_)) = &result {
            self.teardown().await;
        }
        result
    }

    async fn try_consume(&mut self) -> Result<usize> {
        let handle = self.activate().await?;

        match self.consume_with(&handle).await {
            Ok(count) => Ok(count),
            Err(e) => {
                self.teardown().await;
                Err(e)
            }
        }
    }

    /// Create and subscribe an instance unless one is already held
    async fn activate(&mut self) -> Result<ConsumerInstanceHandle> {
        if let InstanceState::Active(handle) = &self.state {
            return Ok(handle.clone());
        }

        let handle = self.gateway.create_instance().await?;
        info!(stream = %self.name, instance_id = %handle, "Consumer instance created");
        self.state = InstanceState::Active(handle.clone());

        if let Err(e) = self.gateway.subscribe(&handle).await {
            self.teardown().await;
            return Err(e.into());
        }
        info!(
            stream = %self.name,
            instance_id = %handle,
            topic = %self.config.topic,
            "Subscribed to topic"
        );
        Ok(handle)
    }

    async fn consume_with(&self, handle: &ConsumerInstanceHandle) -> Result<usize> {
        let raw = self.gateway.poll(handle).await?;
        let batch = decode_batch(&raw)?;
        let count = batch.len();

        dispatch(&self.processor, batch, self.dispatch_mode).await?;

        if !self.config.auto_commit_enable {
            self.gateway.commit(handle).await?;
        }
        Ok(count)
    }

    /// Release the remote instance, if any. Sub-failures are logged only.
    async fn teardown(&mut self) {
        let handle = match std::mem::replace(&mut self.state, InstanceState::Idle) {
            InstanceState::Active(handle) => handle,
            other => {
                self.state = other;
                return;
            }
        };

        let gateway = Arc::clone(&self.gateway);
        let unsubscribed =
            guard(async { gateway.unsubscribe(&handle).await.map_err(ConsumerError::from) }).await;
        if let Err(e) = unsubscribed {
            error!(
                stream = %self.name,
                instance_id = %handle,
                error = %e,
                "Error deleting consumer instance subscription"
            );
        }
        let destroyed = guard(async {
            gateway
                .destroy_instance(&handle)
                .await
                .map_err(ConsumerError::from)
        })
        .await;
        if let Err(e) = destroyed {
            error!(
                stream = %self.name,
                instance_id = %handle,
                error = %e,
                "Error deleting consumer instance"
            );
        }
        info!(stream = %self.name, instance_id = %handle, "Consumer instance released");
    }
}
