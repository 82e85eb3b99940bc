//! Dispatch - hands a decoded batch to the processor
//!
//! Sequential mode makes a single call and preserves order. Concurrent mode
//! starts a feeder and N workers over a bounded queue and waits for all of
//! them before returning, so nothing crosses into the next cycle.

use crate::application::instance::constants::FANOUT_QUEUE_CAPACITY;
use crate::application::instance::fault_guard::{guard, join_error_message};
use crate::domain::{Batch, Message, QueueConfig};
use crate::error::{ConsumerError, Result};
use crate::port::MessageProcessor;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error};

/// How a batch reaches the processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Sequential,
    Concurrent { workers: usize },
}

impl DispatchMode {
    pub fn from_config(config: &QueueConfig) -> Self {
        if config.concurrent_processing {
            DispatchMode::Concurrent {
                workers: config.workers(),
            }
        } else {
            DispatchMode::Sequential
        }
    }
}

/// Deliver a batch and wait until the processor has seen every message.
///
/// A panic inside the processor surfaces as `ConsumerError::RuntimeFault`.
/// In concurrent mode a panic only costs its message: the worker keeps
/// draining the queue and the fault is reported once all tasks are joined.
pub async fn dispatch(
    processor: &Arc<dyn MessageProcessor>,
    batch: Batch,
    mode: DispatchMode,
) -> Result<()> {
    match mode {
        DispatchMode::Sequential => {
            processor.consume(batch).await;
            Ok(())
        }
        DispatchMode::Concurrent { workers } => fan_out(processor, batch, workers).await,
    }
}

async fn fan_out(
    processor: &Arc<dyn MessageProcessor>,
    batch: Batch,
    workers: usize,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Message>(FANOUT_QUEUE_CAPACITY);
    let rx = Arc::new(Mutex::new(rx));
    let mut tasks: JoinSet<Option<String>> = JoinSet::new();

    debug!(messages = batch.len(), workers = workers, "Fanning out batch");

    // Feeder: closing the queue (dropping tx) tells workers to finish
    tasks.spawn(async move {
        for message in batch {
            if tx.send(message).await.is_err() {
                break;
            }
        }
        None
    });

    for _ in 0..workers.max(1) {
        let rx = Arc::clone(&rx);
        let processor = Arc::clone(processor);
        tasks.spawn(async move {
            let mut fault = None;
            loop {
                let next = rx.lock().await.recv().await;
                let Some(message) = next else { break };
                let consumed = guard(async {
                    processor.consume(vec![message]).await;
                    Ok(())
                })
                .await;
                if let Err(e) = consumed {
                    let msg = match e {
                        ConsumerError::RuntimeFault(msg) => msg,
                        other => other.to_string(),
                    };
                    fault.get_or_insert(msg);
                }
            }
            fault
        });
    }
    // Only workers hold the receiver; if they all exit the feeder unblocks
    drop(rx);

    let mut fault = None;
    while let Some(joined) = tasks.join_next().await {
        let failed = match joined {
            Ok(worker_fault) => worker_fault,
            Err(e) => Some(join_error_message(e)),
        };
        if let Some(msg) = failed {
            error!(panic_msg = %msg, "Dispatch worker failed");
            fault.get_or_insert(msg);
        }
    }

    match fault {
        Some(msg) => Err(ConsumerError::RuntimeFault(msg)),
        None => Ok(()),
    }
}
