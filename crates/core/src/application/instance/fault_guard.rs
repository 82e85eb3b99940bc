// Fault containment at the consume cycle boundary
use crate::error::{ConsumerError, Result};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinError;
use tracing::error;

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Run a fallible future, converting any panic inside it into
/// `ConsumerError::RuntimeFault`.
///
/// # Example
/// ```text
/// let result = guard(async {
///     processor.consume(batch).await; // may panic
///     Ok(())
/// }).await;
/// assert!(matches!(result, Err(ConsumerError::RuntimeFault(_))));
/// ```
pub async fn guard<F, T>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let panic_msg = panic_message(payload.as_ref());
            error!(panic_msg = %panic_msg, "Panic contained");
            Err(ConsumerError::RuntimeFault(panic_msg))
        }
    }
}

/// Convert a failed spawned task into a fault description
pub fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic().as_ref())
    } else {
        format!("task cancelled: {}", err)
    }
}
