//! Restq Consumer - Main Entry Point
//! Consumes a topic through a Kafka REST proxy and logs every message

mod settings;

use anyhow::Result;
use restq_core::application::MessageConsumer;
use restq_core::domain::Message;
use restq_infra_http::KafkaRestGateway;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Time allowed for in-flight cycles to finish after Ctrl+C
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

fn init_logging() -> Result<()> {
    let log_format = std::env::var("RESTQ_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("restq=info"))?;

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
    Ok(())
}

fn log_message(message: Message) {
    let tid = message
        .header("X-Request-Id")
        .or_else(|| message.header("tid"))
        .unwrap_or("-");
    info!(
        tid = %tid,
        message_id = message.header("Message-Id").unwrap_or("-"),
        headers = message.headers.len(),
        body_bytes = message.body.len(),
        "Message received"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    init_logging()?;
    info!("Restq consumer v{} starting...", VERSION);

    // 2. Configuration
    let config_path = settings::config_path();
    let config = settings::load(&config_path)?;
    info!(
        config_path = %config_path,
        addrs = ?config.addrs,
        group = %config.group,
        topic = %config.topic,
        streams = config.streams(),
        concurrent = config.concurrent_processing,
        "Configuration loaded"
    );

    // 3. Gateway (DI wiring)
    let gateway = Arc::new(
        KafkaRestGateway::new(&config)
            .map_err(|e| anyhow::anyhow!("HTTP client creation failed: {}", e))?,
    );

    let consumer = Arc::new(MessageConsumer::with_handler(config, gateway, log_message));

    // 4. Connectivity probe (non-fatal; streams keep retrying)
    match consumer.connectivity_check().await {
        Ok(msg) => info!("{}", msg),
        Err(e) => warn!(error = %e, "Proxy unreachable at startup, consuming anyway"),
    }

    // 5. Consume until interrupted
    let runner = consumer.clone();
    let consumer_handle = tokio::spawn(async move {
        runner.start().await;
    });

    info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown
    consumer.stop();
    if tokio::time::timeout(SHUTDOWN_GRACE, consumer_handle)
        .await
        .is_err()
    {
        warn!("Consumer streams did not stop in time");
    }

    info!("Shutdown complete.");
    Ok(())
}
