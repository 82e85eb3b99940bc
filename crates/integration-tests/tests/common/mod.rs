//! Shared fixtures for REST proxy tests

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use restq_core::domain::QueueConfig;
use serde_json::{json, Value};

pub const GROUP: &str = "content-ingester";
pub const TOPIC: &str = "CmsPublicationEvents";
pub const INSTANCE_ID: &str = "rest-consumer-1";

pub fn config(addrs: Vec<String>) -> QueueConfig {
    let mut config = QueueConfig::new(addrs, GROUP, TOPIC);
    config.backoff_period = 1;
    config
}

pub fn instance_path() -> String {
    format!("/consumers/{}/instances/{}", GROUP, INSTANCE_ID)
}

/// Response body of a successful instance creation
pub fn instance_created(server_uri: &str) -> Value {
    json!({
        "instance_id": INSTANCE_ID,
        "base_uri": format!("{}{}", server_uri, instance_path()),
    })
}

/// Binary-format records response carrying the given raw payloads
pub fn records(payloads: &[&str]) -> Value {
    let records: Vec<Value> = payloads
        .iter()
        .enumerate()
        .map(|(i, p)| {
            json!({
                "topic": TOPIC,
                "key": null,
                "value": STANDARD.encode(p),
                "partition": 0,
                "offset": i,
            })
        })
        .collect();
    Value::Array(records)
}
