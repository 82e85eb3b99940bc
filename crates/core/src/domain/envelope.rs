//! Envelope decoding for poll responses
//!
//! A poll returns a JSON array of records. Each record carries a base64
//! `value` plus the partition and offset it was read from. The decoded
//! payload text looks like:
//!
//! ```text
//! FTMSG/1.0
//! Message-Id: c4b96810-03e8-4057-84c5-dcc3a8c61a26
//! Origin-System-Id: http://cmdb.ft.com/systems/methode-web-pub
//!
//! {"uuid": "..."}
//! ```
//!
//! Header tokens (`key:value`) appear before the first `{`; the body spans
//! from the first `{` to the last `}`.

use crate::domain::{Batch, DecodeError, Message};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, error};

/// `key:value` where key is word chars/hyphens and value is word chars,
/// hyphens, colons, slashes and dots (spaces are handled by the scanner)
static HEADER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_-]+):([A-Za-z0-9_\-:/.]*)").expect("header token pattern is valid")
});

/// Continuation of a header value after a space
static VALUE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-:/.]+").expect("value word pattern is valid")
});

/// One record of the outer envelope
#[derive(Debug, Deserialize)]
struct EnvelopeRecord {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    partition: i64,
    #[serde(default)]
    offset: i64,
}

/// Decode the raw bytes of one poll response into a batch of messages.
///
/// Fails only if the outer structure is not a JSON array of records.
/// A record whose payload is not valid base64 becomes an empty message so
/// the rest of the batch is still delivered.
pub fn decode_batch(data: &[u8]) -> Result<Batch, DecodeError> {
    let records: Option<Vec<EnvelopeRecord>> = serde_json::from_slice(data).map_err(|e| {
        error!(
            error = %e,
            payload = %String::from_utf8_lossy(data),
            "Parsing poll envelope failed"
        );
        DecodeError::from(e)
    })?;

    let records = records.unwrap_or_default();
    let mut batch = Vec::with_capacity(records.len());
    for record in records {
        debug!(
            partition = record.partition,
            offset = record.offset,
            "Decoding record"
        );
        batch.push(decode_message(record.value.as_deref().unwrap_or_default()));
    }
    Ok(batch)
}

/// Decode one base64 payload into a message
pub fn decode_message(raw: &str) -> Message {
    let decoded = match STANDARD.decode(raw) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Decoding base64 payload failed, delivering empty message");
            return Message::default();
        }
    };

    let text = String::from_utf8_lossy(&decoded);
    Message {
        headers: parse_headers(&text),
        body: parse_body(&text).to_string(),
    }
}

/// Extract `key:value` header tokens preceding the first `{`.
///
/// A token boundary is whitespace followed by another `key:` token, unless
/// the current header has no value yet (`Key: http://host` keeps the URL as
/// the value). Values never span lines. Later keys overwrite earlier ones.
pub fn parse_headers(text: &str) -> HashMap<String, String> {
    let section = match text.find('{') {
        Some(i) => &text[..i],
        None => text,
    };

    let mut headers = HashMap::new();
    for line in section.lines() {
        let mut current: Option<(String, String)> = None;
        let mut open = false;

        for word in line.split_whitespace() {
            let awaiting_value = open && current.as_ref().is_some_and(|(_, v)| v.is_empty());

            if !awaiting_value {
                if let Some(caps) = HEADER_TOKEN.captures(word) {
                    if let Some((key, value)) = current.take() {
                        headers.insert(key, value.trim().to_string());
                    }
                    open = caps[0].len() == word.len();
                    current = Some((caps[1].to_string(), caps[2].to_string()));
                    continue;
                }
            }

            if !open {
                continue;
            }
            if let Some((_, value)) = current.as_mut() {
                match VALUE_WORD.find(word) {
                    Some(m) => {
                        if !value.is_empty() {
                            value.push(' ');
                        }
                        value.push_str(m.as_str());
                        open = m.end() == word.len();
                    }
                    None => open = false,
                }
            }
        }

        if let Some((key, value)) = current {
            headers.insert(key, value.trim().to_string());
        }
    }
    headers
}

/// Substring from the first `{` to the last `}` inclusive, or empty
pub fn parse_body(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(first), Some(last)) if last > first => &text[first..=last],
        _ => "",
    }
}
