// SPDX-License-Identifier: Apache-2.0

//! Agent messaging commands.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use warden_core::{AppConfig, MessageType, receive_messages, reply_to_message, send_message};

use super::types::{MessagesResult, SentResult};

fn parse_payload(payload: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(payload).context("--payload is not valid JSON")?;
    if !value.is_object() {
        bail!("--payload must be a JSON object");
    }
    Ok(value)
}

/// Sends one message.
pub fn send(
    config: &AppConfig,
    agent: Option<&str>,
    to: &str,
    message_type: MessageType,
    payload: &str,
    correlation_id: Option<String>,
) -> Result<SentResult> {
    let payload = parse_payload(payload)?;
    let id = send_message(config, agent, to, message_type, payload, correlation_id)?;
    Ok(SentResult {
        message_id: id.to_string(),
        to_agent: Some(to.to_string()),
    })
}

/// Receives the inbox, oldest first.
pub fn receive(config: &AppConfig, agent: Option<&str>, keep: bool) -> Result<MessagesResult> {
    let mut messages = receive_messages(config, agent, keep)?;
    messages.sort_by_key(|m| m.timestamp);
    Ok(MessagesResult { messages })
}

/// Answers a received message.
pub fn reply(
    config: &AppConfig,
    agent: Option<&str>,
    message_id: &str,
    payload: &str,
) -> Result<SentResult> {
    let payload = parse_payload(payload)?;
    let id = reply_to_message(config, agent, message_id, payload)?;
    Ok(SentResult {
        message_id: id.to_string(),
        to_agent: None,
    })
}
