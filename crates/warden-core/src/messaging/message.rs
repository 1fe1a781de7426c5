// SPDX-License-Identifier: Apache-2.0

//! Inter-agent message model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Asks the receiver to do something.
    Request,
    /// Answers a request; carries its `correlationId`.
    Response,
    /// Fire-and-forget information.
    Notification,
    /// Reports a failure to the sender of a request.
    Error,
}

impl MessageType {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Notification => "notification",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "request" => Ok(Self::Request),
            "response" => Ok(Self::Response),
            "notification" => Ok(Self::Notification),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown message type: {other}")),
        }
    }
}

/// One message exchanged through mailboxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique id; also the mailbox file name.
    pub message_id: Uuid,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Sending agent.
    pub from_agent: String,
    /// Receiving agent.
    pub to_agent: String,
    /// Message kind.
    pub message_type: MessageType,
    /// Arbitrary JSON object.
    pub payload: Value,
    /// Id of the message this one answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Message {
    /// Creates a message with a fresh id and the current time.
    pub fn new(
        from_agent: impl Into<String>,
        to_agent: impl Into<String>,
        message_type: MessageType,
        payload: Value,
        correlation_id: Option<String>,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            from_agent: from_agent.into(),
            to_agent: to_agent.into(),
            message_type,
            payload,
            correlation_id,
        }
    }

    /// Returns true if this message answers `request`.
    #[must_use]
    pub fn answers(&self, request: &Message) -> bool {
        self.message_type == MessageType::Response
            && self.correlation_id.as_deref() == Some(request.message_id.to_string().as_str())
    }
}
