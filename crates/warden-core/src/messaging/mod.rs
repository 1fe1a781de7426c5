// SPDX-License-Identifier: Apache-2.0

//! Agent-to-agent messaging over file mailboxes.
//!
//! Every message is validated against the message schema before anything is
//! written. A send writes the sender's outbox copy and the receiver's inbox
//! copy; a receive with `mark_read` moves each message to the read folder so
//! it is consumed at most once.

mod mailbox;
mod message;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::WardenError;
use crate::schema::{MESSAGE_SCHEMA, SchemaValidator};

pub use mailbox::{Folder, FsMailbox, Mailbox};
pub use message::{Message, MessageType};

/// Sends and receives messages for one agent.
pub struct AgentMessenger<'v> {
    agent: String,
    mailbox: Box<dyn Mailbox>,
    validator: &'v SchemaValidator,
}

impl std::fmt::Debug for AgentMessenger<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentMessenger")
            .field("agent", &self.agent)
            .finish_non_exhaustive()
    }
}

impl<'v> AgentMessenger<'v> {
    /// Creates a messenger for `agent`.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::Config` if the name is not a valid agent name.
    pub fn new(
        agent: impl Into<String>,
        mailbox: impl Mailbox + 'static,
        validator: &'v SchemaValidator,
    ) -> Result<Self, WardenError> {
        let agent = agent.into();
        if !is_agent_name(&agent) {
            return Err(WardenError::Config {
                message: format!("invalid agent name '{agent}': use letters, digits, '_', '.' or '-'"),
            });
        }
        Ok(Self {
            agent,
            mailbox: Box::new(mailbox),
            validator,
        })
    }

    /// This agent's name.
    #[must_use]
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Sends a message and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMessage` without writing anything if the message fails
    /// schema validation, or an I/O error if a mailbox write fails.
    pub fn send(
        &self,
        to_agent: &str,
        message_type: MessageType,
        payload: Value,
        correlation_id: Option<String>,
    ) -> Result<Uuid, WardenError> {
        if !is_agent_name(to_agent) {
            return Err(WardenError::InvalidMessage {
                errors: format!("/toAgent: invalid agent name '{to_agent}'"),
            });
        }
        let message = Message::new(
            self.agent.as_str(),
            to_agent,
            message_type,
            payload,
            correlation_id,
        );

        let document = serde_json::to_value(&message)?;
        let report = self.validator.validate(&document, MESSAGE_SCHEMA)?;
        if !report.ok {
            return Err(WardenError::InvalidMessage {
                errors: report.joined(),
            });
        }

        let bytes = serde_json::to_vec_pretty(&document)?;
        let id = message.message_id.to_string();
        self.mailbox.deliver(&self.agent, Folder::Outbox, &id, &bytes)?;
        self.mailbox.deliver(to_agent, Folder::Inbox, &id, &bytes)?;

        info!(
            from = %self.agent,
            to = to_agent,
            message_type = %message_type,
            message_id = %id,
            "Message sent"
        );
        Ok(message.message_id)
    }

    /// Answers `original`, addressed to its sender and correlated by its id.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub fn send_response(&self, original: &Message, payload: Value) -> Result<Uuid, WardenError> {
        self.send(
            &original.from_agent,
            MessageType::Response,
            payload,
            Some(original.message_id.to_string()),
        )
    }

    /// Messages currently in this agent's inbox.
    ///
    /// The returned [`Inbox`] is one-shot: it snapshots the inbox listing and
    /// yields each message at most once. With `mark_read`, each yielded
    /// message is moved to the read folder first, so later receives skip it.
    ///
    /// # Errors
    ///
    /// Fails if the inbox cannot be listed.
    pub fn receive(&self, mark_read: bool) -> Result<Inbox<'_>, WardenError> {
        let ids = self.mailbox.list(&self.agent, Folder::Inbox)?;
        Ok(Inbox {
            messenger: self,
            ids: ids.into_iter(),
            mark_read,
        })
    }

    /// Looks up an already consumed message by id.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors or if the stored message is malformed.
    pub fn find_read(&self, message_id: &str) -> Result<Option<Message>, WardenError> {
        self.mailbox
            .fetch(&self.agent, Folder::Read, message_id)?
            .map(|bytes| serde_json::from_slice(&bytes).map_err(WardenError::from))
            .transpose()
    }

    fn next_message(&self, id: &str, mark_read: bool) -> Option<Message> {
        let fetched = if mark_read {
            self.mailbox.claim(&self.agent, id)
        } else {
            self.mailbox.fetch(&self.agent, Folder::Inbox, id)
        };
        let bytes = match fetched {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(agent = %self.agent, message_id = id, error = %e, "Cannot read message");
                return None;
            }
        };
        match serde_json::from_slice::<Message>(&bytes) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(agent = %self.agent, message_id = id, error = %e, "Skipping malformed message");
                None
            }
        }
    }
}

/// One-shot sequence of received messages.
///
/// Malformed or vanished messages are skipped.
#[derive(Debug)]
pub struct Inbox<'m> {
    messenger: &'m AgentMessenger<'m>,
    ids: std::vec::IntoIter<String>,
    mark_read: bool,
}

impl Iterator for Inbox<'_> {
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        for id in self.ids.by_ref() {
            if let Some(message) = self.messenger.next_message(&id, self.mark_read) {
                return Some(message);
            }
        }
        None
    }
}

fn is_agent_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}
