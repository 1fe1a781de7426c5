// SPDX-License-Identifier: Apache-2.0

//! Durable mailbox storage.
//!
//! A mailbox is the only state shared across processes. Writers rename files
//! into place; readers tolerate files that vanish between listing and opening.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::WardenError;
use crate::files::write_atomic;

const EXTENSION: &str = "json";

/// Per-agent mailbox folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folder {
    /// Messages waiting to be received.
    Inbox,
    /// Copies of sent messages.
    Outbox,
    /// Consumed messages.
    Read,
}

impl Folder {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Outbox => "outbox",
            Self::Read => "read",
        }
    }
}

/// Storage behind an [`AgentMessenger`](super::AgentMessenger).
pub trait Mailbox: Send + Sync {
    /// Stores `bytes` as message `id` in `agent`'s `folder`, atomically.
    fn deliver(&self, agent: &str, folder: Folder, id: &str, bytes: &[u8]) -> Result<(), WardenError>;

    /// Ids currently in `agent`'s `folder`, in discovery order.
    fn list(&self, agent: &str, folder: Folder) -> Result<Vec<String>, WardenError>;

    /// Moves message `id` from the inbox to the read folder and returns its
    /// bytes. `None` if another reader claimed it first.
    fn claim(&self, agent: &str, id: &str) -> Result<Option<Vec<u8>>, WardenError>;

    /// Reads message `id` without moving it. `None` if absent.
    fn fetch(&self, agent: &str, folder: Folder, id: &str) -> Result<Option<Vec<u8>>, WardenError>;
}

/// Mailboxes as `<root>/<agent>/{inbox,outbox,read}/<id>.json`.
#[derive(Debug, Clone)]
pub struct FsMailbox {
    root: PathBuf,
}

impl FsMailbox {
    /// Creates a mailbox store under `root`. Directories are created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder(&self, agent: &str, folder: Folder) -> PathBuf {
        self.root.join(agent).join(folder.dir_name())
    }

    fn message_path(&self, agent: &str, folder: Folder, id: &str) -> PathBuf {
        self.folder(agent, folder).join(format!("{id}.{EXTENSION}"))
    }
}

impl Mailbox for FsMailbox {
    fn deliver(&self, agent: &str, folder: Folder, id: &str, bytes: &[u8]) -> Result<(), WardenError> {
        std::fs::create_dir_all(self.folder(agent, folder))?;
        write_atomic(&self.message_path(agent, folder, id), bytes)
    }

    fn list(&self, agent: &str, folder: Folder) -> Result<Vec<String>, WardenError> {
        let entries = match std::fs::read_dir(self.folder(agent, folder)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|e| e == EXTENSION))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect())
    }

    fn claim(&self, agent: &str, id: &str) -> Result<Option<Vec<u8>>, WardenError> {
        std::fs::create_dir_all(self.folder(agent, Folder::Read))?;
        let read_path = self.message_path(agent, Folder::Read, id);
        match std::fs::rename(self.message_path(agent, Folder::Inbox, id), &read_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(agent, id, "Message already claimed");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }
        Ok(Some(std::fs::read(read_path)?))
    }

    fn fetch(&self, agent: &str, folder: Folder, id: &str) -> Result<Option<Vec<u8>>, WardenError> {
        match std::fs::read(self.message_path(agent, folder, id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deliver_list_claim() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = FsMailbox::new(dir.path());

        assert!(mailbox.list("b", Folder::Inbox).unwrap().is_empty());
        mailbox.deliver("b", Folder::Inbox, "m1", b"{}").unwrap();
        std::fs::write(mailbox.folder("b", Folder::Inbox).join("notes.txt"), "x").unwrap();

        assert_eq!(mailbox.list("b", Folder::Inbox).unwrap(), vec!["m1"]);
        assert_eq!(mailbox.claim("b", "m1").unwrap().as_deref(), Some(&b"{}"[..]));
        assert!(mailbox.list("b", Folder::Inbox).unwrap().is_empty());
        assert_eq!(mailbox.list("b", Folder::Read).unwrap(), vec!["m1"]);
    }

    #[test]
    fn test_claim_vanished_message_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = FsMailbox::new(dir.path());
        mailbox.deliver("b", Folder::Inbox, "m1", b"{}").unwrap();

        assert!(mailbox.claim("b", "m1").unwrap().is_some());
        assert!(mailbox.claim("b", "m1").unwrap().is_none());
        assert!(mailbox.fetch("b", Folder::Inbox, "m1").unwrap().is_none());
    }
}
