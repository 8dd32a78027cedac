//! Workspace snapshots
//!
//! A JSON5 file holding every record, vote and engagement counter of a
//! workspace. The CLI loads one into the in-memory stores. Records are
//! loaded as stored, so invalid ones surface as rejected feed entries.

use crate::config::Config;
use crate::content::{Event, Message, Poll, TaskPosting, Vote};
use crate::store::{
    ContentStore, Engagement, MemoryPollStore, MemoryReactions, MemoryStore, PollStore,
    StoreError,
};
use crate::workspace::{Stores, Workspace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Snapshot error types
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to access snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to load snapshot records: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub messages: Vec<Message>,
    pub tasks: Vec<TaskPosting>,
    pub events: Vec<Event>,
    pub polls: Vec<Poll>,
    pub votes: Vec<Vote>,
    /// Engagement counters keyed by content id
    pub reactions: HashMap<String, Engagement>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Snapshot = json5::from_str(&raw).map_err(|e| SnapshotError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(
            path = %path.display(),
            messages = snapshot.messages.len(),
            tasks = snapshot.tasks.len(),
            events = snapshot.events.len(),
            polls = snapshot.polls.len(),
            votes = snapshot.votes.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Write as pretty JSON, replacing the file atomically
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let io_err = |source: std::io::Error| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        info!(path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Replace the stored votes of one poll
    pub fn replace_votes(&mut self, poll_id: &str, votes: Vec<Vote>) {
        self.votes.retain(|v| v.poll_id != poll_id);
        self.votes.extend(votes);
    }

    /// Fill in-memory stores with the snapshot's contents
    pub fn into_workspace(self, config: &Config) -> Result<Workspace, SnapshotError> {
        let messages = MemoryStore::<Message>::new();
        for message in self.messages {
            messages.append(message)?;
        }
        let tasks = MemoryStore::<TaskPosting>::new();
        for task in self.tasks {
            tasks.append(task)?;
        }
        let events = MemoryStore::<Event>::new();
        for event in self.events {
            events.append(event)?;
        }
        let polls = MemoryPollStore::new();
        for poll in self.polls {
            polls.append(poll)?;
        }
        for vote in self.votes {
            polls.upsert_vote(vote)?;
        }

        let stores = Stores {
            messages: Arc::new(messages),
            tasks: Arc::new(tasks),
            events: Arc::new(events),
            polls: Arc::new(polls),
            reactions: Arc::new(MemoryReactions::from_map(self.reactions)),
        };
        Ok(Workspace::new(stores, config))
    }
}
