//! Content Model
//!
//! The four kinds of workplace activity (messages, task postings, events and
//! polls) plus poll votes. Every record is validated at the write boundary;
//! read paths re-check stored records and report the ones that fail.

pub mod event;
pub mod message;
pub mod poll;
pub mod task;

pub use event::Event;
pub use message::Message;
pub use poll::{Poll, Vote, DEFAULT_MAX_OPTIONS};
pub use task::{TaskPosting, TaskPriority, TaskStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Validation failures raised when a record is created or updated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Blank { field: &'static str },

    #[error("Poll must have at least 2 options, got {0}")]
    TooFewOptions(usize),

    #[error("Poll cannot have more than {max} options, got {count}")]
    TooManyOptions { count: usize, max: usize },

    #[error("Poll option {index} is empty")]
    BlankOption { index: usize },

    #[error("Duplicate poll option: {0}")]
    DuplicateOption(String),

    #[error("Event must end after it starts")]
    EndNotAfterStart,

    #[error("Unknown task status: {0}")]
    UnknownStatus(String),

    #[error("Unknown task priority: {0}")]
    UnknownPriority(String),
}

/// Reject empty or whitespace-only text
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(())
}

/// Discriminant shared by the content kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Message,
    Task,
    Event,
    Poll,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Message,
        ContentKind::Task,
        ContentKind::Event,
        ContentKind::Poll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Message => "message",
            ContentKind::Task => "task",
            ContentKind::Event => "event",
            ContentKind::Poll => "poll",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kind string that names none of the content kinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized content kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for ContentKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(ContentKind::Message),
            "task" => Ok(ContentKind::Task),
            "event" => Ok(ContentKind::Event),
            "poll" => Ok(ContentKind::Poll),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// Fields every content record carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMeta {
    /// Opaque unique identifier
    pub id: String,
    /// User who created the record
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentMeta {
    /// Fresh metadata with a generated id, stamped now
    pub fn new(author_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author_id: author_id.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Stamp both timestamps
    pub fn stamp(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = at;
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        require_text("id", &self.id)?;
        require_text("authorId", &self.author_id)
    }
}

/// Common behaviour of the stored content kinds
pub trait Record {
    const KIND: ContentKind;

    fn meta(&self) -> &ContentMeta;

    fn meta_mut(&mut self) -> &mut ContentMeta;

    /// Check the record's invariants
    fn validate(&self) -> Result<(), ValidationError>;

    fn id(&self) -> &str {
        &self.meta().id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.meta().created_at
    }
}

/// Any one content record, already classified
#[derive(Debug, Clone, PartialEq)]
pub enum ContentRecord {
    Message(Message),
    Task(TaskPosting),
    Event(Event),
    Poll(Poll),
}

impl ContentRecord {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentRecord::Message(_) => ContentKind::Message,
            ContentRecord::Task(_) => ContentKind::Task,
            ContentRecord::Event(_) => ContentKind::Event,
            ContentRecord::Poll(_) => ContentKind::Poll,
        }
    }

    pub fn meta(&self) -> &ContentMeta {
        match self {
            ContentRecord::Message(m) => m.meta(),
            ContentRecord::Task(t) => t.meta(),
            ContentRecord::Event(e) => e.meta(),
            ContentRecord::Poll(p) => p.meta(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_with_poll_limit(DEFAULT_MAX_OPTIONS)
    }

    /// Validate, checking polls against `max_poll_options`
    pub fn validate_with_poll_limit(&self, max_poll_options: usize) -> Result<(), ValidationError> {
        match self {
            ContentRecord::Message(m) => m.validate(),
            ContentRecord::Task(t) => t.validate(),
            ContentRecord::Event(e) => e.validate(),
            ContentRecord::Poll(p) => p.validate_with_limit(max_poll_options),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ContentKind::ALL {
            assert_eq!(kind.as_str().parse::<ContentKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = "announcement".parse::<ContentKind>().unwrap_err();
        assert_eq!(err, UnknownKind("announcement".to_string()));
        assert!("Task".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_meta_new_generates_distinct_ids() {
        let a = ContentMeta::new("user1");
        let b = ContentMeta::new("user1");
        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, a.updated_at);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let meta = ContentMeta::new("user1");
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("authorId").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn test_meta_blank_author_rejected() {
        let meta = ContentMeta::new("  ");
        assert_eq!(
            meta.validate(),
            Err(ValidationError::Blank { field: "authorId" })
        );
    }
}
