//! Store Collaborators
//!
//! Trait seams for the external content stores and the reaction source.
//! The core never owns persistence; it only relies on these contracts.
//! `memory` provides thread-safe reference implementations.

pub mod memory;

pub use memory::{MemoryPollStore, MemoryReactions, MemoryStore};

use crate::content::{ContentMeta, Poll, TaskPosting, TaskPriority, TaskStatus, Vote};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Store error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} with ID '{id}' already exists")]
    Duplicate { kind: &'static str, id: String },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Window over a store listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    /// Only records by this author
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    /// Only records created strictly before this instant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub offset: usize,
    /// Maximum records to return (0 = unlimited)
    #[serde(default)]
    pub limit: usize,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    pub fn created_before(mut self, at: DateTime<Utc>) -> Self {
        self.created_before = Some(at);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn matches(&self, meta: &ContentMeta) -> bool {
        if let Some(author) = &self.author_id {
            if &meta.author_id != author {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if meta.created_at >= before {
                return false;
            }
        }
        true
    }
}

/// Append-only store for one content kind
pub trait ContentStore<T>: Send + Sync {
    /// Add a record; ids must be unique
    fn append(&self, record: T) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<Option<T>, StoreError>;

    /// Records matching the filter, newest first
    fn list(&self, filter: &ListFilter) -> Result<Vec<T>, StoreError>;
}

/// Task store with the two mutable task fields
pub trait TaskStore: ContentStore<TaskPosting> {
    fn update_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<TaskPosting, StoreError>;

    fn update_priority(
        &self,
        task_id: &str,
        priority: TaskPriority,
        at: DateTime<Utc>,
    ) -> Result<TaskPosting, StoreError>;
}

/// Poll store owning the vote set.
///
/// `upsert_vote` must be atomic per `(poll_id, voter_id)`: concurrent
/// submissions from one voter leave exactly one vote behind.
pub trait PollStore: ContentStore<Poll> {
    fn get_votes(&self, poll_id: &str) -> Result<Vec<Vote>, StoreError>;

    /// Insert or replace; returns the vote that was replaced, if any
    fn upsert_vote(&self, vote: Vote) -> Result<Option<Vote>, StoreError>;
}

/// Engagement counters kept by the reaction collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub comment_count: u32,
}

impl Engagement {
    pub fn new(like_count: u32, comment_count: u32) -> Self {
        Self {
            like_count,
            comment_count,
        }
    }
}

/// Supplies engagement counters per content id
pub trait ReactionSource: Send + Sync {
    fn engagement(&self, content_id: &str) -> Engagement;
}

/// Reaction source that knows of no reactions
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReactions;

impl ReactionSource for NoReactions {
    fn engagement(&self, _content_id: &str) -> Engagement {
        Engagement::default()
    }
}

impl ReactionSource for HashMap<String, Engagement> {
    fn engagement(&self, content_id: &str) -> Engagement {
        self.get(content_id).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_list_filter_builder() {
        let at = Utc.with_ymd_and_hms(2024, 7, 29, 12, 0, 0).unwrap();
        let filter = ListFilter::new()
            .by_author("user1")
            .created_before(at)
            .offset(5)
            .limit(10);

        assert_eq!(filter.author_id.as_deref(), Some("user1"));
        assert_eq!(filter.created_before, Some(at));
        assert_eq!(filter.offset, 5);
        assert_eq!(filter.limit, 10);
    }

    #[test]
    fn test_list_filter_matches() {
        let at = Utc.with_ymd_and_hms(2024, 7, 29, 12, 0, 0).unwrap();
        let mut meta = ContentMeta::new("user1");
        meta.stamp(at);

        assert!(ListFilter::new().matches(&meta));
        assert!(ListFilter::new().by_author("user1").matches(&meta));
        assert!(!ListFilter::new().by_author("user2").matches(&meta));
        assert!(!ListFilter::new().created_before(at).matches(&meta));
        assert!(ListFilter::new()
            .created_before(at + chrono::TimeDelta::seconds(1))
            .matches(&meta));
    }

    #[test]
    fn test_map_reaction_source() {
        let mut reactions = HashMap::new();
        reactions.insert("m1".to_string(), Engagement::new(5, 2));

        assert_eq!(reactions.engagement("m1"), Engagement::new(5, 2));
        assert_eq!(reactions.engagement("unknown"), Engagement::default());
        assert_eq!(NoReactions.engagement("m1"), Engagement::default());
    }
}
