//! In-memory stores
//!
//! Reference implementations of the store traits, guarded by
//! `parking_lot::RwLock`. Used by tests and the CLI snapshot loader.

use super::{
    ContentStore, Engagement, ListFilter, PollStore, ReactionSource, StoreError, TaskStore,
};
use crate::content::{Poll, Record, TaskPosting, TaskPriority, TaskStatus, Vote};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Content store for one record kind
#[derive(Debug)]
pub struct MemoryStore<T> {
    records: RwLock<HashMap<String, T>>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Record + Clone + Send + Sync> MemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Apply `change` to one record under the write lock and bump `updated_at`
    fn update(
        &self,
        id: &str,
        at: DateTime<Utc>,
        change: impl FnOnce(&mut T),
    ) -> Result<T, StoreError> {
        let mut records = self.records.write();
        let record = records.get_mut(id).ok_or_else(|| StoreError::NotFound {
            kind: T::KIND.as_str(),
            id: id.to_string(),
        })?;
        change(record);
        record.meta_mut().updated_at = at;
        Ok(record.clone())
    }
}

impl<T: Record + Clone + Send + Sync> ContentStore<T> for MemoryStore<T> {
    fn append(&self, record: T) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let id = record.id().to_string();
        if records.contains_key(&id) {
            return Err(StoreError::Duplicate {
                kind: T::KIND.as_str(),
                id,
            });
        }
        debug!(kind = %T::KIND, id = %id, "appended record");
        records.insert(id, record);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        Ok(self.records.read().get(id).cloned())
    }

    fn list(&self, filter: &ListFilter) -> Result<Vec<T>, StoreError> {
        let records = self.records.read();
        let mut results: Vec<T> = records
            .values()
            .filter(|r| filter.matches(r.meta()))
            .cloned()
            .collect();
        drop(records);

        // Newest first, id breaks ties
        results.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });

        let limit = if filter.limit > 0 {
            filter.limit
        } else {
            usize::MAX
        };
        Ok(results.into_iter().skip(filter.offset).take(limit).collect())
    }
}

impl TaskStore for MemoryStore<TaskPosting> {
    fn update_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<TaskPosting, StoreError> {
        self.update(task_id, at, |task| task.status = status)
    }

    fn update_priority(
        &self,
        task_id: &str,
        priority: TaskPriority,
        at: DateTime<Utc>,
    ) -> Result<TaskPosting, StoreError> {
        self.update(task_id, at, |task| task.priority = priority)
    }
}

/// Poll store with votes keyed by `(poll_id, voter_id)`
#[derive(Debug, Default)]
pub struct MemoryPollStore {
    polls: MemoryStore<Poll>,
    votes: RwLock<BTreeMap<(String, String), Vote>>,
}

impl MemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total votes across all polls
    pub fn vote_count(&self) -> usize {
        self.votes.read().len()
    }
}

impl ContentStore<Poll> for MemoryPollStore {
    fn append(&self, record: Poll) -> Result<(), StoreError> {
        self.polls.append(record)
    }

    fn get(&self, id: &str) -> Result<Option<Poll>, StoreError> {
        self.polls.get(id)
    }

    fn list(&self, filter: &ListFilter) -> Result<Vec<Poll>, StoreError> {
        self.polls.list(filter)
    }
}

impl PollStore for MemoryPollStore {
    fn get_votes(&self, poll_id: &str) -> Result<Vec<Vote>, StoreError> {
        let votes = self.votes.read();
        let start = (poll_id.to_string(), String::new());
        Ok(votes
            .range(start..)
            .take_while(|((id, _), _)| id == poll_id)
            .map(|(_, vote)| vote.clone())
            .collect())
    }

    fn upsert_vote(&self, vote: Vote) -> Result<Option<Vote>, StoreError> {
        if self.polls.get(&vote.poll_id)?.is_none() {
            return Err(StoreError::NotFound {
                kind: "poll",
                id: vote.poll_id,
            });
        }

        let key = (vote.poll_id.clone(), vote.voter_id.clone());
        // The write lock covers the whole replace, so one key never holds two votes
        let replaced = self.votes.write().insert(key, vote);
        Ok(replaced)
    }
}

/// Mutable reaction counters
#[derive(Debug, Default)]
pub struct MemoryReactions {
    counts: RwLock<HashMap<String, Engagement>>,
}

impl MemoryReactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(counts: HashMap<String, Engagement>) -> Self {
        Self {
            counts: RwLock::new(counts),
        }
    }

    pub fn set(&self, content_id: impl Into<String>, engagement: Engagement) {
        self.counts.write().insert(content_id.into(), engagement);
    }

    pub fn like(&self, content_id: &str) {
        let mut counts = self.counts.write();
        counts.entry(content_id.to_string()).or_default().like_count += 1;
    }

    pub fn comment(&self, content_id: &str) {
        let mut counts = self.counts.write();
        counts.entry(content_id.to_string()).or_default().comment_count += 1;
    }

    pub fn snapshot(&self) -> HashMap<String, Engagement> {
        self.counts.read().clone()
    }
}

impl ReactionSource for MemoryReactions {
    fn engagement(&self, content_id: &str) -> Engagement {
        self.counts
            .read()
            .get(content_id)
            .copied()
            .unwrap_or_default()
    }
}
