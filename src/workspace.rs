//! Workspace facade
//!
//! Bundles the content stores with the poll engine and feed aggregator.
//! Writes are validated here before anything reaches a store.

use crate::config::Config;
use crate::content::{
    ContentKind, Event, Message, Poll, Record, TaskPosting, TaskPriority, TaskStatus,
    ValidationError, Vote,
};
use crate::events;
use crate::feed::{FeedAggregator, FeedError, FeedPage, FeedQuery, FeedSources};
use crate::polls::{PollEngine, PollError, Tally};
use crate::store::{
    ContentStore, ListFilter, MemoryPollStore, MemoryReactions, MemoryStore, PollStore,
    ReactionSource, StoreError, TaskStore,
};
use crate::tasks::{filter_tasks, TaskListing, TaskQuery};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Workspace error types
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Store handles a workspace runs on
#[derive(Clone)]
pub struct Stores {
    pub messages: Arc<dyn ContentStore<Message>>,
    pub tasks: Arc<dyn TaskStore>,
    pub events: Arc<dyn ContentStore<Event>>,
    pub polls: Arc<dyn PollStore>,
    pub reactions: Arc<dyn ReactionSource>,
}

impl Stores {
    /// Empty in-memory stores
    pub fn in_memory() -> Self {
        Self {
            messages: Arc::new(MemoryStore::<Message>::new()),
            tasks: Arc::new(MemoryStore::<TaskPosting>::new()),
            events: Arc::new(MemoryStore::<Event>::new()),
            polls: Arc::new(MemoryPollStore::new()),
            reactions: Arc::new(MemoryReactions::new()),
        }
    }
}

pub struct Workspace {
    stores: Stores,
    polls: PollEngine,
    feed: FeedAggregator,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("polls", &self.polls)
            .field("feed", &self.feed)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    pub fn new(stores: Stores, config: &Config) -> Self {
        Self {
            polls: PollEngine::new(stores.polls.clone(), config.polls.clone()),
            feed: FeedAggregator::new(config.feed.clone())
                .with_max_poll_options(config.polls.max_options),
            stores,
        }
    }

    pub fn in_memory(config: &Config) -> Self {
        Self::new(Stores::in_memory(), config)
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn poll_engine(&self) -> &PollEngine {
        &self.polls
    }

    pub fn post_message(&self, message: Message) -> Result<Message, WorkspaceError> {
        message.validate()?;
        self.stores.messages.append(message.clone())?;
        info!(message_id = %message.meta.id, author_id = %message.meta.author_id, "message posted");
        Ok(message)
    }

    pub fn create_task(&self, task: TaskPosting) -> Result<TaskPosting, WorkspaceError> {
        task.validate()?;
        self.stores.tasks.append(task.clone())?;
        info!(task_id = %task.meta.id, status = %task.status, priority = %task.priority, "task created");
        Ok(task)
    }

    pub fn update_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<TaskPosting, WorkspaceError> {
        let task = self.stores.tasks.update_status(task_id, status, Utc::now())?;
        info!(task_id, %status, "task status updated");
        Ok(task)
    }

    pub fn update_task_priority(
        &self,
        task_id: &str,
        priority: TaskPriority,
    ) -> Result<TaskPosting, WorkspaceError> {
        let task = self
            .stores
            .tasks
            .update_priority(task_id, priority, Utc::now())?;
        info!(task_id, %priority, "task priority updated");
        Ok(task)
    }

    pub fn schedule_event(&self, event: Event) -> Result<Event, WorkspaceError> {
        event.validate()?;
        self.stores.events.append(event.clone())?;
        info!(event_id = %event.meta.id, start = %event.start_time, "event scheduled");
        Ok(event)
    }

    pub fn create_poll(&self, poll: Poll) -> Result<Poll, WorkspaceError> {
        Ok(self.polls.create_poll(poll)?)
    }

    pub fn submit_vote(
        &self,
        poll_id: &str,
        voter_id: &str,
        option_index: usize,
    ) -> Result<Tally, WorkspaceError> {
        Ok(self.polls.submit_vote(poll_id, voter_id, option_index)?)
    }

    pub fn submit_vote_at(
        &self,
        poll_id: &str,
        voter_id: &str,
        option_index: usize,
        now: DateTime<Utc>,
    ) -> Result<Tally, WorkspaceError> {
        Ok(self
            .polls
            .submit_vote_at(poll_id, voter_id, option_index, now)?)
    }

    pub fn tally(&self, poll_id: &str) -> Result<Tally, WorkspaceError> {
        Ok(self.polls.tally(poll_id)?)
    }

    pub fn votes(&self, poll_id: &str) -> Result<Vec<Vote>, WorkspaceError> {
        Ok(self.polls.votes(poll_id)?)
    }

    pub fn is_poll_open(&self, poll_id: &str, now: DateTime<Utc>) -> Result<bool, WorkspaceError> {
        Ok(self.polls.is_open(poll_id, now)?)
    }

    pub fn voter_choice(
        &self,
        poll_id: &str,
        voter_id: &str,
    ) -> Result<Option<usize>, WorkspaceError> {
        Ok(self.polls.voter_choice(poll_id, voter_id)?)
    }

    pub fn feed(&self, query: &FeedQuery) -> Result<FeedPage, WorkspaceError> {
        self.feed_at(query, Utc::now())
    }

    /// Assemble the feed as of `now`
    pub fn feed_at(&self, query: &FeedQuery, now: DateTime<Utc>) -> Result<FeedPage, WorkspaceError> {
        let mut filter = ListFilter::new();
        if let Some(before) = query.before {
            filter = filter.created_before(before);
        }

        let messages = if query.includes(ContentKind::Message) {
            self.stores.messages.list(&filter)?
        } else {
            Vec::new()
        };
        let tasks = if query.includes(ContentKind::Task) {
            self.stores.tasks.list(&filter)?
        } else {
            Vec::new()
        };
        let events = if query.includes(ContentKind::Event) {
            self.stores.events.list(&filter)?
        } else {
            Vec::new()
        };
        let polls = if query.includes(ContentKind::Poll) {
            self.stores.polls.list(&filter)?
        } else {
            Vec::new()
        };
        let mut votes = Vec::new();
        for poll in &polls {
            votes.extend(self.stores.polls.get_votes(&poll.meta.id)?);
        }

        let sources = FeedSources {
            messages: &messages,
            tasks: &tasks,
            events: &events,
            polls: &polls,
            votes: &votes,
        };
        Ok(self
            .feed
            .aggregate(&sources, query, self.stores.reactions.as_ref(), now)?)
    }

    /// Filtered tasks, newest first, with status counts
    pub fn task_board(&self, query: &TaskQuery) -> Result<TaskListing, WorkspaceError> {
        let tasks = self.stores.tasks.list(&ListFilter::new())?;
        Ok(filter_tasks(&tasks, query).to_listing())
    }

    pub fn upcoming_events(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Event>, WorkspaceError> {
        let all = self.stores.events.list(&ListFilter::new())?;
        Ok(events::upcoming(&all, now, limit)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn events_on(&self, date: NaiveDate) -> Result<Vec<Event>, WorkspaceError> {
        let all = self.stores.events.list(&ListFilter::new())?;
        Ok(events::on_day(&all, date).into_iter().cloned().collect())
    }
}
