//! Poll Engine
//!
//! Handles poll creation, vote submission and result calculation on top of
//! a [`PollStore`]. The engine keeps no state of its own: open/closed is
//! evaluated against a clock, and tallies are recomputed from the store.

use super::config::PollsConfig;
use super::tally::Tally;
use crate::content::{Poll, ValidationError, Vote};
use crate::store::{ContentStore, PollStore, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Poll engine error types
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Poll '{0}' not found")]
    NotFound(String),

    #[error("Poll '{poll_id}' closed at {closed_at}")]
    PollClosed {
        poll_id: String,
        closed_at: DateTime<Utc>,
    },

    #[error("Option {index} is out of range for poll '{poll_id}' ({options} options)")]
    InvalidOption {
        poll_id: String,
        index: usize,
        options: usize,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Poll engine over an external poll store
pub struct PollEngine {
    store: Arc<dyn PollStore>,
    config: PollsConfig,
}

impl std::fmt::Debug for PollEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PollEngine {
    pub fn new(store: Arc<dyn PollStore>, config: PollsConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &PollsConfig {
        &self.config
    }

    /// Validate and store a new poll
    pub fn create_poll(&self, poll: Poll) -> Result<Poll, PollError> {
        poll.validate_with_limit(self.config.max_options)?;
        self.store.append(poll.clone())?;
        info!(
            poll_id = %poll.meta.id,
            options = poll.options.len(),
            "poll created"
        );
        Ok(poll)
    }

    pub fn get_poll(&self, poll_id: &str) -> Result<Poll, PollError> {
        self.store
            .get(poll_id)?
            .ok_or_else(|| PollError::NotFound(poll_id.to_string()))
    }

    /// Whether the poll accepts votes at `now`
    pub fn is_open(&self, poll_id: &str, now: DateTime<Utc>) -> Result<bool, PollError> {
        Ok(self.get_poll(poll_id)?.is_open_at(now))
    }

    /// Record a vote now and return the updated tally
    pub fn submit_vote(
        &self,
        poll_id: &str,
        voter_id: &str,
        option_index: usize,
    ) -> Result<Tally, PollError> {
        self.submit_vote_at(poll_id, voter_id, option_index, Utc::now())
    }

    /// Record a vote evaluated at `now`.
    ///
    /// A later vote from the same voter replaces the earlier one. Failed
    /// submissions leave the vote set untouched.
    pub fn submit_vote_at(
        &self,
        poll_id: &str,
        voter_id: &str,
        option_index: usize,
        now: DateTime<Utc>,
    ) -> Result<Tally, PollError> {
        let vote = Vote::new(poll_id, voter_id, option_index).at(now);
        vote.validate()?;

        let poll = self.get_poll(poll_id)?;
        if let Some(closed_at) = poll.expires_at.filter(|_| !poll.is_open_at(now)) {
            debug!(poll_id, voter_id, "vote rejected: poll closed");
            return Err(PollError::PollClosed {
                poll_id: poll_id.to_string(),
                closed_at,
            });
        }
        if option_index >= poll.options.len() {
            return Err(PollError::InvalidOption {
                poll_id: poll_id.to_string(),
                index: option_index,
                options: poll.options.len(),
            });
        }

        let replaced = self.store.upsert_vote(vote)?;
        debug!(
            poll_id,
            voter_id,
            option_index,
            replaced = replaced.is_some(),
            "vote recorded"
        );

        self.tally_poll(&poll)
    }

    /// Current results, recomputed from the stored votes
    pub fn tally(&self, poll_id: &str) -> Result<Tally, PollError> {
        let poll = self.get_poll(poll_id)?;
        self.tally_poll(&poll)
    }

    /// Tally an already-loaded poll
    pub fn tally_poll(&self, poll: &Poll) -> Result<Tally, PollError> {
        let votes = self.store.get_votes(&poll.meta.id)?;
        Ok(Tally::compute(poll, &votes))
    }

    /// Leading option, lowest index on ties
    pub fn leading_option(&self, poll_id: &str) -> Result<Option<usize>, PollError> {
        Ok(self.tally(poll_id)?.leading_option())
    }

    /// The option a voter currently has selected
    pub fn voter_choice(&self, poll_id: &str, voter_id: &str) -> Result<Option<usize>, PollError> {
        let poll = self.get_poll(poll_id)?;
        Ok(self
            .store
            .get_votes(&poll.meta.id)?
            .into_iter()
            .filter(|v| v.voter_id == voter_id)
            .max_by_key(|v| v.cast_at)
            .map(|v| v.option_index))
    }

    pub fn votes(&self, poll_id: &str) -> Result<Vec<Vote>, PollError> {
        Ok(self.store.get_votes(poll_id)?)
    }
}
