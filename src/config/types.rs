//! Typed configuration structures
//!
//! Every section is optional in the file and falls back to its defaults.

use crate::feed::FeedConfig;
use crate::logging::LoggingConfig;
use crate::polls::PollsConfig;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Feed paging and strictness
    pub feed: FeedConfig,

    /// Poll creation limits
    pub polls: PollsConfig,
}

impl Config {
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    pub fn with_feed(mut self, feed: FeedConfig) -> Self {
        self.feed = feed;
        self
    }

    pub fn with_polls(mut self, polls: PollsConfig) -> Self {
        self.polls = polls;
        self
    }
}
