//! Feed Module
//!
//! Merges messages, task postings, events and polls into one
//! reverse-chronological feed. Aggregation is read-only: records that fail
//! classification or validation are skipped and reported on the page
//! instead of aborting the whole feed.

pub mod aggregator;
pub mod config;
pub mod item;

pub use aggregator::{FeedAggregator, FeedPage, FeedQuery, FeedSources, RejectedRecord};
pub use config::FeedConfig;
pub use item::{FeedItem, FeedPayload, PollCard, RawRecord};

use crate::content::ContentKind;
use thiserror::Error;

/// Feed error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("Unrecognized feed item kind: {kind}")]
    InvalidKind { kind: String },

    #[error("Malformed {kind} record: {reason}")]
    Malformed { kind: ContentKind, reason: String },

    #[error("Feed is empty")]
    EmptyInput,
}
