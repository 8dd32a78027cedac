//! teamfeed library
//!
//! Aggregates workplace activity (messages, task postings, events and polls)
//! into one reverse-chronological feed, and runs poll voting with live
//! tallies. Persistence, transport and identity are external collaborators
//! reached through the traits in [`store`].

pub mod cli;
pub mod config;
pub mod content;
pub mod events;
pub mod feed;
pub mod logging;
pub mod polls;
pub mod snapshot;
pub mod store;
pub mod tasks;
pub mod workspace;

pub use config::Config;
pub use workspace::{Stores, Workspace, WorkspaceError};
