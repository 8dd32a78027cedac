//! Polling Module
//!
//! Poll lifecycle, one-vote-per-voter submission and live tallies.

pub mod config;
pub mod engine;
pub mod tally;

pub use config::PollsConfig;
pub use engine::{PollEngine, PollError};
pub use tally::{OptionTally, Tally};
