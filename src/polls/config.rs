//! Poll Configuration

use crate::content::DEFAULT_MAX_OPTIONS;
use serde::{Deserialize, Serialize};

/// Limits applied when polls are created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollsConfig {
    /// Maximum number of answer options per poll
    pub max_options: usize,
}

impl Default for PollsConfig {
    fn default() -> Self {
        Self {
            max_options: DEFAULT_MAX_OPTIONS,
        }
    }
}

impl PollsConfig {
    pub fn with_max_options(mut self, max_options: usize) -> Self {
        self.max_options = max_options;
        self
    }
}
