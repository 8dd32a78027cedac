//! Feed Configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedConfig {
    /// Fail with `EmptyInput` instead of returning an empty feed
    pub require_non_empty: bool,
    /// Items per page when the query has no limit (0 = unlimited)
    pub default_limit: usize,
}

impl FeedConfig {
    pub fn require_non_empty(mut self, require: bool) -> Self {
        self.require_non_empty = require;
        self
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }
}
