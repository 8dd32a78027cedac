//! Task Filter
//!
//! Pure status/priority filtering for the task board. The matching subset
//! and its summary counts are produced in one pass over the input.

use crate::content::{TaskPosting, TaskPriority, TaskStatus, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `all` or one specific status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl From<TaskStatus> for StatusFilter {
    fn from(status: TaskStatus) -> Self {
        StatusFilter::Only(status)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => fmt::Display::fmt(status, f),
        }
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.to_string()
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for StatusFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

/// Task board query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    /// Case-insensitive text over title, description and tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: impl Into<StatusFilter>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }
}

/// Status counts over the narrowed task set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl TaskSummary {
    fn count(&mut self, status: TaskStatus) {
        self.total += 1;
        match status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
        }
    }

    pub fn for_status(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Pending => self.pending,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Completed => self.completed,
        }
    }
}

/// Filtered tasks in input order plus their summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBoard<'a> {
    pub tasks: Vec<&'a TaskPosting>,
    pub summary: TaskSummary,
}

impl TaskBoard<'_> {
    pub fn to_listing(&self) -> TaskListing {
        TaskListing {
            tasks: self.tasks.iter().map(|t| (*t).clone()).collect(),
            summary: self.summary,
        }
    }
}

/// Owned copy of a board
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListing {
    pub tasks: Vec<TaskPosting>,
    pub summary: TaskSummary,
}

/// Filter `tasks` by `query`.
///
/// Priority and search narrow the set the summary is computed over; the
/// status filter then picks from that set. With `StatusFilter::All` the
/// board holds exactly `summary.total` tasks.
pub fn filter_tasks<'a>(tasks: &'a [TaskPosting], query: &TaskQuery) -> TaskBoard<'a> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut summary = TaskSummary::default();
    let mut matching = Vec::new();
    for task in tasks {
        if query.priority.is_some_and(|p| p != task.priority) {
            continue;
        }
        if needle.as_deref().is_some_and(|n| !task.mentions(n)) {
            continue;
        }
        summary.count(task.status);
        if query.status.matches(task.status) {
            matching.push(task);
        }
    }

    TaskBoard {
        tasks: matching,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks() -> Vec<TaskPosting> {
        vec![
            TaskPosting::new("u1", "Write API docs")
                .with_id("t1")
                .with_status(TaskStatus::Pending)
                .with_priority(TaskPriority::High)
                .with_tag("docs"),
            TaskPosting::new("u1", "Fix login bug")
                .with_id("t2")
                .with_status(TaskStatus::InProgress)
                .with_description("Users get logged out after refresh"),
            TaskPosting::new("u2", "Release 1.2")
                .with_id("t3")
                .with_status(TaskStatus::Completed)
                .with_priority(TaskPriority::High),
            TaskPosting::new("u2", "Update onboarding docs")
                .with_id("t4")
                .with_status(TaskStatus::Pending)
                .with_priority(TaskPriority::Low),
        ]
    }

    fn ids<'a>(board: &TaskBoard<'a>) -> Vec<&'a str> {
        board.tasks.iter().map(|t| t.meta.id.as_str()).collect()
    }

    #[test]
    fn test_all_returns_total() {
        let tasks = tasks();
        let board = filter_tasks(&tasks, &TaskQuery::new());

        assert_eq!(board.tasks.len(), board.summary.total);
        assert_eq!(ids(&board), vec!["t1", "t2", "t3", "t4"]);
        assert_eq!(
            board.summary,
            TaskSummary {
                total: 4,
                pending: 2,
                in_progress: 1,
                completed: 1
            }
        );
    }

    #[test]
    fn test_status_filter_keeps_counts() {
        let tasks = tasks();
        let board = filter_tasks(&tasks, &TaskQuery::new().with_status(TaskStatus::Pending));

        assert_eq!(ids(&board), vec!["t1", "t4"]);
        assert_eq!(board.summary.total, 4);
        assert_eq!(board.summary.for_status(TaskStatus::Pending), 2);
    }

    #[test]
    fn test_counts_sum_to_total() {
        let tasks = tasks();
        for query in [
            TaskQuery::new(),
            TaskQuery::new().with_priority(TaskPriority::High),
            TaskQuery::new().with_search("docs"),
            TaskQuery::new().with_search("nothing matches"),
        ] {
            let s = filter_tasks(&tasks, &query).summary;
            assert_eq!(s.pending + s.in_progress + s.completed, s.total);
        }
    }

    #[test]
    fn test_priority_narrows_summary() {
        let tasks = tasks();
        let board = filter_tasks(&tasks, &TaskQuery::new().with_priority(TaskPriority::High));

        assert_eq!(ids(&board), vec!["t1", "t3"]);
        assert_eq!(board.summary.total, 2);
        assert_eq!(board.summary.completed, 1);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let tasks = tasks();

        let board = filter_tasks(&tasks, &TaskQuery::new().with_search("DOCS"));
        assert_eq!(ids(&board), vec!["t1", "t4"]);

        let board = filter_tasks(&tasks, &TaskQuery::new().with_search("logged out"));
        assert_eq!(ids(&board), vec!["t2"]);

        // Blank search matches everything
        let board = filter_tasks(&tasks, &TaskQuery::new().with_search("  "));
        assert_eq!(board.summary.total, 4);
    }

    #[test]
    fn test_empty_input() {
        let board = filter_tasks(&[], &TaskQuery::new());
        assert!(board.tasks.is_empty());
        assert_eq!(board.summary, TaskSummary::default());
    }

    #[test]
    fn test_status_filter_from_str() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "in_progress".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(TaskStatus::InProgress)
        );
        assert_eq!(
            "done".parse::<StatusFilter>().unwrap_err(),
            ValidationError::UnknownStatus("done".to_string())
        );
        assert_eq!(StatusFilter::Only(TaskStatus::Completed).to_string(), "completed");

        let query: TaskQuery =
            serde_json::from_str(r#"{"status": "pending", "priority": "high"}"#).unwrap();
        assert_eq!(query.status, StatusFilter::Only(TaskStatus::Pending));
        assert_eq!(query.priority, Some(TaskPriority::High));
    }
}
