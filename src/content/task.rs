//! Task postings
//!
//! Status and priority are closed enumerations. Unknown strings fail both
//! deserialization and `FromStr`; nothing is coerced to a default.

use super::{require_text, ContentKind, ContentMeta, Record, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// Task urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskPriority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownPriority(s.to_string()))
    }
}

/// A unit of work posted to the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPosting {
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workgroup_id: Option<String>,
    /// Free-form labels, passed through untouched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl TaskPosting {
    /// Create a pending, medium-priority task
    pub fn new(author_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            meta: ContentMeta::new(author_id),
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            assignee_id: None,
            due_date: None,
            project_id: None,
            workgroup_id: None,
            tags: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.meta.id = id.into();
        self
    }

    pub fn posted_at(mut self, at: DateTime<Utc>) -> Self {
        self.meta.stamp(at);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn assign_to(mut self, user_id: impl Into<String>) -> Self {
        self.assignee_id = Some(user_id.into());
        self
    }

    pub fn due_on(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn in_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn in_workgroup(mut self, workgroup_id: impl Into<String>) -> Self {
        self.workgroup_id = Some(workgroup_id.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Case-insensitive match over title, description and tags.
    /// `needle` must already be lowercase.
    pub fn mentions(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

impl Record for TaskPosting {
    const KIND: ContentKind = ContentKind::Task;

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ContentMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.meta.validate()?;
        require_text("title", &self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_defaults() {
        let task = TaskPosting::new("user1", "Update documentation");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("in_progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!(
            "done".parse::<TaskStatus>(),
            Err(ValidationError::UnknownStatus("done".to_string()))
        );
        // no case folding
        assert!("Pending".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("high".parse::<TaskPriority>(), Ok(TaskPriority::High));
        assert_eq!(
            "urgent".parse::<TaskPriority>(),
            Err(ValidationError::UnknownPriority("urgent".to_string()))
        );
    }

    #[test]
    fn test_unknown_status_fails_deserialization() {
        let json = serde_json::json!({
            "id": "t1",
            "authorId": "user1",
            "createdAt": "2024-07-29T09:00:00Z",
            "updatedAt": "2024-07-29T09:00:00Z",
            "title": "Fix login bug",
            "status": "blocked"
        });
        assert!(serde_json::from_value::<TaskPosting>(json).is_err());
    }

    #[test]
    fn test_missing_status_defaults_to_pending() {
        let json = serde_json::json!({
            "id": "t1",
            "authorId": "user1",
            "createdAt": "2024-07-29T09:00:00Z",
            "updatedAt": "2024-07-29T09:00:00Z",
            "title": "Fix login bug",
            "priority": "high",
            "dueDate": "2024-07-30"
        });
        let task: TaskPosting = serde_json::from_value(json).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 7, 30));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_mentions_searches_title_description_and_tags() {
        let task = TaskPosting::new("user1", "Bug fix implementation")
            .with_description("Fix the login authentication bug")
            .with_tag("Security");
        assert!(task.mentions("bug"));
        assert!(task.mentions("authentication"));
        assert!(task.mentions("security"));
        assert!(!task.mentions("design"));
    }

    #[test]
    fn test_blank_title_rejected() {
        let task = TaskPosting::new("user1", "");
        assert_eq!(task.validate(), Err(ValidationError::Blank { field: "title" }));
    }
}
