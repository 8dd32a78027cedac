//! Free-text messages

use super::{require_text, ContentKind, ContentMeta, Record, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A free-text message posted to the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workgroup_id: Option<String>,
}

impl Message {
    pub fn new(author_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            meta: ContentMeta::new(author_id),
            content: content.into(),
            project_id: None,
            workgroup_id: None,
        }
    }

    /// Use a caller-supplied id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.meta.id = id.into();
        self
    }

    /// Set the creation time
    pub fn posted_at(mut self, at: DateTime<Utc>) -> Self {
        self.meta.stamp(at);
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
}

impl Record for Message {
    const KIND: ContentKind = ContentKind::Message;

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ContentMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.meta.validate()?;
        require_text("content", &self.content)
    }
}
