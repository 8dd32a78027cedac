//! Polls and votes
//!
//! A poll is open until `expires_at` is reached. There is no stored closed
//! flag; closure is evaluated against the caller's clock.

use super::{require_text, ContentKind, ContentMeta, Record, ValidationError};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Upper bound on options when no configured limit applies
pub const DEFAULT_MAX_OPTIONS: usize = 50;

/// A question with an ordered list of answer options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub question: String,
    /// Answer texts; votes refer to them by position
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workgroup_id: Option<String>,
}

impl Poll {
    pub fn new<I, S>(author_id: impl Into<String>, question: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            meta: ContentMeta::new(author_id),
            question: question.into(),
            options: options.into_iter().map(Into::into).collect(),
            expires_at: None,
            project_id: None,
            workgroup_id: None,
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

    /// Close the poll at a fixed instant
    pub fn closing_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Close the poll a fixed time after its creation
    pub fn open_for(mut self, duration: TimeDelta) -> Self {
        self.expires_at = Some(self.meta.created_at + duration);
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

    /// Open while `expires_at` is unset or still ahead of `now`
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires| now < expires)
    }

    /// Validate against an explicit option limit
    pub fn validate_with_limit(&self, max_options: usize) -> Result<(), ValidationError> {
        self.meta.validate()?;
        require_text("question", &self.question)?;

        if self.options.len() < 2 {
            return Err(ValidationError::TooFewOptions(self.options.len()));
        }
        if self.options.len() > max_options {
            return Err(ValidationError::TooManyOptions {
                count: self.options.len(),
                max: max_options,
            });
        }

        let mut seen = HashSet::new();
        for (index, option) in self.options.iter().enumerate() {
            let text = option.trim();
            if text.is_empty() {
                return Err(ValidationError::BlankOption { index });
            }
            if !seen.insert(text) {
                return Err(ValidationError::DuplicateOption(text.to_string()));
            }
        }
        Ok(())
    }
}

impl Record for Poll {
    const KIND: ContentKind = ContentKind::Poll;

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ContentMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.validate_with_limit(DEFAULT_MAX_OPTIONS)
    }
}

/// One voter's selection in one poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub poll_id: String,
    pub voter_id: String,
    /// Position in the poll's option list
    pub option_index: usize,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(poll_id: impl Into<String>, voter_id: impl Into<String>, option_index: usize) -> Self {
        Self {
            poll_id: poll_id.into(),
            voter_id: voter_id.into(),
            option_index,
            cast_at: Utc::now(),
        }
    }

    /// Set the time the vote was cast
    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.cast_at = at;
        self
    }

    /// Upsert key: one vote per voter per poll
    pub fn key(&self) -> (&str, &str) {
        (&self.poll_id, &self.voter_id)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("pollId", &self.poll_id)?;
        require_text("voterId", &self.voter_id)
    }
}
