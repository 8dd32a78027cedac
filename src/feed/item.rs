//! Feed items
//!
//! A [`FeedItem`] is the read-only projection of one content record: the
//! record itself, its sort timestamp and the engagement counters handed over
//! by the reaction source. Poll items also carry the tally at render time.

use super::FeedError;
use crate::content::{
    ContentKind, ContentRecord, Event, Message, Poll, Record, TaskPosting, Vote,
    DEFAULT_MAX_OPTIONS,
};
use crate::polls::Tally;
use crate::store::Engagement;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the merged feed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Sort key, the record's creation time
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub engagement: Engagement,
    #[serde(flatten)]
    pub payload: FeedPayload,
}

/// Kind-specific payload, tagged with `kind` when serialized
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedPayload {
    Message(Message),
    Task(TaskPosting),
    Event(Event),
    Poll(PollCard),
}

/// A poll as rendered in the feed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollCard {
    #[serde(flatten)]
    pub poll: Poll,
    pub tally: Tally,
    pub is_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leading_option: Option<usize>,
}

impl PollCard {
    pub fn new<'a, I>(poll: Poll, votes: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a Vote>,
    {
        let tally = Tally::compute(&poll, votes);
        Self {
            is_open: poll.is_open_at(now),
            leading_option: tally.leading_option(),
            tally,
            poll,
        }
    }
}

impl FeedItem {
    /// Project a classified record.
    ///
    /// `poll_votes` is only read for polls; votes for other polls are ignored.
    pub fn project<'a, I>(
        record: ContentRecord,
        poll_votes: I,
        engagement: Engagement,
        now: DateTime<Utc>,
    ) -> Self
    where
        I: IntoIterator<Item = &'a Vote>,
    {
        let timestamp = record.meta().created_at;
        let payload = match record {
            ContentRecord::Message(m) => FeedPayload::Message(m),
            ContentRecord::Task(t) => FeedPayload::Task(t),
            ContentRecord::Event(e) => FeedPayload::Event(e),
            ContentRecord::Poll(p) => FeedPayload::Poll(PollCard::new(p, poll_votes, now)),
        };
        Self {
            timestamp,
            engagement,
            payload,
        }
    }

    pub fn kind(&self) -> ContentKind {
        match &self.payload {
            FeedPayload::Message(_) => ContentKind::Message,
            FeedPayload::Task(_) => ContentKind::Task,
            FeedPayload::Event(_) => ContentKind::Event,
            FeedPayload::Poll(_) => ContentKind::Poll,
        }
    }

    pub fn id(&self) -> &str {
        match &self.payload {
            FeedPayload::Message(m) => m.id(),
            FeedPayload::Task(t) => t.id(),
            FeedPayload::Event(e) => e.id(),
            FeedPayload::Poll(card) => card.poll.id(),
        }
    }
}

/// An unclassified record as an external store hands it over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub kind: String,
    pub body: serde_json::Value,
}

impl RawRecord {
    pub fn new(kind: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            body,
        }
    }

    /// Wrap an already typed record
    pub fn from_record<T: Record + Serialize>(record: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(T::KIND.as_str(), serde_json::to_value(record)?))
    }

    /// The body's `id` field, if it has one
    pub fn id_hint(&self) -> Option<&str> {
        self.body.get("id").and_then(|v| v.as_str())
    }

    /// Decode the body according to `kind` and validate it.
    ///
    /// Unknown kinds are never mapped onto a default kind.
    pub fn classify(&self) -> Result<ContentRecord, FeedError> {
        self.classify_with_poll_limit(DEFAULT_MAX_OPTIONS)
    }

    /// Like [`RawRecord::classify`], checking polls against `max_poll_options`
    pub fn classify_with_poll_limit(&self, max_poll_options: usize) -> Result<ContentRecord, FeedError> {
        let record = self.decode()?;
        record
            .validate_with_poll_limit(max_poll_options)
            .map_err(|e| FeedError::Malformed {
                kind: record.kind(),
                reason: e.to_string(),
            })?;
        Ok(record)
    }

    /// Decode the body according to `kind` without validating its fields
    pub fn decode(&self) -> Result<ContentRecord, FeedError> {
        let kind: ContentKind = self.kind.parse().map_err(|_| FeedError::InvalidKind {
            kind: self.kind.clone(),
        })?;

        let body = self.body.clone();
        match kind {
            ContentKind::Message => serde_json::from_value(body).map(ContentRecord::Message),
            ContentKind::Task => serde_json::from_value(body).map(ContentRecord::Task),
            ContentKind::Event => serde_json::from_value(body).map(ContentRecord::Event),
            ContentKind::Poll => serde_json::from_value(body).map(ContentRecord::Poll),
        }
        .map_err(|e| FeedError::Malformed {
            kind,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use serde_json::json;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 29, 9, 0, 0).unwrap() + TimeDelta::minutes(minutes)
    }

    #[test]
    fn test_classify_message() {
        let raw = RawRecord::new(
            "message",
            json!({
                "id": "m1",
                "authorId": "user1",
                "createdAt": "2024-07-29T09:00:00Z",
                "updatedAt": "2024-07-29T09:00:00Z",
                "content": "Sprint planning moved to 2pm"
            }),
        );
        assert_eq!(raw.id_hint(), Some("m1"));

        match raw.classify().unwrap() {
            ContentRecord::Message(m) => assert_eq!(m.content, "Sprint planning moved to 2pm"),
            other => panic!("Expected message, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_classify_unknown_kind() {
        let raw = RawRecord::new("announcement", json!({"id": "a1"}));
        assert_eq!(
            raw.classify().unwrap_err(),
            FeedError::InvalidKind {
                kind: "announcement".to_string()
            }
        );
    }

    #[test]
    fn test_classify_bad_task_status_is_malformed() {
        let raw = RawRecord::new(
            "task",
            json!({
                "id": "t1",
                "authorId": "user1",
                "createdAt": "2024-07-29T09:00:00Z",
                "updatedAt": "2024-07-29T09:00:00Z",
                "title": "Write docs",
                "status": "done"
            }),
        );
        assert!(matches!(
            raw.classify().unwrap_err(),
            FeedError::Malformed {
                kind: ContentKind::Task,
                ..
            }
        ));
    }

    #[test]
    fn test_classify_runs_validation() {
        let event = Event::new("user1", "Retro", t(60), t(0)).with_id("e1");
        let raw = RawRecord::from_record(&event).unwrap();
        assert_eq!(raw.kind, "event");

        let err = raw.classify().unwrap_err();
        assert!(matches!(
            err,
            FeedError::Malformed {
                kind: ContentKind::Event,
                ..
            }
        ));
    }

    #[test]
    fn test_poll_item_serializes_tag_and_tally() {
        let poll = Poll::new("user1", "Lunch?", ["Pizza", "Sushi"])
            .with_id("p1")
            .posted_at(t(0))
            .closing_at(t(30));
        let votes = [Vote::new("p1", "alice", 1).at(t(1))];

        let item = FeedItem::project(
            ContentRecord::Poll(poll),
            &votes,
            Engagement::new(3, 1),
            t(10),
        );
        assert_eq!(item.kind(), ContentKind::Poll);
        assert_eq!(item.id(), "p1");
        assert_eq!(item.timestamp, t(0));

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "poll");
        assert_eq!(json["likeCount"], 3);
        assert_eq!(json["commentCount"], 1);
        assert_eq!(json["isOpen"], true);
        assert_eq!(json["leadingOption"], 1);
        assert_eq!(json["tally"]["totalVotes"], 1);
        assert_eq!(json["question"], "Lunch?");
    }

    #[test]
    fn test_message_item_uses_created_at() {
        let message = Message::new("user1", "hello").with_id("m1").posted_at(t(5));
        let item = FeedItem::project(
            ContentRecord::Message(message),
            &Vec::<Vote>::new(),
            Engagement::default(),
            t(10),
        );
        assert_eq!(item.timestamp, t(5));

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "message");
        assert_eq!(json["likeCount"], 0);
    }
}
