//! Feed Aggregator
//!
//! Sort contract: `timestamp` descending, ties broken by `id` ascending.
//! Filtering and windowing happen after classification and never touch the
//! underlying collections.

use super::config::FeedConfig;
use super::item::{FeedItem, RawRecord};
use super::FeedError;
use crate::content::{
    ContentKind, ContentRecord, Event, Message, Poll, TaskPosting, Vote, DEFAULT_MAX_OPTIONS,
};
use crate::store::ReactionSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Which items to return and which page of them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    /// Kinds to include; empty means all
    #[serde(default)]
    pub kinds: BTreeSet<ContentKind>,
    /// Only items strictly older than this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub offset: usize,
    /// Page size (0 = unlimited); falls back to the configured default,
    /// which is unlimited unless set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl FeedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.kinds.insert(kind);
        self
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ContentKind>) -> Self {
        self.kinds.extend(kinds);
        self
    }

    pub fn before(mut self, at: DateTime<Utc>) -> Self {
        self.before = Some(at);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn includes(&self, kind: ContentKind) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }
}

/// Typed collections to aggregate
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedSources<'a> {
    pub messages: &'a [Message],
    pub tasks: &'a [TaskPosting],
    pub events: &'a [Event],
    pub polls: &'a [Poll],
    /// Votes for any of the polls
    pub votes: &'a [Vote],
}

/// A record left out of the feed and why
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub kind: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: FeedError,
}

fn serialize_display<S: Serializer>(error: &FeedError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// One page of the merged feed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    /// Matching items before offset/limit were applied
    pub total: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedRecord>,
}

impl FeedPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ContentKind> + '_ {
        self.items.iter().map(FeedItem::kind)
    }
}

/// Builds feed pages from typed or raw records
#[derive(Debug, Clone)]
pub struct FeedAggregator {
    config: FeedConfig,
    max_poll_options: usize,
}

impl Default for FeedAggregator {
    fn default() -> Self {
        Self::new(FeedConfig::default())
    }
}

impl FeedAggregator {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            max_poll_options: DEFAULT_MAX_OPTIONS,
        }
    }

    /// Option limit stored polls are checked against; should match the
    /// limit polls were created under
    pub fn with_max_poll_options(mut self, max: usize) -> Self {
        self.max_poll_options = max;
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Aggregate typed collections
    pub fn aggregate(
        &self,
        sources: &FeedSources<'_>,
        query: &FeedQuery,
        reactions: &dyn ReactionSource,
        now: DateTime<Utc>,
    ) -> Result<FeedPage, FeedError> {
        let mut records = Vec::new();
        if query.includes(ContentKind::Message) {
            records.extend(sources.messages.iter().cloned().map(ContentRecord::Message));
        }
        if query.includes(ContentKind::Task) {
            records.extend(sources.tasks.iter().cloned().map(ContentRecord::Task));
        }
        if query.includes(ContentKind::Event) {
            records.extend(sources.events.iter().cloned().map(ContentRecord::Event));
        }
        if query.includes(ContentKind::Poll) {
            records.extend(sources.polls.iter().cloned().map(ContentRecord::Poll));
        }
        self.assemble(records, Vec::new(), sources.votes, query, reactions, now)
    }

    /// Aggregate unclassified records.
    ///
    /// Every record is decoded before the kind filter applies, so an
    /// unknown kind or undecodable body is reported even when the query
    /// would not include it. Field validation happens during assembly.
    pub fn aggregate_raw(
        &self,
        records: &[RawRecord],
        votes: &[Vote],
        query: &FeedQuery,
        reactions: &dyn ReactionSource,
        now: DateTime<Utc>,
    ) -> Result<FeedPage, FeedError> {
        let mut classified = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();
        for raw in records {
            match raw.decode() {
                Ok(record) if query.includes(record.kind()) => classified.push(record),
                Ok(_) => {}
                Err(error) => {
                    warn!(
                        id = raw.id_hint().unwrap_or("-"),
                        kind = %raw.kind,
                        %error,
                        "skipping unclassifiable feed record"
                    );
                    rejected.push(RejectedRecord {
                        id: raw.id_hint().map(str::to_string),
                        kind: raw.kind.clone(),
                        error,
                    });
                }
            }
        }
        self.assemble(classified, rejected, votes, query, reactions, now)
    }

    fn assemble(
        &self,
        records: Vec<ContentRecord>,
        mut rejected: Vec<RejectedRecord>,
        votes: &[Vote],
        query: &FeedQuery,
        reactions: &dyn ReactionSource,
        now: DateTime<Utc>,
    ) -> Result<FeedPage, FeedError> {
        let mut votes_by_poll: HashMap<&str, Vec<&Vote>> = HashMap::new();
        for vote in votes {
            votes_by_poll
                .entry(vote.poll_id.as_str())
                .or_default()
                .push(vote);
        }

        let mut items = Vec::with_capacity(records.len());
        for record in records {
            if query.before.is_some_and(|before| record.meta().created_at >= before) {
                continue;
            }
            let kind = record.kind();
            if let Err(e) = record.validate_with_poll_limit(self.max_poll_options) {
                let error = FeedError::Malformed {
                    kind,
                    reason: e.to_string(),
                };
                warn!(id = %record.meta().id, %kind, %error, "skipping invalid feed record");
                rejected.push(RejectedRecord {
                    id: Some(record.meta().id.clone()),
                    kind: kind.to_string(),
                    error,
                });
                continue;
            }

            let engagement = reactions.engagement(&record.meta().id);
            let poll_votes: &[&Vote] = votes_by_poll
                .get(record.meta().id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            items.push(FeedItem::project(
                record,
                poll_votes.iter().copied(),
                engagement,
                now,
            ));
        }

        items.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.id().cmp(b.id()))
        });

        let total = items.len();
        if total == 0 && self.config.require_non_empty {
            return Err(FeedError::EmptyInput);
        }

        let limit = match query.limit.unwrap_or(self.config.default_limit) {
            0 => usize::MAX,
            n => n,
        };
        let items: Vec<FeedItem> = items.into_iter().skip(query.offset).take(limit).collect();

        debug!(
            total,
            returned = items.len(),
            rejected = rejected.len(),
            "feed assembled"
        );

        Ok(FeedPage {
            items,
            total,
            rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedPayload;
    use crate::store::{Engagement, NoReactions};
    use chrono::{TimeDelta, TimeZone};
    use serde_json::json;

    fn t(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 29, 9, 0, 0).unwrap() + TimeDelta::seconds(seconds)
    }

    fn message(id: &str, at: DateTime<Utc>) -> Message {
        Message::new("user1", format!("message {id}"))
            .with_id(id)
            .posted_at(at)
    }

    fn ids(page: &FeedPage) -> Vec<&str> {
        page.items.iter().map(FeedItem::id).collect()
    }

    #[test]
    fn test_mixed_kinds_ordered_newest_first() {
        let messages = vec![
            message("m1", t(1000)),
            message("m2", t(2000)),
            message("m3", t(3000)),
        ];
        let tasks = vec![TaskPosting::new("user2", "Review PR")
            .with_id("t1")
            .posted_at(t(2500))];
        let sources = FeedSources {
            messages: &messages,
            tasks: &tasks,
            ..Default::default()
        };

        let page = FeedAggregator::default()
            .aggregate(&sources, &FeedQuery::new(), &NoReactions, t(4000))
            .unwrap();

        assert_eq!(ids(&page), vec!["m3", "t1", "m2", "m1"]);
        assert_eq!(
            page.kinds().collect::<Vec<_>>(),
            vec![
                ContentKind::Message,
                ContentKind::Task,
                ContentKind::Message,
                ContentKind::Message
            ]
        );
        assert_eq!(page.total, 4);
        assert!(page.rejected.is_empty());
    }

    #[test]
    fn test_equal_timestamps_break_ties_by_id() {
        let messages = vec![message("b", t(10)), message("c", t(10)), message("a", t(10))];
        let sources = FeedSources {
            messages: &messages,
            ..Default::default()
        };
        let aggregator = FeedAggregator::default();

        let first = aggregator
            .aggregate(&sources, &FeedQuery::new(), &NoReactions, t(20))
            .unwrap();
        let second = aggregator
            .aggregate(&sources, &FeedQuery::new(), &NoReactions, t(20))
            .unwrap();

        assert_eq!(ids(&first), vec!["a", "b", "c"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_kind_filter() {
        let messages = vec![message("m1", t(1)), message("m2", t(2))];
        let tasks = vec![
            TaskPosting::new("user1", "One").with_id("t1").posted_at(t(3)),
            TaskPosting::new("user1", "Two").with_id("t2").posted_at(t(4)),
        ];
        let events = vec![Event::new("user1", "Standup", t(100), t(200))
            .with_id("e1")
            .posted_at(t(5))];
        let polls = vec![Poll::new("user1", "Lunch?", ["Pizza", "Sushi"])
            .with_id("p1")
            .posted_at(t(6))];
        let sources = FeedSources {
            messages: &messages,
            tasks: &tasks,
            events: &events,
            polls: &polls,
            votes: &[],
        };

        let query = FeedQuery::new().with_kinds([ContentKind::Task, ContentKind::Poll]);
        let page = FeedAggregator::default()
            .aggregate(&sources, &query, &NoReactions, t(10))
            .unwrap();

        assert_eq!(page.items.len(), 3);
        assert!(page
            .kinds()
            .all(|k| k == ContentKind::Task || k == ContentKind::Poll));
        assert_eq!(ids(&page), vec!["p1", "t2", "t1"]);
    }

    #[test]
    fn test_empty_feed_is_valid_by_default() {
        let page = FeedAggregator::default()
            .aggregate(&FeedSources::default(), &FeedQuery::new(), &NoReactions, t(0))
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_require_non_empty() {
        let aggregator = FeedAggregator::new(FeedConfig::default().require_non_empty(true));
        let err = aggregator
            .aggregate(&FeedSources::default(), &FeedQuery::new(), &NoReactions, t(0))
            .unwrap_err();
        assert_eq!(err, FeedError::EmptyInput);

        // A page past the end is not an empty feed
        let messages = vec![message("m1", t(1))];
        let sources = FeedSources {
            messages: &messages,
            ..Default::default()
        };
        let page = aggregator
            .aggregate(&sources, &FeedQuery::new().offset(5), &NoReactions, t(2))
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_before_offset_and_limit() {
        let messages: Vec<Message> = (1..=6).map(|i| message(&format!("m{i}"), t(i))).collect();
        let sources = FeedSources {
            messages: &messages,
            ..Default::default()
        };
        let aggregator = FeedAggregator::default();

        let page = aggregator
            .aggregate(
                &sources,
                &FeedQuery::new().before(t(5)).offset(1).limit(2),
                &NoReactions,
                t(10),
            )
            .unwrap();
        assert_eq!(ids(&page), vec!["m3", "m2"]);
        assert_eq!(page.total, 4);
    }

    #[test]
    fn test_default_limit_applies() {
        let messages: Vec<Message> = (1..=5).map(|i| message(&format!("m{i}"), t(i))).collect();
        let sources = FeedSources {
            messages: &messages,
            ..Default::default()
        };
        let aggregator = FeedAggregator::new(FeedConfig::default().with_default_limit(2));

        let page = aggregator
            .aggregate(&sources, &FeedQuery::new(), &NoReactions, t(10))
            .unwrap();
        assert_eq!(ids(&page), vec!["m5", "m4"]);

        // Explicit zero means everything
        let page = aggregator
            .aggregate(&sources, &FeedQuery::new().limit(0), &NoReactions, t(10))
            .unwrap();
        assert_eq!(page.items.len(), 5);
    }

    #[test]
    fn test_no_limit_returns_every_match() {
        let tasks: Vec<TaskPosting> = (0..75)
            .map(|i| {
                TaskPosting::new("user1", format!("Task {i}"))
                    .with_id(format!("t{i:02}"))
                    .posted_at(t(i))
            })
            .collect();
        let sources = FeedSources {
            tasks: &tasks,
            ..Default::default()
        };

        let page = FeedAggregator::default()
            .aggregate(&sources, &FeedQuery::new(), &NoReactions, t(100))
            .unwrap();
        assert_eq!(page.items.len(), 75);
        assert_eq!(page.total, 75);
    }

    #[test]
    fn test_records_outside_window_not_reported() {
        let mut broken = message("m3", t(30));
        broken.content = String::new();
        let messages = vec![message("m1", t(10)), message("m2", t(20)), broken];
        let sources = FeedSources {
            messages: &messages,
            ..Default::default()
        };

        let page = FeedAggregator::default()
            .aggregate(&sources, &FeedQuery::new().before(t(25)), &NoReactions, t(40))
            .unwrap();
        assert_eq!(ids(&page), vec!["m2", "m1"]);
        assert!(page.rejected.is_empty());

        let page = FeedAggregator::default()
            .aggregate(&sources, &FeedQuery::new(), &NoReactions, t(40))
            .unwrap();
        assert_eq!(page.rejected.len(), 1);
        assert_eq!(page.rejected[0].id.as_deref(), Some("m3"));
    }

    #[test]
    fn test_poll_option_limit_follows_aggregator_setting() {
        let options: Vec<String> = (1..=55).map(|i| format!("Option {i}")).collect();
        let polls = vec![Poll::new("user1", "Big poll", options)
            .with_id("p1")
            .posted_at(t(1))];
        let sources = FeedSources {
            polls: &polls,
            ..Default::default()
        };

        let page = FeedAggregator::default()
            .aggregate(&sources, &FeedQuery::new(), &NoReactions, t(2))
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.rejected.len(), 1);

        let page = FeedAggregator::default()
            .with_max_poll_options(60)
            .aggregate(&sources, &FeedQuery::new(), &NoReactions, t(2))
            .unwrap();
        assert_eq!(ids(&page), vec!["p1"]);
        assert!(page.rejected.is_empty());

        let raw = vec![RawRecord::from_record(&polls[0]).unwrap()];
        let page = FeedAggregator::default()
            .with_max_poll_options(60)
            .aggregate_raw(&raw, &[], &FeedQuery::new(), &NoReactions, t(2))
            .unwrap();
        assert_eq!(ids(&page), vec!["p1"]);
    }

    #[test]
    fn test_invalid_record_skipped_and_reported() {
        let mut broken = message("m2", t(2));
        broken.content = "   ".to_string();
        let messages = vec![message("m1", t(1)), broken];
        let sources = FeedSources {
            messages: &messages,
            ..Default::default()
        };

        let page = FeedAggregator::default()
            .aggregate(&sources, &FeedQuery::new(), &NoReactions, t(10))
            .unwrap();
        assert_eq!(ids(&page), vec!["m1"]);
        assert_eq!(page.rejected.len(), 1);
        assert_eq!(page.rejected[0].id.as_deref(), Some("m2"));
        assert_eq!(page.rejected[0].kind, "message");
    }

    #[test]
    fn test_engagement_passed_through() {
        let messages = vec![message("m1", t(1)), message("m2", t(2))];
        let sources = FeedSources {
            messages: &messages,
            ..Default::default()
        };
        let mut reactions = HashMap::new();
        reactions.insert("m1".to_string(), Engagement::new(5, 2));

        let page = FeedAggregator::default()
            .aggregate(&sources, &FeedQuery::new(), &reactions, t(10))
            .unwrap();
        assert_eq!(page.items[0].engagement, Engagement::default());
        assert_eq!(page.items[1].engagement, Engagement::new(5, 2));
    }

    #[test]
    fn test_poll_items_carry_tally_and_state() {
        let polls = vec![
            Poll::new("user1", "Open?", ["yes", "no"])
                .with_id("open")
                .posted_at(t(0))
                .closing_at(t(100)),
            Poll::new("user1", "Closed?", ["yes", "no"])
                .with_id("closed")
                .posted_at(t(1))
                .closing_at(t(50)),
        ];
        let votes = vec![
            Vote::new("open", "alice", 1).at(t(10)),
            Vote::new("open", "bob", 1).at(t(11)),
            Vote::new("closed", "alice", 0).at(t(12)),
        ];
        let sources = FeedSources {
            polls: &polls,
            votes: &votes,
            ..Default::default()
        };

        let page = FeedAggregator::default()
            .aggregate(&sources, &FeedQuery::new(), &NoReactions, t(60))
            .unwrap();
        let cards: Vec<_> = page
            .items
            .iter()
            .filter_map(|item| match &item.payload {
                FeedPayload::Poll(card) => Some(card),
                _ => None,
            })
            .collect();

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].poll.meta.id, "closed");
        assert!(!cards[0].is_open);
        assert_eq!(cards[0].tally.total_votes, 1);
        assert_eq!(cards[1].poll.meta.id, "open");
        assert!(cards[1].is_open);
        assert_eq!(cards[1].tally.votes_for(1), Some(2));
        assert_eq!(cards[1].leading_option, Some(1));
    }

    #[test]
    fn test_raw_records_unknown_kind_reported_even_when_filtered() {
        let records = vec![
            RawRecord::from_record(&message("m1", t(1))).unwrap(),
            RawRecord::new("announcement", json!({"id": "x1"})),
            RawRecord::from_record(
                &TaskPosting::new("user1", "Ship it").with_id("t1").posted_at(t(2)),
            )
            .unwrap(),
        ];

        let query = FeedQuery::new().with_kind(ContentKind::Task);
        let page = FeedAggregator::default()
            .aggregate_raw(&records, &[], &query, &NoReactions, t(10))
            .unwrap();

        assert_eq!(ids(&page), vec!["t1"]);
        assert_eq!(page.rejected.len(), 1);
        assert_eq!(page.rejected[0].id.as_deref(), Some("x1"));
        assert_eq!(
            page.rejected[0].error,
            FeedError::InvalidKind {
                kind: "announcement".to_string()
            }
        );

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json["rejected"][0]["error"],
            "Unrecognized feed item kind: announcement"
        );
    }
}
