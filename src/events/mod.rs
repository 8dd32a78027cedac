//! Event Schedule
//!
//! Calendar queries over scheduled events.

use crate::content::Event;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

fn by_start<'a>(mut events: Vec<&'a Event>) -> Vec<&'a Event> {
    events.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.meta.id.cmp(&b.meta.id))
    });
    events
}

/// Events that have not ended yet, soonest first (0 = no limit)
pub fn upcoming<'a>(events: &'a [Event], now: DateTime<Utc>, limit: usize) -> Vec<&'a Event> {
    let mut found = by_start(events.iter().filter(|e| e.end_time > now).collect());
    if limit > 0 {
        found.truncate(limit);
    }
    found
}

/// Events overlapping the given UTC calendar day
pub fn on_day(events: &[Event], date: NaiveDate) -> Vec<&Event> {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    let Some(end) = start.checked_add_signed(TimeDelta::days(1)) else {
        return Vec::new();
    };
    by_start(events.iter().filter(|e| e.overlaps(start, end)).collect())
}
