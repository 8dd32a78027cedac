//! Poll Tally
//!
//! Counts are derived from the vote set on every call. Nothing is cached,
//! so a replaced vote can never be counted twice.

use crate::content::{Poll, Vote};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::warn;

/// Votes for one option
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTally {
    pub index: usize,
    pub text: String,
    pub votes: u32,
    /// Share of all counted votes, 0..=100; 0 when nobody has voted
    pub percentage: f64,
}

/// Current results of a poll
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub poll_id: String,
    pub options: Vec<OptionTally>,
    /// Number of distinct voters counted
    pub total_votes: u32,
    /// Stored votes skipped because their option index is out of range
    #[serde(skip_serializing_if = "is_zero")]
    pub ignored_votes: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl Tally {
    /// Tally `votes` against `poll`.
    ///
    /// Votes for other polls are ignored. If the same voter appears twice the
    /// most recent `cast_at` wins.
    pub fn compute<'a, I>(poll: &Poll, votes: I) -> Self
    where
        I: IntoIterator<Item = &'a Vote>,
    {
        let mut latest: HashMap<&str, &Vote> = HashMap::new();
        for vote in votes {
            if vote.poll_id != poll.meta.id {
                continue;
            }
            match latest.entry(vote.voter_id.as_str()) {
                Entry::Occupied(mut entry) => {
                    if vote.cast_at >= entry.get().cast_at {
                        entry.insert(vote);
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(vote);
                }
            }
        }

        let mut counts = vec![0u32; poll.options.len()];
        let mut ignored_votes = 0;
        for vote in latest.values() {
            match counts.get_mut(vote.option_index) {
                Some(count) => *count += 1,
                None => {
                    ignored_votes += 1;
                    warn!(
                        poll_id = %poll.meta.id,
                        voter_id = %vote.voter_id,
                        option_index = vote.option_index,
                        "skipping stored vote with out-of-range option"
                    );
                }
            }
        }

        let total_votes: u32 = counts.iter().sum();
        let options = poll
            .options
            .iter()
            .zip(counts)
            .enumerate()
            .map(|(index, (text, votes))| OptionTally {
                index,
                text: text.clone(),
                votes,
                percentage: percentage(votes, total_votes),
            })
            .collect();

        Self {
            poll_id: poll.meta.id.clone(),
            options,
            total_votes,
            ignored_votes,
        }
    }

    pub fn votes_for(&self, index: usize) -> Option<u32> {
        self.options.get(index).map(|o| o.votes)
    }

    /// Option with the most votes; the lowest index wins ties.
    /// `None` while nobody has voted.
    pub fn leading_option(&self) -> Option<usize> {
        if self.total_votes == 0 {
            return None;
        }
        let mut best: Option<&OptionTally> = None;
        for option in &self.options {
            if best.map_or(true, |b| option.votes > b.votes) {
                best = Some(option);
            }
        }
        best.map(|o| o.index)
    }

    /// Whole-number percentages that add up to exactly 100 when anyone
    /// has voted (largest remainder, lower index first on equal remainders).
    pub fn whole_percentages(&self) -> Vec<u32> {
        let total = u64::from(self.total_votes);
        if total == 0 {
            return vec![0; self.options.len()];
        }

        let mut shares: Vec<u32> = Vec::with_capacity(self.options.len());
        let mut remainders: Vec<(u64, usize)> = Vec::with_capacity(self.options.len());
        for (index, option) in self.options.iter().enumerate() {
            let scaled = u64::from(option.votes) * 100;
            // scaled / total <= 100
            shares.push((scaled / total) as u32);
            remainders.push((scaled % total, index));
        }

        let assigned: u32 = shares.iter().sum();
        remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        for &(_, index) in remainders.iter().take(100u32.saturating_sub(assigned) as usize) {
            shares[index] += 1;
        }
        shares
    }
}

fn percentage(votes: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(votes) / f64::from(total) * 100.0
    }
}
