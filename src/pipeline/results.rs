// Run results: the per-tweet outcome collections a batch run produces.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::data::models::TweetId;
use crate::scoring::ranking::Thresholds;

/// Parameters and bookkeeping for one batch run, persisted alongside results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub generated_at: String,
    pub thresholds: Thresholds,
    pub account_cap: u32,
    /// Seed used for candidate selection. CLI runs always record it;
    /// `None` only appears when the library is driven without one.
    pub seed: Option<u64>,
    pub tweets_analyzed: usize,
}

/// Everything a batch run learned, keyed by tweet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackResults {
    /// Accounts needed when the top set has free slots (insertion only)
    pub insertion: BTreeMap<TweetId, u32>,
    /// Accounts needed when the top set is full (insertion + replacement)
    pub replacement: BTreeMap<TweetId, u32>,
    /// Tweets with no candidate notes, so no attack applies
    pub default: BTreeSet<TweetId>,
    /// Tweets that fit none of the other cases
    pub remaining: BTreeSet<TweetId>,
    /// Tweets whose simulation hit the account cap without flipping
    pub capped: BTreeSet<TweetId>,
    pub metadata: RunMetadata,
}

impl AttackResults {
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            insertion: BTreeMap::new(),
            replacement: BTreeMap::new(),
            default: BTreeSet::new(),
            remaining: BTreeSet::new(),
            capped: BTreeSet::new(),
            metadata,
        }
    }

    /// Number of tweets recorded in any collection.
    pub fn tweet_count(&self) -> usize {
        self.insertion.len() + self.replacement.len() + self.default.len() + self.remaining.len()
    }

    /// How many tweets needed each account count, indexed 1..=cap.
    pub fn histogram(accounts: &BTreeMap<TweetId, u32>, cap: u32) -> Vec<(u32, usize)> {
        (1..=cap)
            .map(|k| (k, accounts.values().filter(|&&v| v == k).count()))
            .collect()
    }
}
