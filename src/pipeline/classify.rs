// Tweet classifier: decides which attack, if any, to simulate for a tweet.
//
// The decision only looks at counts: how many notes the tweet has, how
// many are candidates (not currently rated helpful), and how many slots
// the top set has.

use serde::{Deserialize, Serialize};

use crate::scoring::attack::AttackPolicy;

/// The case a tweet falls into. Exactly one applies per tweet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TweetCase {
    /// No candidates: every note already holds the status. Nothing to attack.
    Default,
    /// Free slots in the top set: boosting a candidate is enough.
    InsertionOnly,
    /// Top set is full: boost a candidate and dilute the incumbents.
    InsertionAndReplacement,
    /// Anything else.
    Remaining,
}

impl TweetCase {
    /// The attack policy simulated for this case, if any.
    pub fn policy(&self) -> Option<AttackPolicy> {
        match self {
            TweetCase::InsertionOnly => Some(AttackPolicy::insertion_only()),
            TweetCase::InsertionAndReplacement => Some(AttackPolicy::insertion_and_replacement()),
            TweetCase::Default | TweetCase::Remaining => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TweetCase::Default => "default",
            TweetCase::InsertionOnly => "insertion",
            TweetCase::InsertionAndReplacement => "replacement",
            TweetCase::Remaining => "remaining",
        }
    }
}

impl std::fmt::Display for TweetCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify a tweet from its note counts.
pub fn classify(
    total_notes: usize,
    candidate_count: usize,
    currently_helpful_count: usize,
    max_top_notes: usize,
) -> TweetCase {
    if candidate_count == 0 {
        TweetCase::Default
    } else if currently_helpful_count < max_top_notes {
        TweetCase::InsertionOnly
    } else if total_notes > max_top_notes && currently_helpful_count == max_top_notes {
        TweetCase::InsertionAndReplacement
    } else {
        TweetCase::Remaining
    }
}
