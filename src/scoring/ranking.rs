// Ranking evaluator: decides which notes are "currently rated helpful".
//
// A note is eligible when it has at least `min_ratings` ratings AND a
// helpfulness ratio of at least `min_helpful_ratio`. Eligible notes are
// ranked by ratio, highest first, and only the top `max_top_notes` hold
// the status. Notes with no ratings have no ratio and are never eligible.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::tally::{ScoredNote, TallyDelta, TweetTallies};
use crate::data::models::NoteId;

/// Eligibility thresholds, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// How many top notes hold "currently rated helpful" (default 1)
    pub max_top_notes: usize,
    /// Minimum number of ratings a note needs (default 5)
    pub min_ratings: u32,
    /// Minimum helpful / total ratio a note needs (default 0.84)
    pub min_helpful_ratio: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_top_notes: 1,
            min_ratings: 5,
            min_helpful_ratio: 0.84,
        }
    }
}

impl Thresholds {
    /// Reject thresholds that would make every ranking empty or meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.max_top_notes == 0 {
            anyhow::bail!("max_top_notes must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.min_helpful_ratio) {
            anyhow::bail!(
                "min_helpful_ratio must be between 0.0 and 1.0, got {}",
                self.min_helpful_ratio
            );
        }
        Ok(())
    }

    /// Both conditions must hold at once.
    pub fn is_eligible(&self, note: &ScoredNote) -> bool {
        note.tally.ratings >= self.min_ratings
            && note.ratio.is_some_and(|r| r >= self.min_helpful_ratio)
    }
}

/// Filter, sort and truncate a scored view of a tweet's notes.
///
/// The sort is stable, so notes with equal ratios keep their incoming
/// (first-appearance) order.
pub fn rank_notes(scored: Vec<ScoredNote>, thresholds: &Thresholds) -> Vec<ScoredNote> {
    let mut eligible: Vec<ScoredNote> = scored
        .into_iter()
        .filter(|note| thresholds.is_eligible(note))
        .collect();

    // Every eligible note has a ratio, so the fallback is never used
    eligible.sort_by(|a, b| {
        let a = a.ratio.unwrap_or(0.0);
        let b = b.ratio.unwrap_or(0.0);
        b.total_cmp(&a)
    });
    eligible.truncate(thresholds.max_top_notes);
    eligible
}

/// The notes currently rated helpful for a tweet, best first.
pub fn evaluate(tallies: &TweetTallies, thresholds: &Thresholds) -> Vec<NoteId> {
    rank_notes(tallies.scored(&TallyDelta::none()), thresholds)
        .into_iter()
        .map(|note| note.note_id)
        .collect()
}
