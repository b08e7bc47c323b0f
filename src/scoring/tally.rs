// Note tallies: the aggregated rating counts a ranking is computed from.
//
// A tweet's tallies are built once from its joined ratings and never
// mutated afterwards. Hypothetical attacks are expressed as a TallyDelta,
// and every evaluation builds a fresh scored view of base + delta. Nothing
// from one simulated round can leak into the next.

use serde::{Deserialize, Serialize};

use crate::data::models::{Helpfulness, NoteId, TweetRatings};

/// Aggregated rating counts for a single note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTally {
    pub helpful: u32,
    pub not_helpful: u32,
    /// Total ratings, including ones that were neither helpful nor not-helpful.
    pub ratings: u32,
}

impl NoteTally {
    pub fn new(helpful: u32, not_helpful: u32, ratings: u32) -> Self {
        Self {
            helpful,
            not_helpful,
            ratings,
        }
    }

    /// Count one more rating.
    pub fn record(&mut self, helpfulness: Helpfulness) {
        self.ratings += 1;
        match helpfulness {
            Helpfulness::Helpful => self.helpful += 1,
            Helpfulness::NotHelpful => self.not_helpful += 1,
            Helpfulness::Neither => {}
        }
    }

    /// Helpful ratings divided by total ratings.
    ///
    /// Undefined (None) for a note nobody rated.
    pub fn ratio(&self) -> Option<f64> {
        if self.ratings == 0 {
            return None;
        }
        Some(self.helpful as f64 / self.ratings as f64)
    }

    /// This tally plus `accounts` fake helpful ratings.
    fn boosted(self, accounts: u32) -> Self {
        Self {
            helpful: self.helpful.saturating_add(accounts),
            not_helpful: self.not_helpful,
            ratings: self.ratings.saturating_add(accounts),
        }
    }

    /// This tally plus `accounts` fake not-helpful ratings.
    fn diluted(self, accounts: u32) -> Self {
        Self {
            helpful: self.helpful,
            not_helpful: self.not_helpful.saturating_add(accounts),
            ratings: self.ratings.saturating_add(accounts),
        }
    }
}

/// A note's tally together with its derived helpfulness ratio.
///
/// Short-lived: built for one evaluation and thrown away.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredNote {
    pub note_id: NoteId,
    pub tally: NoteTally,
    pub ratio: Option<f64>,
}

/// Fake ratings layered on top of a tweet's real tallies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TallyDelta<'a> {
    /// Number of colluding accounts; each adds one rating per affected note.
    pub accounts: u32,
    /// Note receiving a helpful rating from every account.
    pub boosted: Option<&'a str>,
    /// Notes receiving a not-helpful rating from every account.
    pub diluted: &'a [NoteId],
}

impl<'a> TallyDelta<'a> {
    /// The empty delta: scores the real tallies unchanged.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Immutable base tallies for every note of one tweet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TweetTallies {
    notes: Vec<(NoteId, NoteTally)>,
}

impl TweetTallies {
    /// Aggregate a tweet's joined ratings into per-note tallies.
    pub fn from_ratings(ratings: &TweetRatings) -> Self {
        let notes = ratings
            .notes
            .iter()
            .map(|(note_id, note_ratings)| {
                let mut tally = NoteTally::default();
                for &helpfulness in note_ratings {
                    tally.record(helpfulness);
                }
                (note_id.clone(), tally)
            })
            .collect();
        Self { notes }
    }

    /// Build tallies directly, in the given order.
    pub fn from_tallies<I, S>(tallies: I) -> Self
    where
        I: IntoIterator<Item = (S, NoteTally)>,
        S: Into<NoteId>,
    {
        Self {
            notes: tallies
                .into_iter()
                .map(|(id, tally)| (id.into(), tally))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, note_id: &str) -> bool {
        self.notes.iter().any(|(id, _)| id == note_id)
    }

    pub fn get(&self, note_id: &str) -> Option<&NoteTally> {
        self.notes
            .iter()
            .find(|(id, _)| id == note_id)
            .map(|(_, tally)| tally)
    }

    pub fn note_ids(&self) -> impl Iterator<Item = &NoteId> {
        self.notes.iter().map(|(id, _)| id)
    }

    /// Score every note with the delta applied. The base is left untouched.
    pub fn scored(&self, delta: &TallyDelta<'_>) -> Vec<ScoredNote> {
        self.notes
            .iter()
            .map(|(note_id, base)| {
                let mut tally = *base;
                if delta.boosted == Some(note_id.as_str()) {
                    tally = tally.boosted(delta.accounts);
                }
                if delta.diluted.contains(note_id) {
                    tally = tally.diluted(delta.accounts);
                }
                ScoredNote {
                    note_id: note_id.clone(),
                    tally,
                    ratio: tally.ratio(),
                }
            })
            .collect()
    }
}
