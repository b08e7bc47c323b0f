// Dataset layer: loads the notes and ratings dumps and joins them per tweet.
//
// Both files are read once at startup and never change during a run. The
// join is a left join from notes to ratings, so a note nobody rated still
// shows up under its tweet with zero counts.

pub mod models;
pub mod tsv;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use models::{Helpfulness, Note, NoteId, Rating, TweetId, TweetRatings};

/// The full notes and ratings dataset for one run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub notes: Vec<Note>,
    pub ratings: Vec<Rating>,
}

impl Dataset {
    /// Load both dumps. Any I/O or parse failure aborts the whole run.
    pub fn load(notes_path: &Path, ratings_path: &Path) -> Result<Self> {
        let notes = tsv::load_notes(notes_path)?;
        info!(count = notes.len(), path = %notes_path.display(), "Loaded notes");

        let ratings = tsv::load_ratings(ratings_path)?;
        info!(count = ratings.len(), path = %ratings_path.display(), "Loaded ratings");

        Ok(Self { notes, ratings })
    }

    /// Join ratings onto notes and group the result by tweet.
    ///
    /// Tweets come back ordered by id so repeated runs visit them in the
    /// same order. Within a tweet, notes keep their first-appearance order
    /// from the notes file. A note id listed twice is kept once.
    /// Ratings for notes missing from the notes file are dropped.
    pub fn group_by_tweet(&self) -> BTreeMap<TweetId, TweetRatings> {
        let mut ratings_by_note: HashMap<&str, Vec<Helpfulness>> = HashMap::new();
        for rating in &self.ratings {
            ratings_by_note
                .entry(rating.note_id.as_str())
                .or_default()
                .push(rating.helpfulness);
        }

        let mut seen: HashSet<&NoteId> = HashSet::new();
        let mut grouped: BTreeMap<TweetId, TweetRatings> = BTreeMap::new();
        for note in &self.notes {
            if !seen.insert(&note.note_id) {
                warn!(note_id = %note.note_id, "Duplicate note row, keeping the first");
                continue;
            }
            let ratings = ratings_by_note
                .remove(note.note_id.as_str())
                .unwrap_or_default();
            grouped
                .entry(note.tweet_id.clone())
                .or_default()
                .notes
                .push((note.note_id.clone(), ratings));
        }

        if !ratings_by_note.is_empty() {
            let orphaned: usize = ratings_by_note.values().map(Vec::len).sum();
            warn!(
                notes = ratings_by_note.len(),
                ratings = orphaned,
                "Ratings reference notes missing from the notes file, ignoring them"
            );
        }

        grouped
    }

    /// Ratings grouped for a single tweet, if any note belongs to it.
    pub fn tweet(&self, tweet_id: &str) -> Option<TweetRatings> {
        let note_ids: HashSet<&str> = self
            .notes
            .iter()
            .filter(|n| n.tweet_id == tweet_id)
            .map(|n| n.note_id.as_str())
            .collect();
        if note_ids.is_empty() {
            return None;
        }

        let subset = Dataset {
            notes: self
                .notes
                .iter()
                .filter(|n| n.tweet_id == tweet_id)
                .cloned()
                .collect(),
            ratings: self
                .ratings
                .iter()
                .filter(|r| note_ids.contains(r.note_id.as_str()))
                .cloned()
                .collect(),
        };
        subset.group_by_tweet().remove(tweet_id)
    }
}
