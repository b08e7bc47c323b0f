// Dataset models: the rows that flow out of the notes and ratings dumps.
//
// These are separate from the loader so scoring and pipeline code can use
// them without depending on the csv crate directly.

use serde::{Deserialize, Serialize};

/// Identifier of a note, kept as the raw string from the dump.
pub type NoteId = String;

/// Identifier of the annotated tweet a note belongs to.
pub type TweetId = String;

/// A note attached to exactly one tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub note_id: NoteId,
    pub tweet_id: TweetId,
}

/// A single participant's judgment of one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub note_id: NoteId,
    pub helpfulness: Helpfulness,
}

/// Tri-state helpfulness flag carried by a rating.
///
/// `Neither` still counts toward a note's rating total but adds to neither
/// the helpful nor the not-helpful count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Helpfulness {
    Helpful,
    NotHelpful,
    Neither,
}

impl Helpfulness {
    /// Map a `helpfulnessLevel` value from the newer ratings layout.
    ///
    /// Unknown and empty levels map to `Neither` so a rating is never dropped.
    pub fn from_level(level: &str) -> Self {
        match level.trim() {
            "HELPFUL" => Helpfulness::Helpful,
            "NOT_HELPFUL" => Helpfulness::NotHelpful,
            _ => Helpfulness::Neither,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Helpfulness::Helpful => "helpful",
            Helpfulness::NotHelpful => "not helpful",
            Helpfulness::Neither => "neither",
        }
    }
}

impl std::fmt::Display for Helpfulness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every note of one tweet with the ratings it received.
///
/// This is the left join of notes onto ratings: notes nobody rated are
/// present with an empty rating list. Notes keep their first-appearance
/// order from the notes file, which later serves as the ranking tie-break.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TweetRatings {
    pub notes: Vec<(NoteId, Vec<Helpfulness>)>,
}

impl TweetRatings {
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn rating_count(&self) -> usize {
        self.notes.iter().map(|(_, r)| r.len()).sum()
    }
}
