// TSV loader for the notes and ratings dumps.
//
// Both files are tab-separated with a header row and many columns we never
// look at. Deserializing by header name lets csv skip the unused columns.
// Two ratings layouts are in circulation: the early dumps carry 0/1
// `helpful` / `notHelpful` columns, later ones a single `helpfulnessLevel`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::models::{Helpfulness, Note, Rating};

#[derive(Debug, Deserialize)]
struct NoteRow {
    #[serde(rename = "noteId")]
    note_id: String,
    #[serde(rename = "tweetId")]
    tweet_id: String,
}

#[derive(Debug, Deserialize)]
struct RatingRow {
    #[serde(rename = "noteId")]
    note_id: String,
    #[serde(default)]
    helpful: Option<String>,
    #[serde(rename = "notHelpful", default)]
    not_helpful: Option<String>,
    #[serde(rename = "helpfulnessLevel", default)]
    helpfulness_level: Option<String>,
}

impl RatingRow {
    /// Resolve the row's helpfulness from whichever layout it uses.
    ///
    /// Returns None when the row carries none of the known columns.
    fn helpfulness(&self) -> Option<Helpfulness> {
        let helpful = self.helpful.as_deref().and_then(parse_flag);
        let not_helpful = self.not_helpful.as_deref().and_then(parse_flag);

        match (helpful, not_helpful) {
            (Some(true), _) => Some(Helpfulness::Helpful),
            (_, Some(true)) => Some(Helpfulness::NotHelpful),
            (Some(false), _) | (_, Some(false)) => Some(Helpfulness::Neither),
            (None, None) => self
                .helpfulness_level
                .as_deref()
                .map(Helpfulness::from_level),
        }
    }
}

/// Parse a 0/1 column. Pandas-exported dumps sometimes write `1.0`.
fn parse_flag(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().map(|v| v != 0.0)
}

fn tsv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

/// Load every note from a notes TSV dump.
pub fn load_notes(path: &Path) -> Result<Vec<Note>> {
    let mut reader = tsv_reader(path)?;
    let mut notes = Vec::new();

    for row in reader.deserialize::<NoteRow>() {
        let row = row.with_context(|| format!("Malformed note row in {}", path.display()))?;
        notes.push(Note {
            note_id: row.note_id.trim().to_string(),
            tweet_id: row.tweet_id.trim().to_string(),
        });
    }

    Ok(notes)
}

/// Load every rating from a ratings TSV dump.
///
/// Fails on the first row that has no recognizable helpfulness column;
/// there is no partial-recovery policy for bad input.
pub fn load_ratings(path: &Path) -> Result<Vec<Rating>> {
    let mut reader = tsv_reader(path)?;
    let mut ratings = Vec::new();

    for row in reader.deserialize::<RatingRow>() {
        let row = row.with_context(|| format!("Malformed rating row in {}", path.display()))?;
        let Some(helpfulness) = row.helpfulness() else {
            anyhow::bail!(
                "Rating for note {} in {} (row {}) has no helpful/notHelpful or \
                 helpfulnessLevel value",
                row.note_id,
                path.display(),
                ratings.len() + 2,
            );
        };
        ratings.push(Rating {
            note_id: row.note_id.trim().to_string(),
            helpfulness,
        });
    }

    Ok(ratings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(helpful: Option<&str>, not_helpful: Option<&str>, level: Option<&str>) -> RatingRow {
        RatingRow {
            note_id: "1".to_string(),
            helpful: helpful.map(str::to_string),
            not_helpful: not_helpful.map(str::to_string),
            helpfulness_level: level.map(str::to_string),
        }
    }

    #[test]
    fn test_legacy_flags() {
        assert_eq!(
            row(Some("1"), Some("0"), None).helpfulness(),
            Some(Helpfulness::Helpful)
        );
        assert_eq!(
            row(Some("0"), Some("1"), None).helpfulness(),
            Some(Helpfulness::NotHelpful)
        );
        assert_eq!(
            row(Some("0"), Some("0"), None).helpfulness(),
            Some(Helpfulness::Neither)
        );
        assert_eq!(
            row(Some("1.0"), None, None).helpfulness(),
            Some(Helpfulness::Helpful)
        );
    }

    #[test]
    fn test_helpfulness_level_layout() {
        assert_eq!(
            row(None, None, Some("HELPFUL")).helpfulness(),
            Some(Helpfulness::Helpful)
        );
        assert_eq!(
            row(None, None, Some("SOMEWHAT_HELPFUL")).helpfulness(),
            Some(Helpfulness::Neither)
        );
        assert_eq!(
            row(None, None, Some("NOT_HELPFUL")).helpfulness(),
            Some(Helpfulness::NotHelpful)
        );
    }

    #[test]
    fn test_legacy_columns_win_over_level() {
        assert_eq!(
            row(Some("0"), Some("1"), Some("HELPFUL")).helpfulness(),
            Some(Helpfulness::NotHelpful)
        );
    }

    #[test]
    fn test_missing_columns() {
        assert_eq!(row(None, None, None).helpfulness(), None);
        assert_eq!(row(Some(""), Some(" "), None).helpfulness(), None);
    }
}
