// Unit tests for the ranking evaluator.
//
// Covers the eligibility rules, the ordering and size of the top set, and
// properties that must hold for any tally combination (checked over a
// grid of small tallies rather than hand-picked cases).

use notewatch::scoring::ranking::{evaluate, rank_notes, Thresholds};
use notewatch::scoring::tally::{NoteTally, TallyDelta, TweetTallies};

/// Every (helpful, not_helpful, neither) combination up to `max` each.
fn tally_grid(max: u32) -> Vec<NoteTally> {
    let mut grid = Vec::new();
    for helpful in 0..=max {
        for not_helpful in 0..=max {
            for neither in 0..=1 {
                grid.push(NoteTally::new(
                    helpful,
                    not_helpful,
                    helpful + not_helpful + neither,
                ));
            }
        }
    }
    grid
}

/// Deterministic tweets built from windows over the grid.
fn sample_tweets() -> Vec<TweetTallies> {
    let grid = tally_grid(7);
    (0..grid.len())
        .step_by(3)
        .map(|start| {
            TweetTallies::from_tallies(
                grid.iter()
                    .cycle()
                    .skip(start)
                    .take(1 + start % 6)
                    .enumerate()
                    .map(|(i, tally)| (format!("note{i}"), *tally)),
            )
        })
        .collect()
}

// ============================================================
// Scenarios
// ============================================================

#[test]
fn single_fully_helpful_note_is_currently_rated_helpful() {
    let tallies = TweetTallies::from_tallies([("N1", NoteTally::new(6, 0, 6))]);
    assert_eq!(evaluate(&tallies, &Thresholds::default()), vec!["N1"]);
}

#[test]
fn note_below_ratio_threshold_is_not_ranked() {
    let tallies = TweetTallies::from_tallies([("N1", NoteTally::new(4, 1, 5))]);
    assert!(evaluate(&tallies, &Thresholds::default()).is_empty());
}

#[test]
fn highest_ratio_wins_the_single_slot() {
    let tallies = TweetTallies::from_tallies([
        ("good", NoteTally::new(17, 3, 20)),
        ("better", NoteTally::new(19, 1, 20)),
    ]);
    assert_eq!(evaluate(&tallies, &Thresholds::default()), vec!["better"]);
}

#[test]
fn neither_ratings_dilute_the_ratio() {
    // 5 helpful out of 6 total: 0.833 < 0.84 even with no not-helpful votes
    let tallies = TweetTallies::from_tallies([("N1", NoteTally::new(5, 0, 6))]);
    assert!(evaluate(&tallies, &Thresholds::default()).is_empty());
}

// ============================================================
// Properties over the tally grid
// ============================================================

#[test]
fn unrated_notes_never_ranked() {
    let permissive = Thresholds {
        max_top_notes: 10,
        min_ratings: 0,
        min_helpful_ratio: 0.0,
    };
    for tweet in sample_tweets() {
        for thresholds in [Thresholds::default(), permissive] {
            for id in evaluate(&tweet, &thresholds) {
                assert!(
                    tweet.get(&id).unwrap().ratings > 0,
                    "unrated note {id} was ranked"
                );
            }
        }
    }
}

#[test]
fn output_bounded_and_sorted() {
    for max_top_notes in 1..=3 {
        let thresholds = Thresholds {
            max_top_notes,
            min_ratings: 2,
            min_helpful_ratio: 0.5,
        };
        for tweet in sample_tweets() {
            let ranked = rank_notes(tweet.scored(&TallyDelta::none()), &thresholds);
            assert!(ranked.len() <= max_top_notes);
            for pair in ranked.windows(2) {
                assert!(pair[0].ratio >= pair[1].ratio, "ranking not sorted: {pair:?}");
            }
            for note in &ranked {
                assert!(thresholds.is_eligible(note));
            }
        }
    }
}

#[test]
fn evaluation_is_idempotent() {
    let thresholds = Thresholds {
        max_top_notes: 2,
        ..Thresholds::default()
    };
    for tweet in sample_tweets() {
        let before = tweet.clone();
        let first = evaluate(&tweet, &thresholds);
        let second = evaluate(&tweet, &thresholds);
        assert_eq!(first, second);
        assert_eq!(tweet, before, "evaluation mutated the tallies");
    }
}

#[test]
fn fewer_eligible_notes_than_slots() {
    let thresholds = Thresholds {
        max_top_notes: 3,
        ..Thresholds::default()
    };
    let tallies = TweetTallies::from_tallies([
        ("a", NoteTally::new(6, 0, 6)),
        ("b", NoteTally::new(1, 5, 6)),
    ]);
    assert_eq!(evaluate(&tallies, &thresholds), vec!["a"]);
}
