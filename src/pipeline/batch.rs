// Batch driver: classify every tweet and simulate the matching attack.
//
// Tweets are processed one at a time, in tweet-id order. Each tweet's
// simulation only sees its own tallies, so results are independent of
// the order. The one source of nondeterminism is the candidate pick,
// which draws from the caller's RNG.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::classify::{classify, TweetCase};
use super::results::{AttackResults, RunMetadata};
use crate::data::models::{NoteId, TweetId, TweetRatings};
use crate::scoring::attack::{minimum_accounts_to_promote, AttackOutcome, AttackPolicy};
use crate::scoring::ranking::{evaluate, Thresholds};
use crate::scoring::tally::TweetTallies;

/// Fixed parameters for one batch run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub thresholds: Thresholds,
    pub account_cap: u32,
    pub seed: Option<u64>,
}

/// Build the candidate-selection RNG, drawing a fresh seed when none is given.
///
/// The seed actually used is returned and logged so any run can be replayed
/// with `--seed`.
pub fn seeded_rng(seed: Option<u64>) -> (u64, StdRng) {
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    info!(seed, "Candidate selection seeded");
    (seed, StdRng::seed_from_u64(seed))
}

/// What happened to a single tweet.
#[derive(Debug, Clone, PartialEq)]
pub struct TweetAnalysis {
    pub case: TweetCase,
    pub currently_helpful: Vec<NoteId>,
    pub candidates: BTreeSet<NoteId>,
    /// Present when the case called for a simulation
    pub outcome: Option<(AttackPolicy, AttackOutcome)>,
}

/// Rank, classify and (when applicable) attack one tweet.
pub fn analyze_tweet<R: Rng + ?Sized>(
    ratings: &TweetRatings,
    settings: &AnalysisSettings,
    rng: &mut R,
) -> Result<TweetAnalysis> {
    let tallies = TweetTallies::from_ratings(ratings);
    let currently_helpful = evaluate(&tallies, &settings.thresholds);
    let candidates: BTreeSet<NoteId> = tallies
        .note_ids()
        .filter(|id| !currently_helpful.contains(*id))
        .cloned()
        .collect();

    let case = classify(
        tallies.len(),
        candidates.len(),
        currently_helpful.len(),
        settings.thresholds.max_top_notes,
    );

    let outcome = match case.policy() {
        Some(policy) => {
            let outcome = minimum_accounts_to_promote(
                &tallies,
                &candidates,
                &currently_helpful,
                policy,
                &settings.thresholds,
                settings.account_cap,
                rng,
            )?;
            Some((policy, outcome))
        }
        None => None,
    };

    Ok(TweetAnalysis {
        case,
        currently_helpful,
        candidates,
        outcome,
    })
}

/// Run the analysis over every tweet and collect the results.
pub fn run_batch<R: Rng + ?Sized>(
    tweets: &BTreeMap<TweetId, TweetRatings>,
    settings: &AnalysisSettings,
    rng: &mut R,
    show_progress: bool,
) -> Result<AttackResults> {
    let mut results = AttackResults::new(RunMetadata {
        generated_at: chrono::Utc::now().to_rfc3339(),
        thresholds: settings.thresholds,
        account_cap: settings.account_cap,
        seed: settings.seed,
        tweets_analyzed: tweets.len(),
    });

    let pb = if show_progress {
        let pb = ProgressBar::new(tweets.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Tweets [{bar:30}] {pos}/{len} ({eta})")?,
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    for (tweet_id, ratings) in tweets {
        let analysis = analyze_tweet(ratings, settings, rng)
            .with_context(|| format!("Failed to analyze tweet {tweet_id}"))?;

        match (analysis.case, analysis.outcome) {
            (TweetCase::Default, _) => {
                results.default.insert(tweet_id.clone());
            }
            (TweetCase::Remaining, _) => {
                results.remaining.insert(tweet_id.clone());
            }
            (case, Some((policy, outcome))) => {
                debug!(
                    tweet_id = %tweet_id,
                    %case,
                    %policy,
                    target = %outcome.target,
                    accounts = outcome.accounts,
                    flipped = outcome.flipped,
                    "Simulated attack"
                );
                if !outcome.flipped {
                    results.capped.insert(tweet_id.clone());
                }
                let bucket = if case == TweetCase::InsertionOnly {
                    &mut results.insertion
                } else {
                    &mut results.replacement
                };
                bucket.insert(tweet_id.clone(), outcome.accounts);
            }
            (case, None) => {
                anyhow::bail!("Tweet {tweet_id} classified as {case} but no attack was simulated");
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        insertion = results.insertion.len(),
        replacement = results.replacement.len(),
        default = results.default.len(),
        remaining = results.remaining.len(),
        capped = results.capped.len(),
        "Batch analysis finished"
    );

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::Helpfulness;

    fn settings() -> AnalysisSettings {
        AnalysisSettings {
            thresholds: Thresholds::default(),
            account_cap: 10,
            seed: Some(1),
        }
    }

    fn ratings(notes: &[(&str, usize, usize)]) -> TweetRatings {
        TweetRatings {
            notes: notes
                .iter()
                .map(|&(id, helpful, not_helpful)| {
                    let mut r = vec![Helpfulness::Helpful; helpful];
                    r.extend(std::iter::repeat(Helpfulness::NotHelpful).take(not_helpful));
                    (id.to_string(), r)
                })
                .collect(),
        }
    }

    #[test]
    fn test_analyze_default_tweet() {
        let mut rng = StdRng::seed_from_u64(1);
        let analysis = analyze_tweet(&ratings(&[("n1", 6, 0)]), &settings(), &mut rng).unwrap();
        assert_eq!(analysis.case, TweetCase::Default);
        assert_eq!(analysis.currently_helpful, vec!["n1"]);
        assert!(analysis.outcome.is_none());
    }

    #[test]
    fn test_analyze_insertion_tweet() {
        let mut rng = StdRng::seed_from_u64(1);
        let analysis = analyze_tweet(&ratings(&[("n2", 0, 0)]), &settings(), &mut rng).unwrap();
        assert_eq!(analysis.case, TweetCase::InsertionOnly);
        assert!(analysis.currently_helpful.is_empty());
        let (policy, outcome) = analysis.outcome.unwrap();
        assert_eq!(policy, AttackPolicy::insertion_only());
        assert_eq!(outcome.target, "n2");
        assert_eq!(outcome.accounts, 5);
    }

    #[test]
    fn test_seeded_rng_keeps_given_seed() {
        let (seed, mut rng) = seeded_rng(Some(42));
        assert_eq!(seed, 42);
        let mut expected = StdRng::seed_from_u64(42);
        assert_eq!(rng.random::<u64>(), expected.random::<u64>());
    }

    #[test]
    fn test_seeded_rng_drawn_seed_replays_candidate_pick() {
        let tweet = ratings(&[("a", 0, 0), ("b", 0, 0), ("c", 0, 0), ("d", 0, 0)]);
        let (seed, mut rng) = seeded_rng(None);
        let first = analyze_tweet(&tweet, &settings(), &mut rng).unwrap();

        let (replayed_seed, mut replay) = seeded_rng(Some(seed));
        assert_eq!(replayed_seed, seed);
        let second = analyze_tweet(&tweet, &settings(), &mut replay).unwrap();
        assert_eq!(first.outcome, second.outcome);
    }

    #[test]
    fn test_run_batch_records_seed_from_settings() {
        let mut tweets = BTreeMap::new();
        tweets.insert("t".to_string(), ratings(&[("a", 0, 0)]));

        let (seed, mut rng) = seeded_rng(Some(9));
        let seeded = AnalysisSettings {
            seed: Some(seed),
            ..settings()
        };
        let results = run_batch(&tweets, &seeded, &mut rng, false).unwrap();
        assert_eq!(results.metadata.seed, Some(9));

        let unseeded = AnalysisSettings {
            seed: None,
            ..settings()
        };
        let mut rng = StdRng::seed_from_u64(9);
        let results = run_batch(&tweets, &unseeded, &mut rng, false).unwrap();
        assert_eq!(results.metadata.seed, None);
    }

    #[test]
    fn test_run_batch_buckets() {
        let mut tweets = BTreeMap::new();
        tweets.insert("default".to_string(), ratings(&[("a", 6, 0)]));
        tweets.insert("insert".to_string(), ratings(&[("b", 0, 0)]));
        tweets.insert(
            "replace".to_string(),
            ratings(&[("c", 10, 0), ("d", 9, 1)]),
        );

        let mut rng = StdRng::seed_from_u64(3);
        let results = run_batch(&tweets, &settings(), &mut rng, false).unwrap();

        assert!(results.default.contains("default"));
        assert_eq!(results.insertion.get("insert"), Some(&5));
        assert_eq!(results.replacement.get("replace"), Some(&2));
        assert!(results.remaining.is_empty());
        assert!(results.capped.is_empty());
        assert_eq!(results.tweet_count(), 3);
        assert_eq!(results.metadata.tweets_analyzed, 3);
    }
}
