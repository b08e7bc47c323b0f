// Unit tests for the attack simulator.
//
// Scenario tests pin down concrete account counts; the monotonicity tests
// walk k upward by hand to check that insertion only ever helps the
// candidate.

use std::collections::BTreeSet;

use notewatch::scoring::attack::{
    accounts_needed, minimum_accounts_to_promote, AttackError, AttackPolicy, DEFAULT_ACCOUNT_CAP,
};
use notewatch::scoring::ranking::{rank_notes, Thresholds};
use notewatch::scoring::tally::{NoteTally, TallyDelta, TweetTallies};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================
// Scenarios
// ============================================================

#[test]
fn unrated_candidate_needs_min_ratings_accounts() {
    let tallies = TweetTallies::from_tallies([
        ("N1", NoteTally::new(4, 1, 5)),
        ("N2", NoteTally::default()),
    ]);
    let mut rng = StdRng::seed_from_u64(2021);
    let outcome = minimum_accounts_to_promote(
        &tallies,
        &ids(&["N2"]),
        &[],
        AttackPolicy::insertion_only(),
        &Thresholds::default(),
        DEFAULT_ACCOUNT_CAP,
        &mut rng,
    )
    .unwrap();
    assert_eq!(outcome.target, "N2");
    assert_eq!(outcome.accounts, 5);
    assert!(outcome.flipped);
}

#[test]
fn empty_candidate_set_is_invalid_input() {
    let tallies = TweetTallies::from_tallies([("N1", NoteTally::new(6, 0, 6))]);
    let mut rng = StdRng::seed_from_u64(0);
    let result = minimum_accounts_to_promote(
        &tallies,
        &BTreeSet::new(),
        &["N1".to_string()],
        AttackPolicy::insertion_and_replacement(),
        &Thresholds::default(),
        DEFAULT_ACCOUNT_CAP,
        &mut rng,
    );
    assert_eq!(result, Err(AttackError::NoCandidates));
}

#[test]
fn hopeless_note_reports_exactly_the_cap_under_both_policies() {
    let tallies = TweetTallies::from_tallies([
        ("top", NoteTally::new(100, 0, 100)),
        ("hopeless", NoteTally::new(0, 50, 50)),
    ]);
    let top = vec!["top".to_string()];
    for policy in [
        AttackPolicy::insertion_only(),
        AttackPolicy::insertion_and_replacement(),
    ] {
        let outcome = accounts_needed(
            &tallies,
            "hopeless",
            &top,
            policy,
            &Thresholds::default(),
            DEFAULT_ACCOUNT_CAP,
        )
        .unwrap();
        assert_eq!(outcome.accounts, 10, "policy {policy}");
        assert!(!outcome.flipped);
    }
}

#[test]
fn custom_cap_bounds_the_search() {
    let tallies = TweetTallies::from_tallies([("N1", NoteTally::default())]);
    let outcome = accounts_needed(
        &tallies,
        "N1",
        &[],
        AttackPolicy::insertion_only(),
        &Thresholds::default(),
        3,
    )
    .unwrap();
    assert_eq!(outcome.accounts, 3);
    assert!(!outcome.flipped);
}

#[test]
fn simulation_leaves_base_tallies_untouched() {
    let tallies = TweetTallies::from_tallies([
        ("top", NoteTally::new(10, 0, 10)),
        ("cand", NoteTally::new(2, 2, 4)),
    ]);
    let before = tallies.clone();
    accounts_needed(
        &tallies,
        "cand",
        &["top".to_string()],
        AttackPolicy::insertion_and_replacement(),
        &Thresholds::default(),
        DEFAULT_ACCOUNT_CAP,
    )
    .unwrap();
    assert_eq!(tallies, before);
}

#[test]
fn same_seed_same_target() {
    let tallies = TweetTallies::from_tallies(
        (0..8).map(|i| (format!("n{i}"), NoteTally::new(i, 8 - i, 8))),
    );
    let candidates: BTreeSet<String> = tallies.note_ids().cloned().collect();
    let run = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);
        minimum_accounts_to_promote(
            &tallies,
            &candidates,
            &[],
            AttackPolicy::insertion_only(),
            &Thresholds::default(),
            DEFAULT_ACCOUNT_CAP,
            &mut rng,
        )
        .unwrap()
    };
    for seed in 0..20 {
        assert_eq!(run(seed), run(seed));
    }
}

// ============================================================
// Monotonicity of insertion
// ============================================================

#[test]
fn insertion_never_lowers_candidate_ratio() {
    for (helpful, total) in [(0, 0), (0, 5), (3, 7), (4, 5), (9, 10)] {
        let tallies = TweetTallies::from_tallies([(
            "cand",
            NoteTally::new(helpful, total - helpful, total),
        )]);
        let mut previous = None;
        for k in 1..=DEFAULT_ACCOUNT_CAP {
            let delta = TallyDelta {
                accounts: k,
                boosted: Some("cand"),
                diluted: &[],
            };
            let ratio = tallies.scored(&delta)[0].ratio.unwrap();
            if let Some(prev) = previous {
                assert!(ratio >= prev, "ratio fell from {prev} to {ratio} at k={k}");
            }
            previous = Some(ratio);
        }
    }
}

#[test]
fn once_eligible_stays_eligible() {
    let thresholds = Thresholds::default();
    let tallies = TweetTallies::from_tallies([
        ("incumbent", NoteTally::new(11, 1, 12)),
        ("cand", NoteTally::new(3, 1, 4)),
    ]);
    let mut became_eligible = false;
    let mut became_top = false;
    for k in 1..=DEFAULT_ACCOUNT_CAP {
        let delta = TallyDelta {
            accounts: k,
            boosted: Some("cand"),
            diluted: &[],
        };
        let scored = tallies.scored(&delta);
        let eligible = thresholds.is_eligible(&scored[1]);
        let top = rank_notes(scored, &thresholds)
            .iter()
            .any(|n| n.note_id == "cand");
        assert!(!became_eligible || eligible, "lost eligibility at k={k}");
        assert!(!became_top || top, "lost the top slot at k={k}");
        became_eligible |= eligible;
        became_top |= top;
    }
    assert!(became_eligible);
    assert!(became_top);
}

#[test]
fn first_flip_matches_manual_walk() {
    // incumbent at 11/12; cand (3+k)/(4+k) ties it at k=8, and ties keep
    // the incumbent on top, so the first flip is k=9
    let tallies = TweetTallies::from_tallies([
        ("incumbent", NoteTally::new(11, 1, 12)),
        ("cand", NoteTally::new(3, 1, 4)),
    ]);
    let outcome = accounts_needed(
        &tallies,
        "cand",
        &[],
        AttackPolicy::insertion_only(),
        &Thresholds::default(),
        DEFAULT_ACCOUNT_CAP,
    )
    .unwrap();
    assert_eq!(outcome.accounts, 9);
    assert!(outcome.flipped);
}
