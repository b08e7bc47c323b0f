// Attack simulator: how many colluding accounts flip a tweet's ranking.
//
// The attacker picks one candidate note and controls `k` fake accounts.
// Under insertion, every account rates the candidate helpful. Under
// replacement, every account rates each currently-helpful note not helpful.
// We try k = 1, 2, ... up to the account cap and report the first k that
// puts the candidate among the currently rated helpful notes. Reaching the
// cap means "infeasible within budget", not "impossible".

use std::collections::BTreeSet;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ranking::{rank_notes, Thresholds};
use super::tally::{TallyDelta, TweetTallies};
use crate::data::models::NoteId;

/// Largest number of fake accounts a simulation will try.
pub const DEFAULT_ACCOUNT_CAP: u32 = 10;

/// Invalid input to the simulator. Reaching the account cap is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttackError {
    #[error("no candidate notes to promote")]
    NoCandidates,
    #[error("candidate note {0} does not belong to this tweet")]
    UnknownCandidate(NoteId),
    #[error("account cap must be at least 1")]
    ZeroAccountCap,
}

/// Which kinds of fake ratings the colluding accounts cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackPolicy {
    /// Rate the candidate note helpful
    pub insertion: bool,
    /// Rate every currently-helpful note not helpful
    pub replacement: bool,
}

impl AttackPolicy {
    pub fn insertion_only() -> Self {
        Self {
            insertion: true,
            replacement: false,
        }
    }

    pub fn insertion_and_replacement() -> Self {
        Self {
            insertion: true,
            replacement: true,
        }
    }

    /// Not produced by the batch classifier; available for one-off runs.
    pub fn replacement_only() -> Self {
        Self {
            insertion: false,
            replacement: true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match (self.insertion, self.replacement) {
            (true, false) => "insertion",
            (true, true) => "insertion+replacement",
            (false, true) => "replacement",
            (false, false) => "none",
        }
    }
}

impl std::fmt::Display for AttackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of simulating an attack on one tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// The candidate note the attacker tried to promote
    pub target: NoteId,
    /// Smallest account count that worked, or the cap
    pub accounts: u32,
    /// False when the cap was reached without the target making the top set
    pub flipped: bool,
}

/// Pick a random candidate and find the fewest accounts that promote it.
///
/// Candidates are visited in sorted order, so a seeded `rng` always picks
/// the same target. The result is in `[1, account_cap]`.
pub fn minimum_accounts_to_promote<R: Rng + ?Sized>(
    tallies: &TweetTallies,
    candidates: &BTreeSet<NoteId>,
    currently_helpful: &[NoteId],
    policy: AttackPolicy,
    thresholds: &Thresholds,
    account_cap: u32,
    rng: &mut R,
) -> Result<AttackOutcome, AttackError> {
    let pool: Vec<&NoteId> = candidates.iter().collect();
    let target = *pool.choose(rng).ok_or(AttackError::NoCandidates)?;

    accounts_needed(
        tallies,
        target,
        currently_helpful,
        policy,
        thresholds,
        account_cap,
    )
}

/// Find the fewest accounts that promote a specific note.
pub fn accounts_needed(
    tallies: &TweetTallies,
    target: &str,
    currently_helpful: &[NoteId],
    policy: AttackPolicy,
    thresholds: &Thresholds,
    account_cap: u32,
) -> Result<AttackOutcome, AttackError> {
    if account_cap == 0 {
        return Err(AttackError::ZeroAccountCap);
    }
    if !tallies.contains(target) {
        return Err(AttackError::UnknownCandidate(target.to_string()));
    }

    let diluted: &[NoteId] = if policy.replacement {
        currently_helpful
    } else {
        &[]
    };

    for accounts in 1..=account_cap {
        let delta = TallyDelta {
            accounts,
            boosted: policy.insertion.then_some(target),
            diluted,
        };
        let top = rank_notes(tallies.scored(&delta), thresholds);
        if top.iter().any(|note| note.note_id == target) {
            return Ok(AttackOutcome {
                target: target.to_string(),
                accounts,
                flipped: true,
            });
        }
    }

    Ok(AttackOutcome {
        target: target.to_string(),
        accounts: account_cap,
        flipped: false,
    })
}
