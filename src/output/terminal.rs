// Colored terminal output for rankings, simulations and run summaries.
//
// This module handles all terminal-specific formatting. The main.rs
// command handlers delegate here.

use colored::Colorize;

use crate::pipeline::results::AttackResults;
use crate::scoring::attack::{AttackOutcome, AttackPolicy};
use crate::scoring::ranking::Thresholds;
use crate::scoring::tally::ScoredNote;

/// Display every note of a tweet with its counts, marking the top set.
pub fn display_ranking(
    tweet_id: &str,
    scored: &[ScoredNote],
    currently_helpful: &[String],
    thresholds: &Thresholds,
) {
    println!(
        "\n{}",
        format!("=== Notes for tweet {tweet_id} ({} notes) ===", scored.len()).bold()
    );
    println!(
        "{}",
        format!(
            "  Thresholds: >= {} ratings, ratio >= {:.2}, top {}",
            thresholds.min_ratings, thresholds.min_helpful_ratio, thresholds.max_top_notes
        )
        .dimmed()
    );
    println!();

    println!(
        "  {:<24} {:>7} {:>11} {:>7} {:>6}  Status",
        "Note".dimmed(),
        "Helpful".dimmed(),
        "Not helpful".dimmed(),
        "Total".dimmed(),
        "Ratio".dimmed(),
    );
    println!("  {}", "-".repeat(72).dimmed());

    for note in scored {
        let ratio = note
            .ratio
            .map(|r| format!("{r:.3}"))
            .unwrap_or_else(|| "-".to_string());
        let status = if let Some(rank) = currently_helpful.iter().position(|id| *id == note.note_id)
        {
            format!("currently rated helpful (#{})", rank + 1)
                .green()
                .bold()
        } else if thresholds.is_eligible(note) {
            "eligible".yellow()
        } else {
            "candidate".dimmed()
        };
        println!(
            "  {:<24} {:>7} {:>11} {:>7} {:>6}  {}",
            note.note_id, note.tally.helpful, note.tally.not_helpful, note.tally.ratings, ratio, status,
        );
    }
}

/// Display the outcome of a single simulated attack.
pub fn display_simulation(tweet_id: &str, policy: AttackPolicy, outcome: &AttackOutcome, cap: u32) {
    println!(
        "\n{}",
        format!("=== Simulated {policy} attack on tweet {tweet_id} ===").bold()
    );
    println!("  Target note: {}", outcome.target);
    if outcome.flipped {
        println!(
            "  {} {} fake account(s) make it currently rated helpful",
            "Flipped:".red().bold(),
            outcome.accounts
        );
    } else {
        println!(
            "  {} not flipped within {} accounts (reported as {})",
            "Capped:".green(),
            cap,
            outcome.accounts
        );
    }
}

/// Display a summary of a batch run: case counts and account histograms.
pub fn display_summary(results: &AttackResults) {
    let meta = &results.metadata;
    println!(
        "\n{}",
        format!("=== Collusion Report ({} tweets) ===", results.tweet_count()).bold()
    );
    println!(
        "{}",
        format!(
            "  Generated {}  |  cap {}  |  seed {}",
            meta.generated_at,
            meta.account_cap,
            meta.seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "random".to_string()),
        )
        .dimmed()
    );
    println!();

    println!("  Insertion only:          {}", results.insertion.len());
    println!("  Insertion + replacement: {}", results.replacement.len());
    println!("  Default (no candidates): {}", results.default.len());
    println!("  Remaining:               {}", results.remaining.len());
    if !results.capped.is_empty() {
        println!(
            "  {} {} tweets not flipped within the cap",
            "~".yellow(),
            results.capped.len()
        );
    }

    for (label, accounts) in [
        ("Insertion only", &results.insertion),
        ("Insertion + replacement", &results.replacement),
    ] {
        if accounts.is_empty() {
            continue;
        }
        println!("\n  {}", format!("{label}: accounts needed").bold());
        let histogram = AttackResults::histogram(accounts, meta.account_cap);
        let widest = histogram.iter().map(|(_, n)| *n).max().unwrap_or(0).max(1);
        for (k, count) in histogram {
            let bar_len = (count * 40).div_ceil(widest);
            let bar = "#".repeat(bar_len);
            let bar = if k <= 3 {
                bar.red()
            } else if k < meta.account_cap {
                bar.yellow()
            } else {
                bar.green()
            };
            println!("  {:>4}  {:>7}  {}", k, count, bar);
        }
    }
}
