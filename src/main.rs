use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::info;

use notewatch::config::{Config, OutputFormat};
use notewatch::data::Dataset;
use notewatch::pipeline::batch::{run_batch, seeded_rng, AnalysisSettings};
use notewatch::pipeline::classify::{classify, TweetCase};
use notewatch::scoring::attack::{accounts_needed, minimum_accounts_to_promote, AttackPolicy};
use notewatch::scoring::ranking::{evaluate, rank_notes};
use notewatch::scoring::tally::{TallyDelta, TweetTallies};

/// Notewatch: how many colluding accounts does it take to flip a note?
///
/// Replays a notes + ratings dump and, for every tweet, simulates fake
/// accounts rating notes until a different note becomes "currently rated
/// helpful".
#[derive(Parser)]
#[command(name = "notewatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Dataset and threshold overrides shared by every command that reads the dumps.
#[derive(Args)]
struct RunArgs {
    /// Notes TSV dump (overrides NOTEWATCH_NOTES_PATH)
    #[arg(long)]
    notes: Option<PathBuf>,

    /// Ratings TSV dump (overrides NOTEWATCH_RATINGS_PATH)
    #[arg(long)]
    ratings: Option<PathBuf>,

    /// Number of top notes that hold "currently rated helpful"
    #[arg(long)]
    max_top_notes: Option<usize>,

    /// Minimum ratings a note needs to be eligible
    #[arg(long)]
    min_ratings: Option<u32>,

    /// Minimum helpful ratio a note needs to be eligible
    #[arg(long)]
    min_ratio: Option<f64>,

    /// Maximum fake accounts to simulate (default: 10)
    #[arg(long)]
    account_cap: Option<u32>,

    /// Seed for random candidate selection
    #[arg(long)]
    seed: Option<u64>,
}

impl RunArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(ref notes) = self.notes {
            config.notes_path = notes.clone();
        }
        if let Some(ref ratings) = self.ratings {
            config.ratings_path = ratings.clone();
        }
        if let Some(n) = self.max_top_notes {
            config.thresholds.max_top_notes = n;
        }
        if let Some(n) = self.min_ratings {
            config.thresholds.min_ratings = n;
        }
        if let Some(r) = self.min_ratio {
            config.thresholds.min_helpful_ratio = r;
        }
        if let Some(cap) = self.account_cap {
            config.account_cap = cap;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Pick the policy the batch classifier would pick
    Auto,
    /// Fake helpful ratings on the candidate only
    Insertion,
    /// Fake not-helpful ratings on the current top notes only
    Replacement,
    /// Both at once
    Combined,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate attacks on every tweet and save the results
    Analyze {
        #[command(flatten)]
        run: RunArgs,

        /// Results directory, or database file with --output sqlite
        #[arg(long)]
        results: Option<PathBuf>,

        /// Result format: json or sqlite
        #[arg(long)]
        output: Option<OutputFormat>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Show how a tweet's notes currently rank
    Rank {
        /// The tweet to inspect
        tweet_id: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Simulate an attack on a single tweet
    Simulate {
        /// The tweet to attack
        tweet_id: String,

        /// Which fake ratings the accounts cast
        #[arg(long, value_enum, default_value = "auto")]
        policy: PolicyArg,

        /// Promote this note instead of a random candidate
        #[arg(long)]
        note: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Summarize saved results
    Summary {
        /// Results directory, or database file with --output sqlite
        #[arg(long)]
        results: Option<PathBuf>,

        /// Result format: json or sqlite
        #[arg(long)]
        output: Option<OutputFormat>,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("notewatch=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            run,
            results,
            output,
            no_progress,
        } => {
            let mut config = Config::load()?;
            run.apply(&mut config);
            if let Some(format) = output {
                config.output_format = format;
            }
            if let Some(path) = results {
                config.results_path = Some(path);
            }
            config.validate()?;
            config.require_dataset()?;

            // Always run seeded so the run can be reproduced from its metadata
            let (seed, mut rng) = seeded_rng(config.seed);

            println!("Loading notes and ratings...");
            let dataset = Dataset::load(&config.notes_path, &config.ratings_path)?;
            let tweets = dataset.group_by_tweet();
            println!(
                "  {} notes, {} ratings across {} tweets",
                dataset.notes.len(),
                dataset.ratings.len(),
                tweets.len()
            );

            let settings = AnalysisSettings {
                thresholds: config.thresholds,
                account_cap: config.account_cap,
                seed: Some(seed),
            };
            let results = run_batch(&tweets, &settings, &mut rng, !no_progress)?;

            save_results(&config, &results)?;
            notewatch::output::terminal::display_summary(&results);
            println!(
                "\n{}",
                format!("Results saved to: {}", config.results_path().display()).bold()
            );
        }

        Commands::Rank { tweet_id, run } => {
            let mut config = Config::load()?;
            run.apply(&mut config);
            config.validate()?;
            config.require_dataset()?;

            let dataset = Dataset::load(&config.notes_path, &config.ratings_path)?;
            let Some(ratings) = dataset.tweet(&tweet_id) else {
                anyhow::bail!("No notes found for tweet {tweet_id}");
            };

            let tallies = TweetTallies::from_ratings(&ratings);
            let scored = tallies.scored(&TallyDelta::none());
            let top: Vec<String> = rank_notes(scored.clone(), &config.thresholds)
                .into_iter()
                .map(|n| n.note_id)
                .collect();
            notewatch::output::terminal::display_ranking(
                &tweet_id,
                &scored,
                &top,
                &config.thresholds,
            );
        }

        Commands::Simulate {
            tweet_id,
            policy,
            note,
            run,
        } => {
            let mut config = Config::load()?;
            run.apply(&mut config);
            config.validate()?;
            config.require_dataset()?;

            let dataset = Dataset::load(&config.notes_path, &config.ratings_path)?;
            let Some(ratings) = dataset.tweet(&tweet_id) else {
                anyhow::bail!("No notes found for tweet {tweet_id}");
            };

            let tallies = TweetTallies::from_ratings(&ratings);
            let currently_helpful = evaluate(&tallies, &config.thresholds);
            let candidates: std::collections::BTreeSet<String> = tallies
                .note_ids()
                .filter(|id| !currently_helpful.contains(*id))
                .cloned()
                .collect();

            let policy = match policy {
                PolicyArg::Insertion => AttackPolicy::insertion_only(),
                PolicyArg::Replacement => AttackPolicy::replacement_only(),
                PolicyArg::Combined => AttackPolicy::insertion_and_replacement(),
                PolicyArg::Auto => {
                    let case = classify(
                        tallies.len(),
                        candidates.len(),
                        currently_helpful.len(),
                        config.thresholds.max_top_notes,
                    );
                    match case.policy() {
                        Some(policy) => policy,
                        None if case == TweetCase::Default => {
                            println!(
                                "Every note of tweet {tweet_id} is already currently rated \
                                 helpful. Nothing to attack."
                            );
                            return Ok(());
                        }
                        None => {
                            println!("Tweet {tweet_id} fits no attack case ({case}).");
                            return Ok(());
                        }
                    }
                }
            };

            let outcome = match note {
                Some(note_id) => {
                    if currently_helpful.contains(&note_id) {
                        anyhow::bail!(
                            "Note {note_id} is already currently rated helpful for tweet {tweet_id}"
                        );
                    }
                    accounts_needed(
                        &tallies,
                        &note_id,
                        &currently_helpful,
                        policy,
                        &config.thresholds,
                        config.account_cap,
                    )?
                }
                None => {
                    let (_, mut rng) = seeded_rng(config.seed);
                    minimum_accounts_to_promote(
                        &tallies,
                        &candidates,
                        &currently_helpful,
                        policy,
                        &config.thresholds,
                        config.account_cap,
                        &mut rng,
                    )?
                }
            };

            notewatch::output::terminal::display_simulation(
                &tweet_id,
                policy,
                &outcome,
                config.account_cap,
            );
        }

        Commands::Summary { results, output } => {
            let mut config = Config::load()?;
            if let Some(format) = output {
                config.output_format = format;
            }
            if let Some(path) = results {
                config.results_path = Some(path);
            }
            config.validate()?;

            let results = load_results(&config)?;
            notewatch::output::terminal::display_summary(&results);
        }
    }

    Ok(())
}

/// Persist results in the configured format.
fn save_results(
    config: &Config,
    results: &notewatch::pipeline::results::AttackResults,
) -> Result<()> {
    match config.output_format {
        OutputFormat::Json => {
            let written = notewatch::output::json::write_results(&config.results_path(), results)?;
            info!(files = written.len(), "Wrote JSON results");
        }
        OutputFormat::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                let mut conn = notewatch::output::sqlite::initialize(&config.results_path())?;
                notewatch::output::sqlite::save_results(&mut conn, results)?;
                info!("Wrote SQLite results");
            }
            #[cfg(not(feature = "sqlite"))]
            anyhow::bail!("SQLite output requires the 'sqlite' feature");
        }
    }
    Ok(())
}

/// Load results saved in the configured format.
fn load_results(config: &Config) -> Result<notewatch::pipeline::results::AttackResults> {
    match config.output_format {
        OutputFormat::Json => notewatch::output::json::load_results(&config.results_path()),
        OutputFormat::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                let conn = notewatch::output::sqlite::open(&config.results_path())?;
                return notewatch::output::sqlite::load_results(&conn);
            }
            #[cfg(not(feature = "sqlite"))]
            anyhow::bail!("SQLite output requires the 'sqlite' feature")
        }
    }
}
