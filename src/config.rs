use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::scoring::attack::DEFAULT_ACCOUNT_CAP;
use crate::scoring::ranking::Thresholds;

/// Where batch results are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A directory of JSON files (default)
    Json,
    /// A single SQLite database file (requires the `sqlite` feature)
    Sqlite,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "sqlite" => Ok(OutputFormat::Sqlite),
            other => anyhow::bail!("Unknown output format '{other}' (expected json or sqlite)"),
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// Every value has a default matching the reference experiment, so a bare
/// `notewatch analyze` works when the dumps sit in ./data. The .env file
/// is loaded automatically at startup via dotenvy, and CLI flags override
/// anything set here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Notes TSV dump
    pub notes_path: PathBuf,
    /// Ratings TSV dump
    pub ratings_path: PathBuf,
    /// Explicit results directory (JSON) or database file (SQLite).
    /// When unset, `results_path()` falls back to the format's default.
    pub results_path: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub thresholds: Thresholds,
    /// Maximum fake accounts a simulation will try
    pub account_cap: u32,
    /// Seed for candidate selection; unset means a fresh random seed per run
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Values that are set but don't parse are errors rather than silently
    /// falling back to the default.
    pub fn load() -> Result<Self> {
        let defaults = Thresholds::default();
        let output_format = env_parse("NOTEWATCH_OUTPUT", OutputFormat::Json)?;

        Ok(Self {
            notes_path: env::var("NOTEWATCH_NOTES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/notes.tsv")),
            ratings_path: env::var("NOTEWATCH_RATINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/ratings.tsv")),
            results_path: env::var("NOTEWATCH_RESULTS_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            output_format,
            thresholds: Thresholds {
                max_top_notes: env_parse("NOTEWATCH_MAX_TOP_NOTES", defaults.max_top_notes)?,
                min_ratings: env_parse("NOTEWATCH_MIN_RATINGS", defaults.min_ratings)?,
                min_helpful_ratio: env_parse(
                    "NOTEWATCH_MIN_HELPFUL_RATIO",
                    defaults.min_helpful_ratio,
                )?,
            },
            account_cap: env_parse("NOTEWATCH_ACCOUNT_CAP", DEFAULT_ACCOUNT_CAP)?,
            seed: env::var("NOTEWATCH_SEED")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    s.trim()
                        .parse::<u64>()
                        .with_context(|| format!("NOTEWATCH_SEED is not a valid u64: {s}"))
                })
                .transpose()?,
        })
    }

    /// Default results location for an output format.
    pub fn default_results_path(format: OutputFormat) -> PathBuf {
        match format {
            OutputFormat::Json => PathBuf::from("./results"),
            OutputFormat::Sqlite => PathBuf::from("./results/notewatch.db"),
        }
    }

    /// Where results are written and read.
    ///
    /// Resolved against the final output format, so a format switched by a
    /// CLI flag after `load()` still gets its own default location.
    pub fn results_path(&self) -> PathBuf {
        self.results_path
            .clone()
            .unwrap_or_else(|| Self::default_results_path(self.output_format))
    }

    /// Check that the run parameters make sense before loading any data.
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if self.account_cap == 0 {
            anyhow::bail!("NOTEWATCH_ACCOUNT_CAP must be at least 1");
        }
        if cfg!(not(feature = "sqlite")) && self.output_format == OutputFormat::Sqlite {
            anyhow::bail!(
                "SQLite output requested but the 'sqlite' feature is not compiled in.\n\
                 Rebuild with: cargo build --features sqlite"
            );
        }
        Ok(())
    }

    /// Check that both dataset files exist.
    /// Call this before any command that reads the dumps.
    pub fn require_dataset(&self) -> Result<()> {
        for (name, path) in [
            ("NOTEWATCH_NOTES_PATH", &self.notes_path),
            ("NOTEWATCH_RATINGS_PATH", &self.ratings_path),
        ] {
            if !path.exists() {
                anyhow::bail!(
                    "{} not found. Set {name} in your .env file or pass it on the command line.",
                    path.display()
                );
            }
        }
        Ok(())
    }
}

/// Parse an environment variable, using `default` only when it's unset.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
        _ => Ok(default),
    }
}
