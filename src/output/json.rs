// JSON result files: one file per result collection in a results directory.
//
// Each mapping gets its own file so downstream notebooks can load just the
// one they need. Files are created (or truncated) and written; a run
// always replaces the previous run's files in full.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::pipeline::results::AttackResults;

pub const INSERTION_FILE: &str = "insertion.json";
pub const REPLACEMENT_FILE: &str = "replacement.json";
pub const DEFAULT_FILE: &str = "default.json";
pub const REMAINING_FILE: &str = "remaining.json";
pub const CAPPED_FILE: &str = "capped.json";
pub const RUN_FILE: &str = "run.json";

/// Write every result collection into `dir`, creating it if needed.
///
/// Returns the paths written, in a stable order.
pub fn write_results(dir: &Path, results: &AttackResults) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create results directory {}", dir.display()))?;

    let mut written = Vec::new();
    written.push(write_json(&dir.join(INSERTION_FILE), &results.insertion)?);
    written.push(write_json(&dir.join(REPLACEMENT_FILE), &results.replacement)?);
    written.push(write_json(&dir.join(DEFAULT_FILE), &results.default)?);
    written.push(write_json(&dir.join(REMAINING_FILE), &results.remaining)?);
    written.push(write_json(&dir.join(CAPPED_FILE), &results.capped)?);
    written.push(write_json(&dir.join(RUN_FILE), &results.metadata)?);
    Ok(written)
}

/// Read back a results directory written by `write_results`.
pub fn load_results(dir: &Path) -> Result<AttackResults> {
    if !dir.is_dir() {
        anyhow::bail!(
            "No results found at {}. Run `notewatch analyze` first.",
            dir.display()
        );
    }

    Ok(AttackResults {
        insertion: read_json(&dir.join(INSERTION_FILE))?,
        replacement: read_json(&dir.join(REPLACEMENT_FILE))?,
        default: read_json(&dir.join(DEFAULT_FILE))?,
        remaining: read_json(&dir.join(REMAINING_FILE))?,
        capped: read_json(&dir.join(CAPPED_FILE))?,
        metadata: read_json(&dir.join(RUN_FILE))?,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<PathBuf> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer.flush()?;
    Ok(path.to_path_buf())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}
