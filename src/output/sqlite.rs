// SQLite result store: the same result collections as the JSON files,
// in a single database file.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. A database holds exactly one run: saving clears the
// previous run's rows inside the same transaction.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::pipeline::results::{AttackResults, RunMetadata};

/// Open (or create) the results database and make sure the tables exist.
pub fn initialize(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create directory for database: {}", db_path.display())
            })?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    create_tables(&conn)?;
    Ok(conn)
}

/// Open an existing results database (fails if it doesn't exist yet).
pub fn open(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        anyhow::bail!(
            "Results database not found at {}. Run `notewatch analyze --output sqlite` first.",
            db_path.display()
        );
    }
    Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))
}

/// Create all tables if they don't exist yet. Safe to call on every run.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Minimum accounts per tweet, one row per simulated attack
        CREATE TABLE IF NOT EXISTS attack_results (
            tweet_id TEXT NOT NULL,
            policy TEXT NOT NULL,              -- 'insertion' or 'replacement'
            accounts INTEGER NOT NULL,         -- 1 to account cap
            flipped INTEGER NOT NULL,          -- 0 when the cap was hit without success
            PRIMARY KEY (tweet_id, policy)
        );

        -- Tweets with no candidate notes
        CREATE TABLE IF NOT EXISTS default_tweets (
            tweet_id TEXT PRIMARY KEY
        );

        -- Tweets that fit no attack case
        CREATE TABLE IF NOT EXISTS remaining_tweets (
            tweet_id TEXT PRIMARY KEY
        );

        -- Run parameters, stored as JSON
        CREATE TABLE IF NOT EXISTS run_metadata (
            id INTEGER PRIMARY KEY CHECK (id = 1),  -- singleton row
            metadata_json TEXT NOT NULL,
            saved_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )
    .context("Failed to create database tables")?;
    Ok(())
}

/// Replace the stored run with `results`.
pub fn save_results(conn: &mut Connection, results: &AttackResults) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        "DELETE FROM attack_results;
         DELETE FROM default_tweets;
         DELETE FROM remaining_tweets;",
    )?;

    {
        let mut insert_attack = tx.prepare(
            "INSERT INTO attack_results (tweet_id, policy, accounts, flipped)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (policy, map) in [
            ("insertion", &results.insertion),
            ("replacement", &results.replacement),
        ] {
            for (tweet_id, accounts) in map {
                let flipped = !results.capped.contains(tweet_id);
                insert_attack.execute(params![tweet_id, policy, accounts, flipped])?;
            }
        }

        let mut insert_default = tx.prepare("INSERT INTO default_tweets (tweet_id) VALUES (?1)")?;
        for tweet_id in &results.default {
            insert_default.execute(params![tweet_id])?;
        }

        let mut insert_remaining =
            tx.prepare("INSERT INTO remaining_tweets (tweet_id) VALUES (?1)")?;
        for tweet_id in &results.remaining {
            insert_remaining.execute(params![tweet_id])?;
        }
    }

    let metadata_json = serde_json::to_string(&results.metadata)?;
    tx.execute(
        "INSERT INTO run_metadata (id, metadata_json, saved_at)
         VALUES (1, ?1, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET metadata_json = ?1, saved_at = datetime('now')",
        params![metadata_json],
    )?;

    tx.commit().context("Failed to commit results")?;
    Ok(())
}

/// Load the stored run.
pub fn load_results(conn: &Connection) -> Result<AttackResults> {
    let metadata_json: Option<String> = conn
        .query_row(
            "SELECT metadata_json FROM run_metadata WHERE id = 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    let Some(metadata_json) = metadata_json else {
        anyhow::bail!("Results database has no saved run");
    };
    let metadata: RunMetadata = serde_json::from_str(&metadata_json)?;
    let mut results = AttackResults::new(metadata);

    let mut stmt =
        conn.prepare("SELECT tweet_id, policy, accounts, flipped FROM attack_results")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u32>(2)?,
            row.get::<_, bool>(3)?,
        ))
    })?;
    for row in rows {
        let (tweet_id, policy, accounts, flipped) = row?;
        if !flipped {
            results.capped.insert(tweet_id.clone());
        }
        match policy.as_str() {
            "insertion" => results.insertion.insert(tweet_id, accounts),
            "replacement" => results.replacement.insert(tweet_id, accounts),
            other => anyhow::bail!("Unknown attack policy in results database: {other}"),
        };
    }

    results.default = tweet_ids(conn, "SELECT tweet_id FROM default_tweets")?;
    results.remaining = tweet_ids(conn, "SELECT tweet_id FROM remaining_tweets")?;
    Ok(results)
}

fn tweet_ids(conn: &Connection, sql: &str) -> Result<std::collections::BTreeSet<String>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<_>>()?;
    Ok(ids)
}
