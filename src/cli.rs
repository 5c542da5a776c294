//! Command-line interface for inspecting the persisted cache store
//!
//! The binary operates directly on a `FileStore`: `show` prints a persisted
//! entry together with its age and validity under a given TTL, and `seed`
//! writes an entry wrapping an arbitrary JSON payload stamped with the
//! current time. Useful for poking at what a host application has cached
//! without running the application itself.

use std::path::PathBuf;

use chrono::DateTime;
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::cache::{storage_key, CacheEntry};
use crate::clock::{Clock, SystemClock};
use crate::storage::{FileStore, Storage, StorageError};

/// Error types for CLI execution
#[derive(Debug, Error)]
pub enum CliError {
    /// No cache directory could be resolved and none was given
    #[error("no cache directory could be resolved; pass --dir")]
    NoCacheDir,

    /// The cache key was empty
    #[error("cache key must not be empty")]
    EmptyKey,

    /// The seed payload was not valid JSON
    #[error("payload is not valid JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// No entry exists for the requested key
    #[error("no entry for key '{0}'")]
    Missing(String),

    /// The underlying store failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Freshslot - inspect and seed the persisted cache store
#[derive(Parser, Debug)]
#[command(name = "freshslot")]
#[command(about = "Inspect and seed freshslot's persisted cache entries")]
#[command(version)]
pub struct Cli {
    /// Directory holding the entries (defaults to the XDG cache dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a persisted entry with its age and validity
    Show {
        /// The cache key to inspect
        key: String,
        /// TTL in milliseconds used to judge validity
        #[arg(long, default_value_t = 300_000)]
        ttl: i64,
    },
    /// Persist an entry wrapping the given JSON payload, stamped now
    Seed {
        /// The cache key to write under
        key: String,
        /// JSON payload to store as the entry's data
        json: String,
    },
}

/// Resolves the store and dispatches the parsed command.
pub fn run(cli: Cli) -> Result<(), CliError> {
    let store = match cli.dir {
        Some(dir) => FileStore::with_dir(dir),
        None => FileStore::new().ok_or(CliError::NoCacheDir)?,
    };

    match cli.command {
        Command::Show { key, ttl } => show(&store, &key, ttl),
        Command::Seed { key, json } => seed(&store, &key, &json),
    }
}

/// Prints a persisted entry, distinguishing missing from corrupt.
fn show(store: &FileStore, key: &str, ttl_ms: i64) -> Result<(), CliError> {
    if key.is_empty() {
        return Err(CliError::EmptyKey);
    }

    let raw = store
        .get(&storage_key(key))?
        .ok_or_else(|| CliError::Missing(key.to_string()))?;

    match serde_json::from_str::<CacheEntry<serde_json::Value>>(&raw) {
        Ok(entry) => {
            let now = SystemClock.now_ms();
            println!("key:       {}", key);
            println!("data:      {}", entry.data);
            println!("produced:  {}", format_timestamp(entry.timestamp));
            println!("age:       {}ms", entry.age_ms(now));
            println!(
                "valid:     {} (ttl {}ms)",
                entry.is_valid(now, ttl_ms),
                ttl_ms
            );
        }
        Err(err) => {
            // A corrupt entry is reported, not fatal: the cache layer would
            // treat it as a miss.
            println!("key:   {}", key);
            println!("entry: corrupt ({})", err);
        }
    }
    Ok(())
}

/// Writes an entry wrapping the given payload, stamped with the current time.
fn seed(store: &FileStore, key: &str, json: &str) -> Result<(), CliError> {
    if key.is_empty() {
        return Err(CliError::EmptyKey);
    }

    let data: serde_json::Value = serde_json::from_str(json)?;
    let entry = CacheEntry {
        data,
        timestamp: SystemClock.now_ms(),
    };
    let raw = serde_json::to_string(&entry)?;
    store.set(&storage_key(key), &raw)?;

    println!("seeded '{}' at {}", key, entry.timestamp);
    Ok(())
}

/// Formats a millisecond epoch timestamp as UTC, falling back to the raw
/// number when out of range.
fn format_timestamp(timestamp_ms: i64) -> String {
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(dt) => dt.to_rfc3339(),
        None => format!("{}ms", timestamp_ms),
    }
}
