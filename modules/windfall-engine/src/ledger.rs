//! Per-account entry ledger.
//!
//! One append-only file per account, post ids separated by commas. The file
//! grows for years, so membership checks stream it in chunks instead of
//! slurping it. Matching is token-exact: an id that happens to be a
//! substring of another id never counts as seen.
//!
//! Writes are suppressed when the run started before the configured local
//! hour. A morning rerun then re-evaluates yesterday's posts instead of
//! short-circuiting on its own earlier writes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use windfall_common::Clock;

const CHUNK_SIZE: usize = 64 * 1024;

pub struct EntryLedger {
    path: PathBuf,
    write_enabled: bool,
    written: Mutex<HashSet<String>>,
}

impl EntryLedger {
    pub fn open(data_dir: &Path, account: u32, clock: &dyn Clock, cutoff_hour: u32) -> Self {
        let write_enabled = clock.local_hour() >= cutoff_hour;
        if !write_enabled {
            tracing::info!(
                account,
                cutoff_hour,
                "Run started before the cutoff hour, ledger writes disabled"
            );
        }
        Self {
            path: data_dir.join(format!("ledger-{account}.txt")),
            write_enabled,
            written: Mutex::new(HashSet::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `id` appears as a complete comma-delimited token.
    pub async fn exists(&self, id: &str) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let mut file = File::open(&self.path)
            .await
            .with_context(|| format!("Failed to open ledger {}", self.path.display()))?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        // tail of the previous chunk that has not seen its comma yet
        let mut carry = String::new();
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            carry.push_str(&String::from_utf8_lossy(&buf[..n]));
            if let Some(last_comma) = carry.rfind(',') {
                let complete = &carry[..last_comma];
                if complete.split(',').any(|token| token == id) {
                    return Ok(true);
                }
                carry = carry[last_comma + 1..].to_string();
            }
        }
        // a final token the writer never terminated
        Ok(carry == id)
    }

    /// Append `id,` at most once per run. No-op before the cutoff hour.
    pub async fn record(&self, id: &str) -> Result<()> {
        if !self.write_enabled {
            tracing::debug!(id, "Ledger write skipped (pre-cutoff run)");
            return Ok(());
        }
        {
            let mut written = match self.written.lock() {
                Ok(written) => written,
                Err(poisoned) => poisoned.into_inner(),
            };
            if !written.insert(id.to_string()) {
                return Ok(());
            }
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open ledger {}", self.path.display()))?;
        file.write_all(format!("{id},").as_bytes()).await?;
        tracing::debug!(id, "Ledger write");
        Ok(())
    }
}
