// Training journal
//
// Append-only JSONL file next to the model bundle. One line per successful
// training run; nothing is ever rewritten.

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use super::types::TrainingRun;

#[derive(Debug, Clone)]
pub struct TrainingJournal {
    path: PathBuf,
}

impl TrainingJournal {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create journal directory: {}", parent.display())
            })?;
        }
        Ok(Self { path })
    }

    /// Append one run as a JSON line
    pub fn append(&self, run: &TrainingRun) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open training journal: {}", self.path.display()))?;

        let json = serde_json::to_string(run).context("Failed to serialize training run")?;
        writeln!(file, "{}", json).context("Failed to write training run")?;

        tracing::debug!(model_id = %run.model_id, path = %self.path.display(), "Journaled training run");
        Ok(())
    }

    /// Every recorded run, oldest first
    pub fn read_all(&self) -> Result<Vec<TrainingRun>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read training journal: {}", self.path.display()))?;

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to parse training journal")
    }

    pub fn last_run(&self) -> Result<Option<TrainingRun>> {
        Ok(self.read_all()?.pop())
    }

    /// SHA-256 over the compact JSON encoding of `payload`
    pub fn fingerprint<T: Serialize + ?Sized>(payload: &T) -> Result<String> {
        let bytes = serde_json::to_vec(payload).context("Failed to serialize training payload")?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}
