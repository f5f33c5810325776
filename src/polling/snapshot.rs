//! JSON snapshots of the poll and vote collections

use crate::types::{Poll, Vote};
use crate::{Result, validation_error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Point-in-time copy of both collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub taken_at: DateTime<Utc>,
    pub polls: Vec<Poll>,
    pub votes: Vec<Vote>,
}

impl Snapshot {
    pub fn new(polls: Vec<Poll>, votes: Vec<Vote>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            taken_at: Utc::now(),
            polls,
            votes,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(validation_error!(
                "version",
                "unsupported snapshot version {}",
                snapshot.version
            ));
        }

        Ok(snapshot)
    }

    /// Write the snapshot, replacing any previous file only once fully written
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let staging = path.with_extension("tmp");

        fs::write(&staging, json)?;
        if let Err(e) = fs::rename(&staging, path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }

        tracing::info!(
            path = %path.display(),
            polls = self.polls.len(),
            votes = self.votes.len(),
            "💾 Snapshot saved"
        );

        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let snapshot = Self::from_json(&json)?;

        tracing::info!(
            path = %path.display(),
            polls = snapshot.polls.len(),
            votes = snapshot.votes.len(),
            "Snapshot loaded"
        );

        Ok(snapshot)
    }
}
