//! Persistence layer.
//!
//! Saves command results as timestamped JSON documents so every run
//! leaves an auditable artifact. Each document carries the command name,
//! a UTC timestamp, the parameters the run was invoked with, and the
//! result payload.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::PipelineError;

/// Writes command results to a directory as pretty-printed JSON.
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persist one command result. Returns the path written.
    ///
    /// The filename is `{command}_{YYYYmmdd_HHMMSS}.json`; the document
    /// wraps the payload with the command name, timestamp, and params.
    pub fn save<T: Serialize>(
        &self,
        command: &str,
        data: &T,
        params: serde_json::Value,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create results dir {}", self.dir.display()))?;

        let now = Utc::now();
        let document = json!({
            "command": command,
            "timestamp": now.to_rfc3339(),
            "params": params,
            "data": data,
        });

        let filename = format!("{command}_{}.json", now.format("%Y%m%d_%H%M%S"));
        let path = self.dir.join(filename);

        let body = serde_json::to_string_pretty(&document)
            .context("Failed to serialise result document")?;
        std::fs::write(&path, body).map_err(|e| {
            PipelineError::Storage(format!("failed to write {}: {e}", path.display()))
        })?;

        info!(path = %path.display(), command, "Result saved");
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
