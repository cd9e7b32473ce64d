//! Loading snapshot rows: from a file, the bundled sample, or the sync cache.

use std::path::{Path, PathBuf};

use crate::error::{AdvisorError, Result};
use crate::model::CandidateModel;

/// File name of synced snapshots inside the cache directory.
pub const SNAPSHOT_FILE: &str = "snapshots.json";

/// Where a set of snapshot rows was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOrigin {
    File(PathBuf),
    Cache(PathBuf),
    Bundled,
}

impl std::fmt::Display for SnapshotOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(p) => write!(f, "file:{}", p.display()),
            Self::Cache(p) => write!(f, "cache:{}", p.display()),
            Self::Bundled => write!(f, "bundled:snapshots.sample.json"),
        }
    }
}

/// Parse a JSON array of snapshot rows. Store column names are accepted.
pub fn parse_snapshots(json: &str) -> Result<Vec<CandidateModel>> {
    let rows: Vec<CandidateModel> = serde_json::from_str(json)?;
    Ok(rows)
}

/// One row per slug, keeping the newest record date. First-seen order is kept.
pub fn latest_per_slug(rows: &[CandidateModel]) -> Vec<&CandidateModel> {
    let mut latest: Vec<&CandidateModel> = Vec::new();
    for row in rows {
        match latest.iter_mut().find(|r| r.slug == row.slug) {
            Some(existing) if row.record_date > existing.record_date => *existing = row,
            Some(_) => {}
            None => latest.push(row),
        }
    }
    latest
}

/// Load snapshot rows from a JSON file.
pub fn load_snapshots(path: &Path) -> Result<Vec<CandidateModel>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AdvisorError::Io(format!("{}: {e}", path.display())))?;
    parse_snapshots(&content)
}

/// The sample shipped in `data/snapshots.sample.json`.
pub fn load_bundled_snapshots() -> Result<Vec<CandidateModel>> {
    parse_snapshots(include_str!("../../../data/snapshots.sample.json"))
}

/// Cache directory for llmhub data, created on first use.
#[cfg(feature = "network")]
pub fn cache_dir() -> Option<PathBuf> {
    let dir = dirs::cache_dir()?.join("llmhub");
    if !dir.exists() {
        std::fs::create_dir_all(&dir).ok()?;
    }
    Some(dir)
}

#[cfg(feature = "network")]
pub fn cached_snapshot_path() -> Option<PathBuf> {
    Some(cache_dir()?.join(SNAPSHOT_FILE))
}

/// Synced snapshots if the cache holds a readable file, otherwise the sample.
#[cfg(feature = "network")]
pub fn load_snapshots_cached() -> Result<(Vec<CandidateModel>, SnapshotOrigin)> {
    if let Some(path) = cached_snapshot_path() {
        if path.exists() {
            match load_snapshots(&path) {
                Ok(rows) => return Ok((rows, SnapshotOrigin::Cache(path))),
                Err(e) => tracing::warn!(error = %e, "ignoring unreadable snapshot cache"),
            }
        }
    }
    Ok((load_bundled_snapshots()?, SnapshotOrigin::Bundled))
}

/// Rows from `path` when given, else the cache or bundled sample.
pub fn resolve_snapshots(path: Option<&Path>) -> Result<(Vec<CandidateModel>, SnapshotOrigin)> {
    if let Some(p) = path {
        return Ok((load_snapshots(p)?, SnapshotOrigin::File(p.to_path_buf())));
    }
    #[cfg(feature = "network")]
    {
        load_snapshots_cached()
    }
    #[cfg(not(feature = "network"))]
    {
        Ok((load_bundled_snapshots()?, SnapshotOrigin::Bundled))
    }
}
