use chrono::NaiveDate;

use crate::api::StoreClient;
use crate::error::{AdvisorError, Result};
use crate::snapshot;

pub struct SyncResult {
    pub rows: usize,
    pub complete_rows: usize,
    pub newest_record: Option<NaiveDate>,
    pub path: std::path::PathBuf,
}

/// Download the latest snapshot rows, validate them, and write them to the cache.
pub async fn sync_snapshots(client: &StoreClient, limit: u32) -> Result<SyncResult> {
    let path = snapshot::cached_snapshot_path()
        .ok_or_else(|| AdvisorError::Io("cannot determine cache directory".into()))?;

    let text = client.snapshot_json(limit).await?;
    // Validate by parsing before writing.
    let rows = snapshot::parse_snapshots(&text)?;

    tokio::fs::write(&path, &text)
        .await
        .map_err(|e| AdvisorError::Io(format!("failed to write snapshot cache: {e}")))?;
    tracing::info!(rows = rows.len(), path = %path.display(), "snapshot cache updated");

    Ok(SyncResult {
        rows: rows.len(),
        complete_rows: rows.iter().filter(|r| r.is_complete()).count(),
        newest_record: rows.iter().filter_map(|r| r.record_date).max(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Integration test: needs a reachable store.
    /// Run with: LLMHUB_STORE_URL=... LLMHUB_STORE_KEY=... cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn sync_downloads_and_validates() {
        let client = StoreClient::from_env().expect("store settings");
        let result = sync_snapshots(&client, 50).await.expect("sync should succeed");
        assert!(result.rows > 0);
        assert!(result.path.exists(), "snapshot cache not written");
    }

    #[test]
    fn cache_aware_loader_falls_back_to_bundled() {
        let (rows, _origin) = snapshot::load_snapshots_cached().expect("should load snapshots");
        assert!(!rows.is_empty());
    }
}
