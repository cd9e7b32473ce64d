use reqwest::Client;

use crate::error::{AdvisorError, Result};
use crate::model::CandidateModel;

/// Columns requested from `model_snapshots`.
const SNAPSHOT_COLUMNS: &[&str] = &[
    "aa_slug",
    "aa_name",
    "aa_model_creator_name",
    "is_cn_provider",
    "aa_modality",
    "aa_intelligence_index",
    "aa_coding_index",
    "aa_gpqa",
    "aa_hle",
    "aa_ifbench",
    "aa_lcr",
    "aa_scicode",
    "aa_terminalbench_hard",
    "aa_tau2",
    "aa_ttft_seconds",
    "aa_tps",
    "aa_price_input_usd",
    "aa_price_output_usd",
    "aa_price_blended_usd",
    "aa_context_length",
    "or_context_length",
    "or_architecture_input_modalities",
    "aa_release_date",
    "has_aa",
    "has_or",
    "match_confidence",
    "record_date",
];

/// Row cap per fetch, newest records first.
pub const DEFAULT_LIMIT: u32 = 1000;

/// Reads snapshot rows from a PostgREST endpoint (Supabase-style).
pub struct StoreClient {
    http: Client,
    base_url: String,
    key: String,
}

impl StoreClient {
    pub fn new(base_url: &str, key: &str) -> Result<Self> {
        Ok(Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }

    /// Build from `$LLMHUB_STORE_URL`/`$LLMHUB_STORE_KEY`, falling back to the
    /// usual Supabase variable names.
    pub fn from_env() -> Result<Self> {
        let var = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| std::env::var(n).ok().filter(|v| !v.is_empty()))
        };
        let url = var(&["LLMHUB_STORE_URL", "SUPABASE_URL"]).ok_or(AdvisorError::NoStore)?;
        let key = var(&[
            "LLMHUB_STORE_KEY",
            "SUPABASE_SERVICE_ROLE_KEY",
            "SUPABASE_ANON_KEY",
        ])
        .ok_or(AdvisorError::NoStore)?;
        Self::new(&url, &key)
    }

    fn snapshots_url(&self, limit: u32) -> String {
        format!(
            "{}/rest/v1/model_snapshots?select={}&order=record_date.desc&limit={limit}",
            self.base_url,
            urlencoding::encode(&SNAPSHOT_COLUMNS.join(",")),
        )
    }

    /// Latest snapshot rows, newest record date first, as raw JSON text.
    pub async fn snapshot_json(&self, limit: u32) -> Result<String> {
        let resp = self
            .http
            .get(self.snapshots_url(limit))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
            .header("Accept", "application/json")
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AdvisorError::Store { status, body });
        }
        Ok(resp.text().await?)
    }

    pub async fn fetch_snapshots(&self, limit: u32) -> Result<Vec<CandidateModel>> {
        let text = self.snapshot_json(limit).await?;
        let rows = crate::snapshot::parse_snapshots(&text)?;
        tracing::debug!(rows = rows.len(), "fetched snapshots");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_orders_newest_first_and_encodes_columns() {
        let c = StoreClient::new("https://db.example.com/", "k").unwrap();
        let url = c.snapshots_url(50);
        assert!(url.starts_with("https://db.example.com/rest/v1/model_snapshots?select=aa_slug%2Caa_name"));
        assert!(url.ends_with("&order=record_date.desc&limit=50"));
    }
}
