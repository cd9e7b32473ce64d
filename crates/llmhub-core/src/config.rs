use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};
use crate::reference::PoolSettings;

/// Engine tunables, from `llmhub.toml` or defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Results returned when the request does not say.
    pub top_k: usize,
    /// Trailing window for the "recent" reference tier.
    pub recent_window_days: u64,
    /// Smallest reference tier accepted before falling back.
    pub min_reference_sample: usize,
    /// Fraction of quality+cost weight moved by a speed preference.
    pub speed_shift: f64,
    /// Lead over the runner-up below which the top result is called close.
    pub close_margin: f64,
    pub usd_to_cny: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            recent_window_days: 180,
            min_reference_sample: 30,
            speed_shift: 0.2,
            close_margin: 5.0,
            usd_to_cny: 7.25,
        }
    }
}

impl EngineConfig {
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            recent_window_days: self.recent_window_days,
            min_sample: self.min_reference_sample,
        }
    }

    fn validate(self) -> Result<Self> {
        if self.top_k == 0 {
            return Err(AdvisorError::Config("top_k must be at least 1".into()));
        }
        if self.min_reference_sample == 0 {
            return Err(AdvisorError::Config(
                "min_reference_sample must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.speed_shift) {
            return Err(AdvisorError::Config(format!(
                "speed_shift must be within 0..=1, got {}",
                self.speed_shift
            )));
        }
        if !self.usd_to_cny.is_finite() || self.usd_to_cny <= 0.0 {
            return Err(AdvisorError::Config("usd_to_cny must be positive".into()));
        }
        Ok(self)
    }
}

/// Parse engine settings from TOML. Missing keys take their defaults.
pub fn parse_config(toml_str: &str) -> Result<EngineConfig> {
    let cfg: EngineConfig = toml::from_str(toml_str)
        .map_err(|e| AdvisorError::Config(format!("bad llmhub.toml: {e}")))?;
    cfg.validate()
}

/// Load engine settings from a TOML file.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AdvisorError::Io(e.to_string()))?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse_config("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_override() {
        let cfg = parse_config("top_k = 6\nusd_to_cny = 7.1\n").unwrap();
        assert_eq!(cfg.top_k, 6);
        assert_eq!(cfg.usd_to_cny, 7.1);
        assert_eq!(cfg.min_reference_sample, 30);
        assert_eq!(cfg.pool_settings().recent_window_days, 180);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_config("top_k = 0").is_err());
        assert!(parse_config("min_reference_sample = 0").is_err());
        assert!(parse_config("speed_shift = 1.5").is_err());
        assert!(parse_config("usd_to_cny = -1.0").is_err());
        assert!(parse_config("top_k = \"four\"").is_err());
    }
}
