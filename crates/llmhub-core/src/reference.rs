//! Background population used only to calibrate normalization.
//!
//! The filtered result set can be tiny (two or three models after a strict
//! context-window filter), which would make median/MAD meaningless. The pool
//! is therefore drawn from the completeness-checked baseline instead, with a
//! three-tier fallback so it is never empty when any candidates exist.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::filter::completeness_baseline;
use crate::model::CandidateModel;

/// Which tier of the fallback chain produced the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolTier {
    /// Complete models released within the trailing window.
    Recent,
    /// All complete models.
    Baseline,
    /// Whatever the caller supplied.
    Supplied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub recent_window_days: u64,
    pub min_sample: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            recent_window_days: 180,
            min_sample: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReferencePool<'a> {
    pub tier: PoolTier,
    pub members: Vec<&'a CandidateModel>,
}

/// What the caller gets to see about the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub tier: PoolTier,
    pub size: usize,
}

impl ReferencePool<'_> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn summary(&self) -> PoolSummary {
        PoolSummary {
            tier: self.tier,
            size: self.members.len(),
        }
    }
}

/// Pick the calibration population.
///
/// `as_of` anchors the trailing window; without it the newest release date in
/// the baseline is used, so identical inputs always select the same pool.
pub fn select_reference_pool<'a>(
    supplied: &'a [CandidateModel],
    as_of: Option<NaiveDate>,
    settings: &PoolSettings,
) -> ReferencePool<'a> {
    let baseline = completeness_baseline(supplied);

    let anchor = as_of.or_else(|| baseline.iter().filter_map(|c| c.release_date).max());
    let recent: Vec<&CandidateModel> = match anchor {
        Some(end) => {
            let start = end
                .checked_sub_days(Days::new(settings.recent_window_days))
                .unwrap_or(NaiveDate::MIN);
            baseline
                .iter()
                .copied()
                .filter(|c| c.release_date.is_some_and(|d| d >= start && d <= end))
                .collect()
        }
        None => Vec::new(),
    };

    let min_sample = settings.min_sample.max(1);
    let pool = if recent.len() >= min_sample {
        ReferencePool { tier: PoolTier::Recent, members: recent }
    } else if baseline.len() >= min_sample {
        ReferencePool { tier: PoolTier::Baseline, members: baseline }
    } else {
        ReferencePool {
            tier: PoolTier::Supplied,
            members: supplied.iter().collect(),
        }
    };

    tracing::debug!(tier = ?pool.tier, size = pool.len(), "selected reference pool");
    pool
}
