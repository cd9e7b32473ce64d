use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AdvisorError, Result};
use crate::model::QualityMetric;

/// Per-metric importance. Vectors coming out of the table sum to 1.
pub type QualityWeights = BTreeMap<QualityMetric, f64>;

/// Sub-category used when the caller names none.
pub const GENERAL: &str = "general";

/// What the caller wants the model for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub category: String,
    /// Accepts a single string (`"sub_scenario": "generation"`) or a list.
    #[serde(default, alias = "sub_scenario", deserialize_with = "one_or_many")]
    pub sub_categories: Vec<String>,
}

impl Scenario {
    pub fn new(category: &str, subs: &[&str]) -> Self {
        Self {
            category: category.to_string(),
            sub_categories: subs.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// "code/generation+debugging", for log lines and fallback explanations.
    pub fn label(&self) -> String {
        if self.sub_categories.is_empty() {
            self.category.clone()
        } else {
            format!("{}/{}", self.category, self.sub_categories.join("+"))
        }
    }
}

fn one_or_many<'de, D>(de: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Option::<OneOrMany>::deserialize(de)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) if s.is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

/// Immutable `(category, sub-category) → weights` table.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    categories: BTreeMap<String, BTreeMap<String, QualityWeights>>,
}

impl WeightTable {
    pub fn get(&self, category: &str, sub: &str) -> Option<&QualityWeights> {
        self.categories.get(category)?.get(sub)
    }

    /// Categories with their sub-categories, alphabetically.
    pub fn catalog(&self) -> impl Iterator<Item = (&str, Vec<&str>)> {
        self.categories
            .iter()
            .map(|(c, subs)| (c.as_str(), subs.keys().map(String::as_str).collect()))
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type RawTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>;

/// Parse a weight table from TOML. Each vector is rescaled to sum to 1.
pub fn parse_weight_table(toml_str: &str) -> Result<WeightTable> {
    let raw: RawTable = toml::from_str(toml_str)
        .map_err(|e| AdvisorError::Config(format!("bad scenarios.toml: {e}")))?;

    let mut categories = BTreeMap::new();
    for (category, subs) in raw {
        let mut parsed = BTreeMap::new();
        for (sub, weights) in subs {
            let mut vector = QualityWeights::new();
            for (key, w) in weights {
                let metric: QualityMetric = key
                    .parse()
                    .map_err(|e| AdvisorError::Config(format!("{category}.{sub}: {e}")))?;
                if !w.is_finite() || w < 0.0 {
                    return Err(AdvisorError::Config(format!(
                        "{category}.{sub}.{key}: weight must be non-negative, got {w}"
                    )));
                }
                vector.insert(metric, w);
            }
            let total: f64 = vector.values().sum();
            if total <= 0.0 {
                return Err(AdvisorError::Config(format!(
                    "{category}.{sub}: weights sum to zero"
                )));
            }
            vector.values_mut().for_each(|w| *w /= total);
            parsed.insert(sub, vector);
        }
        categories.insert(category, parsed);
    }
    Ok(WeightTable { categories })
}

/// Load a weight table from a TOML file.
pub fn load_weight_table(path: &Path) -> Result<WeightTable> {
    let content = std::fs::read_to_string(path).map_err(|e| AdvisorError::Io(e.to_string()))?;
    parse_weight_table(&content)
}

/// The table shipped in `data/scenarios.toml`.
pub fn load_bundled_weight_table() -> Result<WeightTable> {
    parse_weight_table(include_str!("../../../data/scenarios.toml"))
}

/// Resolves the quality weight vector for a scenario against an injected table.
#[derive(Debug, Clone)]
pub struct ScenarioWeightResolver {
    table: Arc<WeightTable>,
}

impl ScenarioWeightResolver {
    pub fn new(table: Arc<WeightTable>) -> Self {
        Self { table }
    }

    pub fn bundled() -> Result<Self> {
        Ok(Self::new(Arc::new(load_bundled_weight_table()?)))
    }

    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    /// Average the vectors of the selected sub-categories that exist in the
    /// table. With none, use the category's `general` entry, and failing that
    /// the intelligence index alone.
    pub fn resolve(&self, scenario: &Scenario) -> QualityWeights {
        let mut seen: Vec<&str> = Vec::new();
        for sub in &scenario.sub_categories {
            if !seen.contains(&sub.as_str()) {
                seen.push(sub);
            }
        }
        let vectors: Vec<&QualityWeights> = seen
            .iter()
            .filter_map(|sub| self.table.get(&scenario.category, sub))
            .collect();

        if vectors.is_empty() {
            return match self.table.get(&scenario.category, GENERAL) {
                Some(general) => general.clone(),
                None => {
                    tracing::debug!(scenario = %scenario.label(), "no weights in table, using intelligence index");
                    QualityWeights::from([(QualityMetric::IntelligenceIndex, 1.0)])
                }
            };
        }

        let n = vectors.len() as f64;
        let mut combined = QualityWeights::new();
        for v in vectors {
            for (&metric, &w) in v {
                *combined.entry(metric).or_insert(0.0) += w / n;
            }
        }
        combined
    }
}
