use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::pricing;
use crate::provider;

/// Benchmark sub-metrics that feed the quality dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMetric {
    /// General intelligence composite; the fallback when nothing else is known.
    IntelligenceIndex,
    CodingIndex,
    Gpqa,
    Hle,
    Ifbench,
    Lcr,
    Scicode,
    TerminalbenchHard,
    Tau2,
}

impl QualityMetric {
    pub const ALL: [QualityMetric; 9] = [
        Self::IntelligenceIndex,
        Self::CodingIndex,
        Self::Gpqa,
        Self::Hle,
        Self::Ifbench,
        Self::Lcr,
        Self::Scicode,
        Self::TerminalbenchHard,
        Self::Tau2,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::IntelligenceIndex => "intelligence_index",
            Self::CodingIndex => "coding_index",
            Self::Gpqa => "gpqa",
            Self::Hle => "hle",
            Self::Ifbench => "ifbench",
            Self::Lcr => "lcr",
            Self::Scicode => "scicode",
            Self::TerminalbenchHard => "terminalbench_hard",
            Self::Tau2 => "tau2",
        }
    }
}

impl std::str::FromStr for QualityMetric {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("aa_").unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|m| m.key() == s)
            .ok_or_else(|| format!("unknown quality metric: {s}"))
    }
}

/// Whether a larger raw value is better or worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherBetter,
    LowerBetter,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Self::HigherBetter => 1.0,
            Self::LowerBetter => -1.0,
        }
    }
}

/// Anything the normalizer calibrates: each quality sub-metric plus the three
/// operational dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Quality(QualityMetric),
    /// Blended USD per 1M tokens.
    Cost,
    /// Time to first token, seconds.
    Latency,
    /// Sustained output tokens per second.
    Throughput,
}

impl Metric {
    pub fn direction(self) -> Direction {
        match self {
            Self::Cost | Self::Latency => Direction::LowerBetter,
            Self::Quality(_) | Self::Throughput => Direction::HigherBetter,
        }
    }

    /// Points per robust standard deviation. Prices are heavy-tailed, so cost
    /// gets a gentler slope than benchmark scores.
    pub fn scale(self) -> f64 {
        match self {
            Self::Quality(QualityMetric::IntelligenceIndex) => 20.0,
            Self::Quality(_) => 18.0,
            Self::Cost => 15.0,
            Self::Latency => 15.0,
            Self::Throughput => 15.0,
        }
    }

    /// Every metric the engine may need statistics for.
    pub fn all() -> impl Iterator<Item = Metric> {
        QualityMetric::ALL
            .into_iter()
            .map(Metric::Quality)
            .chain([Metric::Cost, Metric::Latency, Metric::Throughput])
    }
}

/// How confidently the benchmark record was matched to its pricing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One scoreable model, as supplied by the snapshot store. Field aliases accept
/// the store's column names directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateModel {
    #[serde(alias = "aa_slug")]
    pub slug: String,
    #[serde(alias = "aa_name", default)]
    pub name: String,
    #[serde(alias = "aa_model_creator_name", default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub is_cn_provider: Option<bool>,

    #[serde(alias = "aa_intelligence_index", default)]
    pub intelligence_index: Option<f64>,
    #[serde(alias = "aa_coding_index", default)]
    pub coding_index: Option<f64>,
    #[serde(alias = "aa_gpqa", default)]
    pub gpqa: Option<f64>,
    #[serde(alias = "aa_hle", default)]
    pub hle: Option<f64>,
    #[serde(alias = "aa_ifbench", default)]
    pub ifbench: Option<f64>,
    #[serde(alias = "aa_lcr", default)]
    pub lcr: Option<f64>,
    #[serde(alias = "aa_scicode", default)]
    pub scicode: Option<f64>,
    #[serde(alias = "aa_terminalbench_hard", default)]
    pub terminalbench_hard: Option<f64>,
    #[serde(alias = "aa_tau2", default)]
    pub tau2: Option<f64>,

    #[serde(alias = "aa_ttft_seconds", default)]
    pub ttft_seconds: Option<f64>,
    #[serde(alias = "aa_tps", default)]
    pub tokens_per_second: Option<f64>,

    /// USD per 1M tokens.
    #[serde(alias = "aa_price_input_usd", default)]
    pub price_input_usd: Option<f64>,
    #[serde(alias = "aa_price_output_usd", default)]
    pub price_output_usd: Option<f64>,
    #[serde(alias = "aa_price_blended_usd", default)]
    pub price_blended_usd: Option<f64>,

    #[serde(alias = "aa_context_length", default)]
    pub context_length: Option<u64>,
    /// Context window reported by the routing source; preferred when present.
    #[serde(alias = "or_context_length", default)]
    pub routed_context_length: Option<u64>,

    #[serde(alias = "aa_modality", default)]
    pub modality: Option<String>,
    #[serde(alias = "or_architecture_input_modalities", default)]
    pub input_modalities: Vec<String>,
    #[serde(default)]
    pub supports_tools: Option<bool>,
    #[serde(default)]
    pub supports_structured_output: Option<bool>,
    #[serde(default)]
    pub supports_multimodal: Option<bool>,

    #[serde(alias = "aa_release_date", default, deserialize_with = "lenient_date")]
    pub release_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub record_date: Option<NaiveDate>,

    /// Benchmark source present.
    #[serde(alias = "has_aa", default)]
    pub has_benchmarks: bool,
    /// Pricing/routing source present.
    #[serde(alias = "has_or", default)]
    pub has_routing: bool,
    #[serde(default)]
    pub match_confidence: Option<String>,
}

/// Accept "2026-02-11", "2026-02-11T08:00:00Z", null, or an unparseable string (as None).
fn lenient_date<'de, D>(de: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(de)?;
    Ok(raw.and_then(|s| {
        let day = s.get(..10).unwrap_or(&s);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }))
}

impl CandidateModel {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.slug
        } else {
            &self.name
        }
    }

    pub fn quality(&self, metric: QualityMetric) -> Option<f64> {
        match metric {
            QualityMetric::IntelligenceIndex => self.intelligence_index,
            QualityMetric::CodingIndex => self.coding_index,
            QualityMetric::Gpqa => self.gpqa,
            QualityMetric::Hle => self.hle,
            QualityMetric::Ifbench => self.ifbench,
            QualityMetric::Lcr => self.lcr,
            QualityMetric::Scicode => self.scicode,
            QualityMetric::TerminalbenchHard => self.terminalbench_hard,
            QualityMetric::Tau2 => self.tau2,
        }
        .filter(|v| v.is_finite())
    }

    /// Raw value the normalizer sees for `metric`.
    pub fn raw(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Quality(q) => self.quality(q),
            Metric::Cost => self.blended_price(),
            Metric::Latency => self.ttft_seconds.filter(|v| v.is_finite()),
            Metric::Throughput => self.tokens_per_second.filter(|v| v.is_finite()),
        }
    }

    /// Blended USD per 1M tokens, reconstructed from input/output when needed.
    pub fn blended_price(&self) -> Option<f64> {
        pricing::blended_per_m(
            self.price_blended_usd,
            self.price_input_usd,
            self.price_output_usd,
        )
    }

    pub fn context_window(&self) -> Option<u64> {
        self.routed_context_length.or(self.context_length)
    }

    /// CN flag from the snapshot, else from the vendor registry.
    pub fn is_cn(&self) -> bool {
        self.is_cn_provider.unwrap_or_else(|| {
            self.creator
                .as_deref()
                .is_some_and(provider::is_domestic_vendor)
        })
    }

    fn is_text_model(&self) -> bool {
        self.modality
            .as_deref()
            .map_or(true, |m| m.eq_ignore_ascii_case("llm"))
    }

    /// Explicit flag, else assume text models can call tools.
    pub fn has_tools(&self) -> bool {
        self.supports_tools.unwrap_or_else(|| self.is_text_model())
    }

    pub fn has_structured_output(&self) -> bool {
        self.supports_structured_output
            .unwrap_or_else(|| self.is_text_model())
    }

    pub fn has_multimodal(&self) -> bool {
        self.supports_multimodal.unwrap_or_else(|| {
            !self.is_text_model()
                || self.input_modalities.iter().any(|m| {
                    m.eq_ignore_ascii_case("image") || m.eq_ignore_ascii_case("audio")
                })
        })
    }

    /// Both sources matched and the minimum quality signal is present.
    pub fn is_complete(&self) -> bool {
        self.has_benchmarks && self.has_routing && self.quality(QualityMetric::IntelligenceIndex).is_some()
    }

    pub fn confidence(&self) -> Confidence {
        match self.match_confidence.as_deref() {
            Some("high") => Confidence::High,
            Some("medium") => Confidence::Medium,
            _ => Confidence::Low,
        }
    }

    /// Format a token count as "128K", "1M", "200K".
    pub fn fmt_context(tokens: u64) -> String {
        if tokens >= 1_000_000 && tokens % 1_000_000 == 0 {
            format!("{}M", tokens / 1_000_000)
        } else if tokens >= 1_000 {
            format!("{}K", tokens / 1_000)
        } else {
            tokens.to_string()
        }
    }
}
