use serde::{Deserialize, Serialize};

/// How the four scored dimensions combine into a total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionWeights {
    pub quality: f64,
    pub cost: f64,
    pub latency: f64,
    pub throughput: f64,
}

impl DimensionWeights {
    pub fn sum(&self) -> f64 {
        self.quality + self.cost + self.latency + self.throughput
    }
}

/// Named preset weighting of quality/cost/latency/throughput.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationProfile {
    #[default]
    Balanced,
    BestQuality,
    BestValue,
    Cheapest,
    Fastest,
}

impl OptimizationProfile {
    pub const ALL: [OptimizationProfile; 5] = [
        Self::Balanced,
        Self::BestQuality,
        Self::BestValue,
        Self::Cheapest,
        Self::Fastest,
    ];

    pub fn weights(self) -> DimensionWeights {
        let (quality, cost, latency, throughput) = match self {
            Self::Balanced => (0.35, 0.25, 0.20, 0.20),
            Self::BestQuality => (0.60, 0.10, 0.15, 0.15),
            Self::BestValue => (0.35, 0.40, 0.15, 0.10),
            Self::Cheapest => (0.30, 0.70, 0.00, 0.00),
            Self::Fastest => (0.25, 0.10, 0.40, 0.25),
        };
        DimensionWeights { quality, cost, latency, throughput }
    }
}

impl std::fmt::Display for OptimizationProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Balanced => write!(f, "balanced"),
            Self::BestQuality => write!(f, "best_quality"),
            Self::BestValue => write!(f, "best_value"),
            Self::Cheapest => write!(f, "cheapest"),
            Self::Fastest => write!(f, "fastest"),
        }
    }
}

impl std::str::FromStr for OptimizationProfile {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "balanced" => Ok(Self::Balanced),
            "best_quality" | "quality" => Ok(Self::BestQuality),
            "best_value" | "value" => Ok(Self::BestValue),
            "cheapest" => Ok(Self::Cheapest),
            "fastest" => Ok(Self::Fastest),
            other => Err(format!("unknown profile: {other}")),
        }
    }
}

/// Tilt applied on top of a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedPreference {
    #[default]
    #[serde(alias = "balanced_speed")]
    Balanced,
    LowLatency,
    HighThroughput,
}

impl std::str::FromStr for SpeedPreference {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "balanced" | "balanced_speed" => Ok(Self::Balanced),
            "low_latency" | "latency" => Ok(Self::LowLatency),
            "high_throughput" | "throughput" => Ok(Self::HighThroughput),
            other => Err(format!("unknown speed preference: {other}")),
        }
    }
}

/// Profile weights after moving `shift` of the quality and cost weights into
/// latency or throughput. The total is unchanged.
pub fn effective_weights(
    profile: OptimizationProfile,
    speed: SpeedPreference,
    shift: f64,
) -> DimensionWeights {
    let mut w = profile.weights();
    let shift = shift.clamp(0.0, 1.0);
    let moved = (w.quality + w.cost) * shift;
    match speed {
        SpeedPreference::Balanced => return w,
        SpeedPreference::LowLatency => w.latency += moved,
        SpeedPreference::HighThroughput => w.throughput += moved,
    }
    w.quality *= 1.0 - shift;
    w.cost *= 1.0 - shift;
    w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_sum_to_one() {
        for p in OptimizationProfile::ALL {
            assert!((p.weights().sum() - 1.0).abs() < 1e-9, "{p} does not sum to 1");
        }
    }

    #[test]
    fn balanced_speed_leaves_profile() {
        let w = effective_weights(OptimizationProfile::Fastest, SpeedPreference::Balanced, 0.2);
        assert_eq!(w, OptimizationProfile::Fastest.weights());
    }

    #[test]
    fn low_latency_moves_weight() {
        let w = effective_weights(OptimizationProfile::Balanced, SpeedPreference::LowLatency, 0.2);
        assert!((w.quality - 0.28).abs() < 1e-9);
        assert!((w.cost - 0.20).abs() < 1e-9);
        assert!((w.latency - 0.32).abs() < 1e-9);
        assert!((w.throughput - 0.20).abs() < 1e-9);
        assert!((w.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn high_throughput_moves_weight() {
        let w = effective_weights(OptimizationProfile::Cheapest, SpeedPreference::HighThroughput, 0.2);
        assert!((w.throughput - 0.2).abs() < 1e-9);
        assert_eq!(w.latency, 0.0);
        assert!((w.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("best-value".parse::<OptimizationProfile>().unwrap(), OptimizationProfile::BestValue);
        let s: SpeedPreference = serde_json::from_str("\"balanced_speed\"").unwrap();
        assert_eq!(s, SpeedPreference::Balanced);
        assert!("turbo".parse::<SpeedPreference>().is_err());
    }
}
