#[cfg(feature = "network")]
pub mod api;
pub mod blend;
pub mod config;
pub mod engine;
pub mod error;
pub mod explain;
pub mod filter;
pub mod model;
pub mod normalize;
pub mod pricing;
pub mod profile;
pub mod provider;
pub mod rank;
pub mod reference;
pub mod scenario;
pub mod simple;
pub mod snapshot;
#[cfg(feature = "network")]
pub mod sync;

pub use config::EngineConfig;
pub use engine::{Recommendation, RecommendationRequest, RecommendationResult, Recommender};
pub use error::{AdvisorError, Result};
pub use model::CandidateModel;
pub use profile::{OptimizationProfile, SpeedPreference};
pub use provider::Region;
pub use scenario::{Scenario, ScenarioWeightResolver};
