//! Deterministic, template-driven rationale for each recommended model.
//!
//! Statements and trade-offs are ordered `(predicate, template)` tables. Every
//! matching statement rule fires in order; the trade-off table stops at the
//! first match and its last rule always matches.

use serde::{Deserialize, Serialize};

use crate::blend::DimensionScore;
use crate::model::CandidateModel;
use crate::pricing::fmt_usd_cny;
use crate::provider::Region;
use crate::scenario::Scenario;

/// Upper bound on statements per result.
pub const MAX_STATEMENTS: usize = 6;
/// Below this many statements the fallback summary is appended.
pub const MIN_STATEMENTS: usize = 3;

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct ExplainContext<'a> {
    pub candidate: &'a CandidateModel,
    pub scores: &'a DimensionScore,
    pub scenario: &'a Scenario,
    pub region: Region,
    /// 1-based position in the returned list.
    pub rank: usize,
    /// Total of the second-ranked result, if there is one.
    pub runner_up_total: Option<f64>,
    pub close_margin: f64,
    pub usd_to_cny: f64,
}

impl ExplainContext<'_> {
    fn has_sub(&self, sub: &str) -> bool {
        self.scenario.sub_categories.iter().any(|s| s == sub)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub explanations: Vec<String>,
    pub tradeoffs: Vec<String>,
}

type Predicate = fn(&ExplainContext<'_>) -> bool;
type Template = fn(&ExplainContext<'_>) -> String;

fn band<'s>(score: f64, high: f64, mid: f64, labels: [&'s str; 3]) -> &'s str {
    if score >= high {
        labels[0]
    } else if score >= mid {
        labels[1]
    } else {
        labels[2]
    }
}

fn pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

const STATEMENT_RULES: &[(Predicate, Template)] = &[
    // quality band
    (
        |c| c.candidate.intelligence_index.is_some(),
        |c| {
            format!(
                "Intelligence index {:.2}: {} among candidates for this scenario.",
                c.candidate.intelligence_index.unwrap_or_default(),
                band(
                    c.scores.quality,
                    75.0,
                    50.0,
                    ["top tier", "above average", "solid baseline capability"]
                )
            )
        },
    ),
    // scenario highlights
    (
        |c| c.scenario.category == "code" && c.candidate.coding_index.is_some(),
        |c| {
            let task = if c.has_sub("generation") {
                "code generation"
            } else if c.has_sub("debugging") {
                "debugging"
            } else {
                "coding tasks"
            };
            format!(
                "Coding index {:.2}, well suited to {task}.",
                c.candidate.coding_index.unwrap_or_default()
            )
        },
    ),
    (
        |c| {
            (c.scenario.category == "rag" || c.has_sub("long_context") || c.has_sub("long_doc"))
                && c.candidate.lcr.is_some()
        },
        |c| {
            format!(
                "Long-context recall {}, suited to large document workloads.",
                pct(c.candidate.lcr.unwrap_or_default())
            )
        },
    ),
    (
        |c| c.scenario.category == "agent" && c.candidate.tau2.is_some(),
        |c| {
            let tau2 = c.candidate.tau2.unwrap_or_default();
            format!(
                "Tool-use score {}, {} in agent workflows.",
                pct(tau2),
                if tau2 > 0.5 { "strong" } else { "adequate" }
            )
        },
    ),
    (
        |c| c.scenario.category == "math" && c.candidate.hle.is_some(),
        |c| {
            let level = if c.has_sub("aime") {
                "competition-level"
            } else {
                "advanced"
            };
            format!(
                "Hard reasoning score {}, suited to {level} math.",
                pct(c.candidate.hle.unwrap_or_default())
            )
        },
    ),
    // speed narrative
    (
        |c| c.candidate.ttft_seconds.is_some() && c.candidate.tokens_per_second.is_some(),
        |c| {
            format!(
                "First token in {:.3}s at {:.1} tokens/s: {}.",
                c.candidate.ttft_seconds.unwrap_or_default(),
                c.candidate.tokens_per_second.unwrap_or_default(),
                band(
                    c.scores.latency,
                    70.0,
                    40.0,
                    ["fast responses", "moderate speed", "high latency"]
                )
            )
        },
    ),
    (
        |c| c.candidate.ttft_seconds.is_some() && c.candidate.tokens_per_second.is_none(),
        |c| {
            format!(
                "First token in {:.3}s.",
                c.candidate.ttft_seconds.unwrap_or_default()
            )
        },
    ),
    // cost narrative
    (
        |c| c.candidate.blended_price().is_some(),
        |c| {
            format!(
                "Blended price about {} per 1M tokens: {}.",
                fmt_usd_cny(c.candidate.blended_price().unwrap_or_default(), c.usd_to_cny),
                band(
                    c.scores.cost,
                    75.0,
                    50.0,
                    [
                        "a clear price advantage",
                        "moderately priced",
                        "on the expensive side, weigh against quality"
                    ]
                )
            )
        },
    ),
    // region
    (
        |c| c.region == Region::Cn && c.candidate.is_cn(),
        |c| {
            format!(
                "Served by domestic vendor {}, directly reachable from mainland China.",
                c.candidate.creator.as_deref().unwrap_or("(unknown)")
            )
        },
    ),
];

const TRADEOFF_RULES: &[(Predicate, Template)] = &[
    (
        |c| c.scores.quality > 70.0 && c.scores.cost < 40.0,
        |_| "High quality at a high price; estimate real token volume before committing.".into(),
    ),
    (
        |c| c.scores.cost > 70.0 && c.scores.quality < 50.0,
        |_| "Cheap but modest capability; best for low-complexity, high-frequency tasks.".into(),
    ),
    (
        |c| c.scores.latency < 40.0,
        |_| "High time to first token; not suited to strict real-time interaction.".into(),
    ),
    (
        |c| {
            c.rank == 1
                && c.runner_up_total
                    .is_some_and(|r| c.scores.total - r < c.close_margin)
        },
        |_| "The runner-up scores close behind; compare both against your workload.".into(),
    ),
    (
        |_| true,
        |_| "Run a small A/B pilot in production to confirm behavior on your real traffic.".into(),
    ),
];

/// Build statements and exactly one trade-off for a ranked result.
pub fn explain(ctx: &ExplainContext<'_>) -> Explanation {
    let mut explanations: Vec<String> = STATEMENT_RULES
        .iter()
        .filter(|(when, _)| when(ctx))
        .map(|(_, render)| render(ctx))
        .take(MAX_STATEMENTS)
        .collect();

    if explanations.len() < MIN_STATEMENTS {
        explanations.push(format!(
            "Scores {:.1}/100 overall for {}.",
            ctx.scores.total,
            ctx.scenario.label()
        ));
    }

    let tradeoffs = TRADEOFF_RULES
        .iter()
        .find(|(when, _)| when(ctx))
        .map(|(_, render)| render(ctx))
        .into_iter()
        .collect();

    Explanation {
        explanations,
        tradeoffs,
    }
}
