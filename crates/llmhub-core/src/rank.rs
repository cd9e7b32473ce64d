use std::cmp::Ordering;

use crate::blend::DimensionScore;
use crate::model::CandidateModel;

/// A filtered candidate with its unrounded blended scores.
#[derive(Debug, Clone)]
pub struct Scored<'a> {
    pub candidate: &'a CandidateModel,
    pub scores: DimensionScore,
}

/// Total descending, then display name, then slug.
pub fn compare(a: &Scored<'_>, b: &Scored<'_>) -> Ordering {
    b.scores
        .total
        .total_cmp(&a.scores.total)
        .then_with(|| a.candidate.display_name().cmp(b.candidate.display_name()))
        .then_with(|| a.candidate.slug.cmp(&b.candidate.slug))
}

/// Every scored candidate, ordered by [`compare`].
pub fn rank_all(mut scored: Vec<Scored<'_>>) -> Vec<Scored<'_>> {
    scored.sort_by(compare);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(total: f64) -> DimensionScore {
        DimensionScore {
            quality: 50.0,
            cost: 50.0,
            latency: 50.0,
            throughput: 50.0,
            total,
        }
    }

    fn model(slug: &str, name: &str) -> CandidateModel {
        CandidateModel {
            slug: slug.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn orders_by_total_then_name_then_slug() {
        let a = model("z-slug", "Alpha");
        let b = model("b", "Beta");
        let c = model("a-slug", "Alpha");
        let d = model("d", "Delta");
        let scored = vec![
            Scored { candidate: &b, scores: score(70.0) },
            Scored { candidate: &a, scores: score(70.0) },
            Scored { candidate: &d, scores: score(90.0) },
            Scored { candidate: &c, scores: score(70.0) },
        ];
        let ranked = rank_all(scored);
        let slugs: Vec<_> = ranked.iter().map(|s| s.candidate.slug.as_str()).collect();
        assert_eq!(slugs, vec!["d", "a-slug", "z-slug", "b"]);
    }

    #[test]
    fn totals_that_round_alike_keep_exact_order() {
        let alpha = model("alpha", "Alpha");
        let beta = model("beta", "Beta");
        let scored = vec![
            Scored { candidate: &alpha, scores: score(70.01) },
            Scored { candidate: &beta, scores: score(70.04) },
        ];
        let ranked = rank_all(scored);
        assert_eq!(ranked[0].candidate.slug, "beta");
        assert_eq!(ranked[0].scores.rounded().total, ranked[1].scores.rounded().total);
    }

    #[test]
    fn orders_by_descending_total() {
        let models: Vec<_> = (0..6).map(|i| model(&format!("m{i}"), "")).collect();
        let scored = models
            .iter()
            .enumerate()
            .map(|(i, m)| Scored { candidate: m, scores: score(i as f64) })
            .collect();
        let ranked = rank_all(scored);
        assert_eq!(ranked.len(), 6);
        assert_eq!(ranked[0].candidate.slug, "m5");
        assert_eq!(ranked[5].candidate.slug, "m0");
    }
}
