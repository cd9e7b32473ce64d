// Price arithmetic shared by the robust engine and the simplified evaluator.
//
// Snapshot prices are USD per 1M tokens. The simplified surface works in USD
// per 1K tokens and mixes input/output prices by the expected token ratio.

/// Output tokens count this many times an input token when reconstructing a
/// blended price (a 1:3 input:output mix).
pub const OUTPUT_WEIGHT: f64 = 3.0;

/// Blended USD per 1M tokens: the published blended figure when present,
/// otherwise `(input + 3·output) / 4`.
pub fn blended_per_m(blended: Option<f64>, input: Option<f64>, output: Option<f64>) -> Option<f64> {
    if let Some(b) = blended.filter(|b| b.is_finite()) {
        return Some(b);
    }
    match (input, output) {
        (Some(i), Some(o)) if i.is_finite() && o.is_finite() => {
            Some((i + o * OUTPUT_WEIGHT) / (1.0 + OUTPUT_WEIGHT))
        }
        _ => None,
    }
}

/// Cost per 1K tokens for an expected input/output mix. With no token
/// estimate at all the input price is used.
pub fn blended_per_1k(input_per_1k: f64, output_per_1k: f64, input_tokens: f64, output_tokens: f64) -> f64 {
    let input_tokens = input_tokens.max(0.0);
    let output_tokens = output_tokens.max(0.0);
    let total = input_tokens + output_tokens;
    if total <= 0.0 {
        return input_per_1k;
    }
    (input_tokens / total) * input_per_1k + (output_tokens / total) * output_per_1k
}

/// "$0.450 (≈¥3.26)" for a USD amount.
pub fn fmt_usd_cny(usd: f64, usd_to_cny: f64) -> String {
    format!("${usd:.3} (≈¥{:.2})", usd * usd_to_cny)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blended_prefers_published_figure() {
        assert_eq!(blended_per_m(Some(1.5), Some(1.0), Some(4.0)), Some(1.5));
    }

    #[test]
    fn blended_reconstructs_one_to_three() {
        let b = blended_per_m(None, Some(1.0), Some(5.0)).unwrap();
        assert!((b - 4.0).abs() < 1e-9);
    }

    #[test]
    fn blended_needs_both_sides() {
        assert!(blended_per_m(None, Some(1.0), None).is_none());
        assert!(blended_per_m(None, None, None).is_none());
    }

    #[test]
    fn per_1k_token_mix() {
        assert!((blended_per_1k(0.001, 0.003, 1000.0, 1000.0) - 0.002).abs() < 1e-12);
        assert_eq!(blended_per_1k(0.001, 0.003, 0.0, 0.0), 0.001);
    }

    #[test]
    fn usd_cny_format() {
        assert_eq!(fmt_usd_cny(1.0, 7.25), "$1.000 (≈¥7.25)");
    }
}
