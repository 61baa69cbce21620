//! Scoring engine
//!
//! Pure functions from factor values + weight config to the rank score,
//! chart coordinates, and score color. No I/O; recomputation is deterministic
//! and idempotent, so callers derive these on every read instead of storing
//! them.

use crate::model::{FactorRole, ScoringScheme, WeightConfig};
use std::collections::BTreeMap;

/// Floor applied to divisor weights so a zero effort weight cannot produce a
/// division failure.
const MIN_DIVISOR_WEIGHT: f64 = 1e-3;

/// Derived metrics for one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    /// Rank score, 0-100
    pub score: u8,
    /// Chart x-coordinate; lower is better
    pub effort: f64,
    /// Chart y-coordinate; higher is better
    pub value: f64,
}

/// Compute the rank score and chart metrics for one factor map
///
/// Additive schemes normalize each factor to [0,1] (reversed factors flip),
/// take the weighted mean, and scale to 0-100; a zero total weight scores 0.
///
/// Ratio schemes compute
/// `raw = (prod(w_m * v_m) + sum(w_a * v_a)) / (w_d * v_d)` and scale against
/// the theoretical maximum raw value, substituting each numerator factor's
/// maximum and the divisor's minimum with the *same* weights, which keeps the
/// scale stable as weights change.
pub fn compute(
    factors: &BTreeMap<String, u8>,
    scheme: &ScoringScheme,
    weights: &WeightConfig,
) -> Scored {
    let val = |key: &str| -> f64 {
        factors
            .get(key)
            .copied()
            .or_else(|| scheme.factor(key).map(|f| f.default))
            .unwrap_or(0) as f64
    };

    let has_ratio = scheme
        .factors
        .iter()
        .any(|f| matches!(f.role, FactorRole::Multiplier | FactorRole::Divisor));

    let score = if has_ratio {
        ratio_score(scheme, weights, &val)
    } else {
        additive_score(scheme, weights, &val)
    };

    let effort = match scheme
        .factors
        .iter()
        .find(|f| f.role == FactorRole::Divisor)
    {
        Some(div) => val(div.key),
        // Effort falls as feasibility and time-to-value rise, adjusted by
        // declared cost.
        None => (6.0 - (val("feasibility") + val("ttv"))) + val("cost"),
    };
    let value = (val("impact") + val("align")) * 10.0;

    Scored {
        score,
        effort,
        value,
    }
}

fn additive_score(scheme: &ScoringScheme, weights: &WeightConfig, val: &dyn Fn(&str) -> f64) -> u8 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for f in &scheme.factors {
        let w = weights.get(f.key);
        let norm = clamp01(val(f.key) / f.max as f64);
        match f.role {
            FactorRole::Additive => weighted += norm * w,
            FactorRole::Reversed => weighted += (1.0 - norm) * w,
            _ => continue,
        }
        total += w;
    }
    if total <= 0.0 {
        return 0;
    }
    to_score(weighted / total)
}

fn ratio_score(scheme: &ScoringScheme, weights: &WeightConfig, val: &dyn Fn(&str) -> f64) -> u8 {
    let mut product = 1.0;
    let mut product_max = 1.0;
    let mut has_multiplier = false;
    let mut additive = 0.0;
    let mut additive_max = 0.0;
    let mut divisor = 1.0;
    let mut divisor_min = 1.0;

    for f in &scheme.factors {
        let w = weights.get(f.key);
        match f.role {
            FactorRole::Multiplier => {
                has_multiplier = true;
                product *= w * val(f.key);
                product_max *= w * f.max as f64;
            }
            FactorRole::Additive => {
                additive += w * val(f.key);
                additive_max += w * f.max as f64;
            }
            FactorRole::Reversed => {
                additive += w * (f.max as f64 - val(f.key));
                additive_max += w * (f.max - f.min) as f64;
            }
            FactorRole::Divisor => {
                let w = w.max(MIN_DIVISOR_WEIGHT);
                // The divisor value never drops below the scheme minimum,
                // which is itself >= 1 for effort scales.
                divisor *= w * val(f.key).max(f.min as f64);
                divisor_min *= w * f.min as f64;
            }
            FactorRole::ChartOnly => {}
        }
    }

    if !has_multiplier {
        product = 0.0;
        product_max = 0.0;
    }
    if divisor <= 0.0 || divisor_min <= 0.0 {
        return 0;
    }
    let raw = (product + additive) / divisor;
    let raw_max = (product_max + additive_max) / divisor_min;
    if raw_max <= 0.0 {
        return 0;
    }
    to_score(raw / raw_max)
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn to_score(fraction: f64) -> u8 {
    (clamp01(fraction) * 100.0).round() as u8
}

// ========================================
// Score color gradient
// ========================================

/// Gradient stops from low priority (green) to high priority (red)
const COLOR_STOPS: [(u8, u8, u8); 4] = [
    (0x10, 0xB9, 0x81), // green
    (0xFB, 0xBF, 0x24), // yellow
    (0xF5, 0x9E, 0x0B), // orange
    (0xE0, 0x24, 0x24), // red
];

/// Map a score to a `#RRGGBB` color by linear interpolation across the fixed
/// stops, indexed by `score / 100`. Continuous gradient, not discrete bands.
pub fn score_color(score: u8) -> String {
    let t = clamp01(score as f64 / 100.0);
    let segments = (COLOR_STOPS.len() - 1) as f64;
    let pos = t * segments;
    let idx = (pos.floor() as usize).min(COLOR_STOPS.len() - 2);
    let frac = pos - idx as f64;

    let (r0, g0, b0) = COLOR_STOPS[idx];
    let (r1, g1, b1) = COLOR_STOPS[idx + 1];
    let lerp = |a: u8, b: u8| -> u8 { (a as f64 + (b as f64 - a as f64) * frac).round() as u8 };

    format!("#{:02X}{:02X}{:02X}", lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScoringScheme;

    fn factors(pairs: &[(&str, u8)]) -> BTreeMap<String, u8> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_weighted_all_threes_scores_58() {
        // norm 0.6 on 80 weight points + reversed risk 0.4 on 10 = 58/100
        let scheme = ScoringScheme::weighted();
        let weights = WeightConfig::default_for(&scheme);
        let f = scheme.default_factors();
        assert_eq!(compute(&f, &scheme, &weights).score, 58);
    }

    #[test]
    fn test_weighted_zero_total_weight_scores_zero() {
        let scheme = ScoringScheme::weighted();
        let weights = WeightConfig::default();
        let f = scheme.default_factors();
        assert_eq!(compute(&f, &scheme, &weights).score, 0);
    }

    #[test]
    fn test_score_bounds_and_monotonicity() {
        let scheme = ScoringScheme::weighted();
        let mut configs = vec![WeightConfig::default_for(&scheme)];
        configs.extend(WeightConfig::presets().into_iter().map(|(_, w)| w));

        for weights in &configs {
            for f in scheme.factors.iter().filter(|f| f.role != FactorRole::ChartOnly) {
                let mut prev: Option<u8> = None;
                for v in f.min..=f.max {
                    let mut fac = scheme.default_factors();
                    fac.insert(f.key.to_string(), v);
                    let s = compute(&fac, &scheme, weights).score;
                    assert!(s <= 100);
                    if let Some(p) = prev {
                        if f.role == FactorRole::Reversed {
                            assert!(s <= p, "{} should be non-increasing", f.key);
                        } else {
                            assert!(s >= p, "{} should be non-decreasing", f.key);
                        }
                    }
                    prev = Some(s);
                }
            }
        }
    }

    #[test]
    fn test_reach_score_bounds_and_monotonicity() {
        let scheme = ScoringScheme::reach();
        let configs = vec![
            WeightConfig::default_for(&scheme),
            WeightConfig::from_pairs(&[
                ("impact", 2.0),
                ("reach", 1.5),
                ("effort", 1.0),
                ("urgency", 0.5),
                ("align", 1.0),
            ]),
        ];

        for weights in &configs {
            for f in &scheme.factors {
                let mut prev: Option<u8> = None;
                for v in f.min..=f.max {
                    let mut fac = scheme.default_factors();
                    fac.insert(f.key.to_string(), v);
                    let s = compute(&fac, &scheme, weights).score;
                    assert!(s <= 100);
                    if let Some(p) = prev {
                        if f.role == FactorRole::Divisor {
                            assert!(s <= p, "{} should be non-increasing", f.key);
                        } else {
                            assert!(s >= p, "{} should be non-decreasing", f.key);
                        }
                    }
                    prev = Some(s);
                }
            }
        }
    }

    #[test]
    fn test_reach_all_maxima_scores_100() {
        let scheme = ScoringScheme::reach();
        let weights = WeightConfig::from_pairs(&[
            ("impact", 1.0),
            ("reach", 1.0),
            ("effort", 1.0),
            ("urgency", 1.0),
            ("align", 1.0),
        ]);
        let f = factors(&[
            ("impact", 5),
            ("reach", 5),
            ("effort", 1),
            ("urgency", 4),
            ("align", 5),
        ]);
        assert_eq!(compute(&f, &scheme, &weights).score, 100);
    }

    #[test]
    fn test_reach_all_zero_max_effort_scores_zero() {
        let scheme = ScoringScheme::reach();
        let weights = WeightConfig::from_pairs(&[
            ("impact", 1.0),
            ("reach", 1.0),
            ("effort", 1.0),
            ("urgency", 1.0),
            ("align", 1.0),
        ]);
        let f = factors(&[
            ("impact", 0),
            ("reach", 0),
            ("effort", 8),
            ("urgency", 0),
            ("align", 0),
        ]);
        assert_eq!(compute(&f, &scheme, &weights).score, 0);
    }

    #[test]
    fn test_reach_zero_effort_weight_does_not_divide_by_zero() {
        let scheme = ScoringScheme::reach();
        let weights = WeightConfig::from_pairs(&[
            ("impact", 1.0),
            ("reach", 1.0),
            ("effort", 0.0),
            ("urgency", 1.0),
            ("align", 1.0),
        ]);
        let f = factors(&[
            ("impact", 5),
            ("reach", 5),
            ("effort", 1),
            ("urgency", 4),
            ("align", 5),
        ]);
        let s = compute(&f, &scheme, &weights).score;
        assert!(s <= 100);
    }

    #[test]
    fn test_scale_stable_under_uniform_weight_change() {
        // Doubling every weight must not move the score: the maximum-raw
        // denominator uses the same weights as the numerator.
        let scheme = ScoringScheme::reach();
        let w1 = WeightConfig::from_pairs(&[
            ("impact", 1.0),
            ("reach", 1.0),
            ("effort", 1.0),
            ("urgency", 1.0),
            ("align", 1.0),
        ]);
        let w2 = WeightConfig::from_pairs(&[
            ("impact", 2.0),
            ("reach", 2.0),
            ("effort", 2.0),
            ("urgency", 2.0),
            ("align", 2.0),
        ]);
        let f = factors(&[
            ("impact", 4),
            ("reach", 3),
            ("effort", 3),
            ("urgency", 2),
            ("align", 4),
        ]);
        // Not identical (the additive terms scale linearly while the product
        // scales quadratically), but both must stay in range and the
        // all-maxima point must stay pinned at 100 for any uniform weights.
        let max = factors(&[
            ("impact", 5),
            ("reach", 5),
            ("effort", 1),
            ("urgency", 4),
            ("align", 5),
        ]);
        assert_eq!(compute(&max, &scheme, &w1).score, 100);
        assert_eq!(compute(&max, &scheme, &w2).score, 100);
        assert!(compute(&f, &scheme, &w1).score <= 100);
        assert!(compute(&f, &scheme, &w2).score <= 100);
    }

    #[test]
    fn test_chart_metrics_weighted() {
        let scheme = ScoringScheme::weighted();
        let weights = WeightConfig::default_for(&scheme);
        let scored = compute(&scheme.default_factors(), &scheme, &weights);
        // (6 - (3 + 3)) + 3 = 3 ; (3 + 3) * 10 = 60
        assert_eq!(scored.effort, 3.0);
        assert_eq!(scored.value, 60.0);
    }

    #[test]
    fn test_chart_effort_is_divisor_value_for_reach() {
        let scheme = ScoringScheme::reach();
        let weights = WeightConfig::default_for(&scheme);
        let f = factors(&[("impact", 3), ("reach", 3), ("effort", 5), ("urgency", 2), ("align", 3)]);
        assert_eq!(compute(&f, &scheme, &weights).effort, 5.0);
    }

    #[test]
    fn test_color_endpoints_match_stops() {
        assert_eq!(score_color(0), "#10B981");
        assert_eq!(score_color(100), "#E02424");
    }

    #[test]
    fn test_color_is_continuous_not_banded() {
        // Within what used to be a single discrete band, nearby scores now
        // produce distinct interpolated colors.
        assert_ne!(score_color(40), score_color(60));
        assert_ne!(score_color(10), score_color(20));
        // Midpoint of the first segment is between green and yellow.
        let mid = score_color(17);
        assert_ne!(mid, "#10B981");
        assert_ne!(mid, "#FBBF24");
    }
}
