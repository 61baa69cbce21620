//! Scoring scheme definitions
//!
//! A scheme names the factor set a deployment scores against. Two built-in
//! schemes are provided:
//! - `weighted`: seven additive factors (risk reversed) plus a chart-only
//!   cost column, all on a 0-5 scale.
//! - `reach`: a ratio scheme where weighted impact and reach multiply,
//!   urgency and alignment add, and weighted effort divides. Effort uses the
//!   non-linear {1,2,3,5,8} scale.

use std::collections::BTreeMap;

/// How a factor participates in the rank score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorRole {
    /// Contributes `weight x normalized` to the additive sum
    Additive,
    /// Additive with reversed polarity (lower raw value is better)
    Reversed,
    /// Multiplied together with the other multiplier factors (weighted)
    Multiplier,
    /// Weighted denominator; weight and value are clamped away from zero
    Divisor,
    /// Chart coordinate only; never part of the rank score
    ChartOnly,
}

/// One scored input dimension
#[derive(Debug, Clone)]
pub struct FactorSpec {
    /// Stable key used in factor maps, weight configs, and the metadata codec
    pub key: &'static str,
    /// Display label
    pub label: &'static str,
    /// Tooltip help text
    pub help: &'static str,
    /// Smallest allowed value
    pub min: u8,
    /// Largest allowed value
    pub max: u8,
    /// Value assigned to new and decode-fallback records
    pub default: u8,
    /// Role in the rank score
    pub role: FactorRole,
    /// Allowed values for non-linear scales; None means every integer in
    /// [min, max] is valid
    pub steps: Option<&'static [u8]>,
}

impl FactorSpec {
    /// Clamp a raw value into this factor's valid range, snapping to the
    /// nearest allowed step for non-linear scales.
    pub fn clamp(&self, value: u8) -> u8 {
        let v = value.clamp(self.min, self.max);
        match self.steps {
            None => v,
            Some(steps) => *steps
                .iter()
                .min_by_key(|s| s.abs_diff(v))
                .unwrap_or(&self.default),
        }
    }
}

/// Named factor set with per-factor ranges, defaults, and score roles
#[derive(Debug, Clone)]
pub struct ScoringScheme {
    /// Scheme name ("weighted" or "reach")
    pub name: &'static str,
    /// Factors in display / codec order
    pub factors: Vec<FactorSpec>,
}

impl ScoringScheme {
    /// Seven-factor additive scheme (risk reversed, cost chart-only)
    pub fn weighted() -> Self {
        Self {
            name: "weighted",
            factors: vec![
                FactorSpec {
                    key: "impact",
                    label: "Impact",
                    help: "Business value if delivered. Consider revenue, cost savings, NPS, risk reduction. (0-5 higher is better)",
                    min: 0,
                    max: 5,
                    default: 3,
                    role: FactorRole::Additive,
                    steps: None,
                },
                FactorSpec {
                    key: "ttv",
                    label: "TTV",
                    help: "Time-to-Value: how quickly value is realized after starting. (0-5 higher = faster)",
                    min: 0,
                    max: 5,
                    default: 3,
                    role: FactorRole::Additive,
                    steps: None,
                },
                FactorSpec {
                    key: "feasibility",
                    label: "Feasibility",
                    help: "Likelihood of successful delivery with current tech, skills, and constraints. (0-5 higher = easier)",
                    min: 0,
                    max: 5,
                    default: 3,
                    role: FactorRole::Additive,
                    steps: None,
                },
                FactorSpec {
                    key: "data",
                    label: "Data",
                    help: "Data readiness/quality and access. (0-5 higher = better/cleaner/accessible)",
                    min: 0,
                    max: 5,
                    default: 3,
                    role: FactorRole::Additive,
                    steps: None,
                },
                FactorSpec {
                    key: "risk",
                    label: "Risk",
                    help: "Regulatory, compliance, security, or brand risk. (0-5 higher = riskier; reversed in score)",
                    min: 0,
                    max: 5,
                    default: 3,
                    role: FactorRole::Reversed,
                    steps: None,
                },
                FactorSpec {
                    key: "align",
                    label: "Alignment",
                    help: "Strategic alignment with goals and roadmap. (0-5 higher = more aligned)",
                    min: 0,
                    max: 5,
                    default: 3,
                    role: FactorRole::Additive,
                    steps: None,
                },
                FactorSpec {
                    key: "buyin",
                    label: "Buy-in",
                    help: "Stakeholder enthusiasm and sponsorship. (0-5 higher = stronger support)",
                    min: 0,
                    max: 5,
                    default: 3,
                    role: FactorRole::Additive,
                    steps: None,
                },
                FactorSpec {
                    key: "cost",
                    label: "Cost",
                    help: "Relative delivery cost. Chart coordinate only, not scored. (0-5 higher = costlier)",
                    min: 0,
                    max: 5,
                    default: 3,
                    role: FactorRole::ChartOnly,
                    steps: None,
                },
            ],
        }
    }

    /// Ratio scheme: (weighted impact x weighted reach + urgency + alignment)
    /// over weighted effort
    pub fn reach() -> Self {
        Self {
            name: "reach",
            factors: vec![
                FactorSpec {
                    key: "impact",
                    label: "Impact",
                    help: "Business value per reached case if delivered. (0-5 higher is better)",
                    min: 0,
                    max: 5,
                    default: 3,
                    role: FactorRole::Multiplier,
                    steps: None,
                },
                FactorSpec {
                    key: "reach",
                    label: "Reach",
                    help: "How many users or cases are touched per cycle. (0-5 higher = broader)",
                    min: 0,
                    max: 5,
                    default: 3,
                    role: FactorRole::Multiplier,
                    steps: None,
                },
                FactorSpec {
                    key: "urgency",
                    label: "Urgency",
                    help: "Cost of waiting a quarter. (0-4 higher = more urgent)",
                    min: 0,
                    max: 4,
                    default: 2,
                    role: FactorRole::Additive,
                    steps: None,
                },
                FactorSpec {
                    key: "align",
                    label: "Alignment",
                    help: "Strategic alignment with goals and roadmap. (0-5 higher = more aligned)",
                    min: 0,
                    max: 5,
                    default: 3,
                    role: FactorRole::Additive,
                    steps: None,
                },
                FactorSpec {
                    key: "effort",
                    label: "Effort",
                    help: "Delivery effort on the 1/2/3/5/8 scale. Divides the score; lower is better.",
                    min: 1,
                    max: 8,
                    default: 3,
                    role: FactorRole::Divisor,
                    steps: Some(&[1, 2, 3, 5, 8]),
                },
            ],
        }
    }

    /// Look up a factor by key
    pub fn factor(&self, key: &str) -> Option<&FactorSpec> {
        self.factors.iter().find(|f| f.key == key)
    }

    /// Factor map with every factor at its scheme default
    pub fn default_factors(&self) -> BTreeMap<String, u8> {
        self.factors
            .iter()
            .map(|f| (f.key.to_string(), f.default))
            .collect()
    }

    /// Clamp an arbitrary factor map into scheme ranges, dropping unknown
    /// keys and filling missing factors with defaults.
    pub fn sanitize(&self, factors: &BTreeMap<String, u8>) -> BTreeMap<String, u8> {
        self.factors
            .iter()
            .map(|f| {
                let v = factors.get(f.key).map(|v| f.clamp(*v)).unwrap_or(f.default);
                (f.key.to_string(), v)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_scheme_factor_count() {
        let scheme = ScoringScheme::weighted();
        assert_eq!(scheme.factors.len(), 8);
        assert_eq!(scheme.factor("risk").unwrap().role, FactorRole::Reversed);
        assert_eq!(scheme.factor("cost").unwrap().role, FactorRole::ChartOnly);
    }

    #[test]
    fn test_effort_snaps_to_step_scale() {
        let scheme = ScoringScheme::reach();
        let effort = scheme.factor("effort").unwrap();
        assert_eq!(effort.clamp(4), 3); // ties resolve to the lower step
        assert_eq!(effort.clamp(7), 8);
        assert_eq!(effort.clamp(0), 1);
        assert_eq!(effort.clamp(200), 8);
    }

    #[test]
    fn test_sanitize_drops_unknown_and_fills_defaults() {
        let scheme = ScoringScheme::reach();
        let mut raw = BTreeMap::new();
        raw.insert("impact".to_string(), 9);
        raw.insert("bogus".to_string(), 1);
        let clean = scheme.sanitize(&raw);
        assert_eq!(clean.get("impact"), Some(&5));
        assert_eq!(clean.get("urgency"), Some(&2));
        assert!(!clean.contains_key("bogus"));
    }
}
