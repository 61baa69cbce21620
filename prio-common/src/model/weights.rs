//! Weight configurations and presets

use super::scheme::ScoringScheme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named mapping from factor key to weight
///
/// Weights may be zero; the scoring engine clamps denominator weights away
/// from zero itself, so no invariant is enforced here beyond non-negativity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightConfig(BTreeMap<String, f64>);

impl WeightConfig {
    /// Default weights for a scheme
    ///
    /// The weighted scheme keeps the original 25/15/15/10/10/15/10 split
    /// (sums to 100); the reach scheme weights every factor 1.
    pub fn default_for(scheme: &ScoringScheme) -> Self {
        match scheme.name {
            "weighted" => Self::from_pairs(&[
                ("impact", 25.0),
                ("ttv", 15.0),
                ("feasibility", 15.0),
                ("data", 10.0),
                ("risk", 10.0),
                ("align", 15.0),
                ("buyin", 10.0),
            ]),
            _ => Self(
                scheme
                    .factors
                    .iter()
                    .map(|f| (f.key.to_string(), 1.0))
                    .collect(),
            ),
        }
    }

    /// Named presets for the weighted scheme
    pub fn presets() -> Vec<(&'static str, WeightConfig)> {
        vec![
            (
                "Board Pitch",
                Self::from_pairs(&[
                    ("impact", 30.0),
                    ("ttv", 15.0),
                    ("feasibility", 10.0),
                    ("data", 5.0),
                    ("risk", 10.0),
                    ("align", 20.0),
                    ("buyin", 10.0),
                ]),
            ),
            (
                "Ops Quick Wins",
                Self::from_pairs(&[
                    ("impact", 20.0),
                    ("ttv", 25.0),
                    ("feasibility", 20.0),
                    ("data", 15.0),
                    ("risk", 10.0),
                    ("align", 5.0),
                    ("buyin", 5.0),
                ]),
            ),
            (
                "R&D Bets",
                Self::from_pairs(&[
                    ("impact", 25.0),
                    ("ttv", 5.0),
                    ("feasibility", 10.0),
                    ("data", 15.0),
                    ("risk", 10.0),
                    ("align", 20.0),
                    ("buyin", 15.0),
                ]),
            ),
        ]
    }

    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.max(0.0)))
                .collect(),
        )
    }

    /// Weight for a factor key; missing keys weigh zero
    pub fn get(&self, key: &str) -> f64 {
        self.0.get(key).copied().unwrap_or(0.0)
    }

    /// Set a weight, clamping negatives to zero
    pub fn set(&mut self, key: &str, weight: f64) {
        self.0.insert(key.to_string(), weight.max(0.0));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }
}
