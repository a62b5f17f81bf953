// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The seven-axis quality vector.

use serde::{Deserialize, Serialize};

/// Per-axis measurement in `[0, 1]`, or the all-`-1.0` sentinel vector when a
/// model produced no usable attempt at all. Field names match the current
/// wire names; the three renamed axes still accept their legacy names on
/// deserialize: "spec" → complexity, "refusal" → edgeCases, "recovery" →
/// debugging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisMetrics {
    pub correctness: f64,
    #[serde(alias = "spec")]
    pub complexity: f64,
    pub code_quality: f64,
    pub efficiency: f64,
    pub stability: f64,
    #[serde(alias = "refusal")]
    pub edge_cases: f64,
    #[serde(alias = "recovery")]
    pub debugging: f64,
}

impl AxisMetrics {
    pub const SENTINEL: AxisMetrics = AxisMetrics {
        correctness: -1.0,
        complexity: -1.0,
        code_quality: -1.0,
        efficiency: -1.0,
        stability: -1.0,
        edge_cases: -1.0,
        debugging: -1.0,
    };

    pub fn uniform(value: f64) -> AxisMetrics {
        AxisMetrics {
            correctness: value,
            complexity: value,
            code_quality: value,
            efficiency: value,
            stability: value,
            edge_cases: value,
            debugging: value,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    fn fields(&self) -> [f64; 7] {
        [
            self.correctness,
            self.complexity,
            self.code_quality,
            self.efficiency,
            self.stability,
            self.edge_cases,
            self.debugging,
        ]
    }

    fn from_fields(f: [f64; 7]) -> AxisMetrics {
        AxisMetrics {
            correctness: f[0],
            complexity: f[1],
            code_quality: f[2],
            efficiency: f[3],
            stability: f[4],
            edge_cases: f[5],
            debugging: f[6],
        }
    }

    /// Per-axis arithmetic mean across a set of samples, used for suite-level
    /// aggregation across tasks. Panics on an empty slice — the caller is
    /// expected to have already checked for that case, since an empty sample
    /// set means "all tasks failed" territory, not a mean.
    pub fn mean(samples: &[AxisMetrics]) -> AxisMetrics {
        let mut sums = [0.0_f64; 7];
        for s in samples {
            for (acc, v) in sums.iter_mut().zip(s.fields()) {
                *acc += v;
            }
        }
        let n = samples.len() as f64;
        for v in sums.iter_mut() {
            *v /= n;
        }
        Self::from_fields(sums)
    }

    /// Per-axis sample standard deviation (population, not Bessel-corrected —
    /// we're summarizing a fixed batch of attempts, not inferring about a
    /// wider population).
    pub fn stddev(samples: &[AxisMetrics], mean: &AxisMetrics) -> AxisMetrics {
        let mean_fields = mean.fields();
        let mut sums = [0.0_f64; 7];
        for s in samples {
            for (acc, (v, m)) in sums.iter_mut().zip(s.fields().into_iter().zip(mean_fields)) {
                *acc += (v - m).powi(2);
            }
        }
        let n = samples.len() as f64;
        for v in sums.iter_mut() {
            *v = (*v / n).sqrt();
        }
        Self::from_fields(sums)
    }

    /// Per-axis median across a set of trial outcomes for one task: collapses
    /// the trials for a task to its median axis vector.
    pub fn median(samples: &[AxisMetrics]) -> AxisMetrics {
        let mut per_axis: [Vec<f64>; 7] = Default::default();
        for s in samples {
            for (slot, v) in per_axis.iter_mut().zip(s.fields()) {
                slot.push(v);
            }
        }
        let mut out = [0.0_f64; 7];
        for (slot, values) in out.iter_mut().zip(per_axis.iter_mut()) {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let n = values.len();
            *slot = if n % 2 == 1 {
                values[n / 2]
            } else {
                (values[n / 2 - 1] + values[n / 2]) / 2.0
            };
        }
        Self::from_fields(out)
    }

    pub fn floor(&mut self, min: f64) {
        for v in [
            &mut self.correctness,
            &mut self.complexity,
            &mut self.code_quality,
            &mut self.efficiency,
            &mut self.stability,
            &mut self.edge_cases,
            &mut self.debugging,
        ] {
            if *v < min {
                *v = min;
            }
        }
    }
}

/// Relative importance of each axis in the harsh-scoring weighted sum.
/// Must sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct AxisWeights {
    pub correctness: f64,
    pub complexity: f64,
    pub code_quality: f64,
    pub efficiency: f64,
    pub stability: f64,
    pub edge_cases: f64,
    pub debugging: f64,
}

pub const DEFAULT_WEIGHTS: AxisWeights = AxisWeights {
    correctness: 0.35,
    complexity: 0.20,
    code_quality: 0.15,
    efficiency: 0.10,
    stability: 0.10,
    edge_cases: 0.05,
    debugging: 0.05,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let w = DEFAULT_WEIGHTS;
        let sum = w.correctness + w.complexity + w.code_quality + w.efficiency + w.stability + w.edge_cases + w.debugging;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sentinel_roundtrips_through_is_sentinel() {
        assert!(AxisMetrics::SENTINEL.is_sentinel());
        assert!(!AxisMetrics::uniform(0.5).is_sentinel());
    }

    #[test]
    fn legacy_axis_names_deserialize_into_current_fields() {
        let json = serde_json::json!({
            "correctness": 0.9,
            "spec": 0.5,
            "codeQuality": 0.6,
            "efficiency": 0.7,
            "stability": 0.8,
            "refusal": 0.4,
            "recovery": 0.3
        });
        let axes: AxisMetrics = serde_json::from_value(json).unwrap();
        assert_eq!(axes.complexity, 0.5);
        assert_eq!(axes.edge_cases, 0.4);
        assert_eq!(axes.debugging, 0.3);
    }

    #[test]
    fn median_of_three_picks_middle_value() {
        let samples = vec![
            AxisMetrics::uniform(0.2),
            AxisMetrics::uniform(0.8),
            AxisMetrics::uniform(0.5),
        ];
        let m = AxisMetrics::median(&samples);
        assert_eq!(m.correctness, 0.5);
    }

    #[test]
    fn mean_of_uniform_samples_is_the_shared_value() {
        let samples = vec![AxisMetrics::uniform(0.4), AxisMetrics::uniform(0.6)];
        let m = AxisMetrics::mean(&samples);
        assert!((m.correctness - 0.5).abs() < 1e-9);
    }

    #[test]
    fn floor_clamps_low_values_up() {
        let mut axes = AxisMetrics::uniform(0.0);
        axes.floor(1e-6);
        assert_eq!(axes.correctness, 1e-6);
    }
}
