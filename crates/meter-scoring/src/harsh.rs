// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The harsh scoring curve: a weighted axis sum run through a sub-linear
//! "professor curve", a bounded baseline-variance nudge, a calibration
//! penalty, cumulative quality gates, and excellence caps, clamped to
//! `[0, 100]` only at the very end. Clamping mid-pipeline would let an early
//! floor mask a later gate's intent.

use crate::axis::{AxisMetrics, DEFAULT_WEIGHTS};
use crate::baseline::Baseline;

/// Penalize any axis below perfection super-linearly (`v^1.8`); an axis at
/// or above 1.0 (stability can exceed it before the suite-level cap) passes
/// through unchanged.
fn penalize(v: f64) -> f64 {
    if v < 1.0 {
        v.max(0.0).powf(1.8)
    } else {
        v
    }
}

fn variance_term(axes: &AxisMetrics, baseline: &Baseline) -> f64 {
    let w = DEFAULT_WEIGHTS;
    let pairs = [
        (axes.correctness, baseline.mean.correctness, baseline.sigma.correctness, w.correctness),
        (axes.complexity, baseline.mean.complexity, baseline.sigma.complexity, w.complexity),
        (axes.code_quality, baseline.mean.code_quality, baseline.sigma.code_quality, w.code_quality),
        (axes.efficiency, baseline.mean.efficiency, baseline.sigma.efficiency, w.efficiency),
        (axes.stability, baseline.mean.stability, baseline.sigma.stability, w.stability),
        (axes.edge_cases, baseline.mean.edge_cases, baseline.sigma.edge_cases, w.edge_cases),
        (axes.debugging, baseline.mean.debugging, baseline.sigma.debugging, w.debugging),
    ];
    pairs.iter().map(|(v, mean, sigma, weight)| weight * (v - mean) / sigma * 2.0).sum()
}

/// Score one attempt's axis vector against its model+suite baseline,
/// returning a value in `[0, 100]`.
pub fn harsh_score(axes: &AxisMetrics, baseline: &Baseline) -> f64 {
    let w = DEFAULT_WEIGHTS;

    let mut correctness = penalize(axes.correctness);
    let complexity = penalize(axes.complexity);
    let mut code_quality = penalize(axes.code_quality);
    let efficiency = penalize(axes.efficiency);
    let stability = penalize(axes.stability);
    let edge_cases = penalize(axes.edge_cases);
    let debugging = penalize(axes.debugging);

    if axes.correctness < 0.95 {
        correctness *= 0.7;
    }
    if axes.code_quality < 0.8 {
        code_quality *= 0.6;
    }

    let base = (correctness * w.correctness
        + complexity * w.complexity
        + code_quality * w.code_quality
        + efficiency * w.efficiency
        + stability * w.stability
        + edge_cases * w.edge_cases
        + debugging * w.debugging)
        * 100.0;

    let mut score = (base / 100.0).max(0.0).powf(1.4) * 100.0;

    score += variance_term(axes, baseline).clamp(-8.0, 3.0);

    if !baseline.has_baseline {
        score -= 8.0;
    }

    // Quality gates: each breached threshold stacks — this is the "harsh"
    // half of harsh scoring, not an either/or ladder.
    let mut gate_penalty = 0.0;
    if axes.correctness < 0.9 {
        gate_penalty += 15.0;
    }
    if axes.correctness < 0.7 {
        gate_penalty += 20.0;
    }
    if axes.correctness < 0.5 {
        gate_penalty += 30.0;
    }
    if axes.code_quality < 0.6 {
        gate_penalty += 10.0;
    }
    if axes.code_quality < 0.4 {
        gate_penalty += 20.0;
    }
    if axes.complexity < 0.3 {
        gate_penalty += 12.0;
    }
    score -= gate_penalty;

    // Excellence caps: a high score requires near-uniform excellence across
    // every axis, not just a strong weighted average.
    let all = [axes.correctness, axes.complexity, axes.code_quality, axes.efficiency, axes.stability, axes.edge_cases, axes.debugging];
    if score >= 95.0 && !all.iter().all(|v| *v >= 0.98) {
        score = score.min(89.0);
    }
    if score >= 90.0 && !all.iter().all(|v| *v >= 0.92) {
        score = score.min(87.0);
    }
    if score >= 85.0 && !(axes.correctness >= 0.95 && axes.code_quality >= 0.8 && axes.complexity >= 0.7) {
        score = score.min(82.0);
    }

    score.clamp(0.0, 100.0).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline_matching(axes: &AxisMetrics) -> Baseline {
        Baseline { mean: *axes, sigma: AxisMetrics::uniform(0.15), has_baseline: true, sample_count: 50 }
    }

    fn no_baseline() -> Baseline {
        Baseline { mean: AxisMetrics::uniform(0.5), sigma: AxisMetrics::uniform(0.15), has_baseline: false, sample_count: 3 }
    }

    #[test]
    fn perfect_axes_with_matching_baseline_score_near_100() {
        let axes = AxisMetrics::uniform(1.0);
        let score = harsh_score(&axes, &baseline_matching(&axes));
        assert!(score >= 95.0, "expected near-perfect score, got {score}");
    }

    #[test]
    fn low_correctness_cannot_reach_excellence_regardless_of_other_axes() {
        let mut axes = AxisMetrics::uniform(1.0);
        axes.correctness = 0.49;
        let score = harsh_score(&axes, &baseline_matching(&axes));
        assert!(score < 85.0, "correctness < 0.5 must forbid an excellence-tier score, got {score}");
    }

    #[test]
    fn no_baseline_scores_strictly_less_than_an_otherwise_identical_run_with_one() {
        let axes = AxisMetrics::uniform(0.8);
        let with = harsh_score(&axes, &baseline_matching(&axes));
        let without = harsh_score(&axes, &no_baseline());
        assert!(without < with, "without={without} with={with}");
    }

    #[test]
    fn score_is_monotonic_in_correctness_holding_other_axes_fixed() {
        let baseline = no_baseline();
        let mut prev = -1.0;
        for c in [0.1, 0.3, 0.5, 0.7, 0.9, 0.95, 1.0] {
            let mut axes = AxisMetrics::uniform(0.8);
            axes.correctness = c;
            let score = harsh_score(&axes, &baseline);
            assert!(score >= prev, "score decreased from {prev} to {score} as correctness rose to {c}");
            prev = score;
        }
    }

    #[test]
    fn score_is_always_clamped_to_valid_range() {
        let axes = AxisMetrics::uniform(0.0);
        let score = harsh_score(&axes, &no_baseline());
        assert!((0.0..=100.0).contains(&score));
    }
}
