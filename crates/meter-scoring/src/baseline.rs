// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Per-(model, suite) historical baseline used to calibrate the harsh
//! scoring curve. Computed from up to the most recent non-sentinel scores;
//! `StoreConfig.baseline_window`/`baseline_min_samples` in `meter-config`
//! carry the actual numbers at call sites.

use crate::axis::AxisMetrics;

const SIGMA_FLOOR: f64 = 1e-6;
const DEFAULT_MEAN: f64 = 0.5;
const DEFAULT_SIGMA: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mean: AxisMetrics,
    pub sigma: AxisMetrics,
    pub has_baseline: bool,
    /// How many historical samples went into this baseline — carried
    /// through so callers can render "Calibrating (n/m samples)".
    pub sample_count: usize,
}

/// `history` must already be filtered to the relevant (model, suite) pair's
/// recent non-sentinel axis vectors, newest-first or any order (order
/// doesn't matter for mean/sigma).
pub fn compute_baseline(history: &[AxisMetrics], min_samples: usize) -> Baseline {
    if history.len() < min_samples {
        return Baseline {
            mean: AxisMetrics::uniform(DEFAULT_MEAN),
            sigma: AxisMetrics::uniform(DEFAULT_SIGMA),
            has_baseline: false,
            sample_count: history.len(),
        };
    }
    let mean = AxisMetrics::mean(history);
    let mut sigma = AxisMetrics::stddev(history, &mean);
    sigma.floor(SIGMA_FLOOR);
    Baseline { mean, sigma, has_baseline: true, sample_count: history.len() }
}
